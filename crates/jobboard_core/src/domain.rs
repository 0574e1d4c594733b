//! crates/jobboard_core/src/domain.rs
//!
//! Defines the pure, core data structures for the job board schema.
//! These structs are independent of any database or serialization format
//! beyond plain serde derives.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error produced when parsing a closed-set field from its wire form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid value '{value}' for {expected}")]
pub struct InvalidEnumValue {
    pub value: String,
    pub expected: &'static str,
}

/// The role a user holds on the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Recruiter,
    Candidate,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Recruiter => "recruiter",
            UserRole::Candidate => "candidate",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = InvalidEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "recruiter" => Ok(UserRole::Recruiter),
            "candidate" => Ok(UserRole::Candidate),
            other => Err(InvalidEnumValue {
                value: other.to_string(),
                expected: "user role (admin, recruiter, candidate)",
            }),
        }
    }
}

/// Whether a job posting is accepting applications.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Open,
    Closed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Open => "open",
            JobStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = InvalidEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(JobStatus::Open),
            "closed" => Ok(JobStatus::Closed),
            other => Err(InvalidEnumValue {
                value: other.to_string(),
                expected: "job status (open, closed)",
            }),
        }
    }
}

/// Where an application sits in the hiring pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    Applied,
    Shortlisted,
    Rejected,
    Hired,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "applied",
            ApplicationStatus::Shortlisted => "shortlisted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Hired => "hired",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = InvalidEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "applied" => Ok(ApplicationStatus::Applied),
            "shortlisted" => Ok(ApplicationStatus::Shortlisted),
            "rejected" => Ok(ApplicationStatus::Rejected),
            "hired" => Ok(ApplicationStatus::Hired),
            other => Err(InvalidEnumValue {
                value: other.to_string(),
                expected: "application status (applied, shortlisted, rejected, hired)",
            }),
        }
    }
}

// Represents a registered account - referenced throughout the schema as
// the owner of tokens, companies, jobs and applications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A long-lived credential issued at login, invalidated by flipping
/// `is_active` or by aging past `expires_at`. Lifecycle enforcement is the
/// caller's responsibility; the schema only stores the flag and the expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub subdomain: String,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Locations carry no timestamps and no uniqueness constraint; duplicate
// rows are permitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: Uuid,
    pub city: String,
    pub state: Option<String>,
    pub country: Option<String>,
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub company_id: Uuid,
    pub location_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub status: JobStatus,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One user's application to one job. A user may apply to the same job
/// more than once; the schema does not forbid it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub id: Uuid,
    pub user_id: Uuid,
    pub job_id: Uuid,
    pub status: ApplicationStatus,
    pub cover_letter: Option<String>,
    pub resume_url: Option<String>,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//=========================================================================================
// Creation Payloads
//=========================================================================================
// Identifiers and timestamps are supplied by the persistence layer, so
// creation payloads carry only caller-provided fields.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub role: Option<UserRole>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRefreshToken {
    pub user_id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCompany {
    pub name: String,
    pub description: Option<String>,
    pub subdomain: String,
    pub owner_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLocation {
    pub city: String,
    pub state: Option<String>,
    pub country: Option<String>,
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewJob {
    pub company_id: Uuid,
    pub location_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub status: JobStatus,
    pub created_by: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewApplication {
    pub user_id: Uuid,
    pub job_id: Uuid,
    pub status: ApplicationStatus,
    pub cover_letter: Option<String>,
    pub resume_url: Option<String>,
}

//=========================================================================================
// Update Patches
//=========================================================================================
// `None` leaves the column untouched. Any persisted patch refreshes the
// row's update timestamp.

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPatch {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub full_name: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.password_hash.is_none()
            && self.full_name.is_none()
            && self.role.is_none()
            && self.is_active.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub subdomain: Option<String>,
    pub owner_id: Option<Uuid>,
}

impl CompanyPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.subdomain.is_none()
            && self.owner_id.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationPatch {
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub timezone: Option<String>,
}

impl LocationPatch {
    pub fn is_empty(&self) -> bool {
        self.city.is_none()
            && self.state.is_none()
            && self.country.is_none()
            && self.timezone.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub status: Option<JobStatus>,
    pub location_id: Option<Uuid>,
}

impl JobPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.salary_min.is_none()
            && self.salary_max.is_none()
            && self.status.is_none()
            && self.location_id.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicationPatch {
    pub status: Option<ApplicationStatus>,
    pub cover_letter: Option<String>,
    pub resume_url: Option<String>,
}

impl ApplicationPatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.cover_letter.is_none() && self.resume_url.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_role_parses_closed_set_only() {
        assert_eq!("admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!(
            "recruiter".parse::<UserRole>().unwrap(),
            UserRole::Recruiter
        );
        assert_eq!(
            "candidate".parse::<UserRole>().unwrap(),
            UserRole::Candidate
        );

        let err = "superuser".parse::<UserRole>().unwrap_err();
        assert_eq!(err.value, "superuser");
    }

    #[test]
    fn job_status_rejects_unknown_values() {
        assert_eq!("open".parse::<JobStatus>().unwrap(), JobStatus::Open);
        assert_eq!("closed".parse::<JobStatus>().unwrap(), JobStatus::Closed);
        assert!("draft".parse::<JobStatus>().is_err());
        // Values are case sensitive, matching the persisted enum labels.
        assert!("Open".parse::<JobStatus>().is_err());
    }

    #[test]
    fn application_status_rejects_unknown_values() {
        assert_eq!(
            "shortlisted".parse::<ApplicationStatus>().unwrap(),
            ApplicationStatus::Shortlisted
        );
        assert!("pending".parse::<ApplicationStatus>().is_err());
    }

    #[test]
    fn status_defaults_match_schema_defaults() {
        assert_eq!(JobStatus::default(), JobStatus::Open);
        assert_eq!(ApplicationStatus::default(), ApplicationStatus::Applied);
    }

    #[test]
    fn display_is_the_wire_form() {
        assert_eq!(UserRole::Recruiter.to_string(), "recruiter");
        assert_eq!(JobStatus::Closed.to_string(), "closed");
        assert_eq!(ApplicationStatus::Hired.to_string(), "hired");
    }

    #[test]
    fn default_patches_are_empty() {
        assert!(UserPatch::default().is_empty());
        assert!(CompanyPatch::default().is_empty());
        assert!(LocationPatch::default().is_empty());
        assert!(JobPatch::default().is_empty());
        assert!(ApplicationPatch::default().is_empty());

        let patch = JobPatch {
            status: Some(JobStatus::Closed),
            ..JobPatch::default()
        };
        assert!(!patch.is_empty());
    }
}
