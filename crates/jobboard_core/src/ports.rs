//! crates/jobboard_core/src/ports.rs
//!
//! Defines the persistence contract (traits) for the job board schema.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the concrete relational store behind it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    Application, ApplicationPatch, Company, CompanyPatch, InvalidEnumValue, Job, JobPatch,
    Location, LocationPatch, NewApplication, NewCompany, NewJob, NewLocation, NewRefreshToken,
    NewUser, RefreshToken, User, UserPatch,
};

//=========================================================================================
// Error Taxonomy
//=========================================================================================

/// The failure modes a write against the schema can surface.
///
/// Each store-native violation maps to its own variant so callers can tell
/// them apart; nothing is retried or coerced at this layer.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },
    #[error("foreign key constraint violated: {constraint}")]
    ForeignKeyViolation { constraint: String },
    #[error("not-null constraint violated on column {column}")]
    NotNullViolation { column: String },
    #[error("enum domain violated: {0}")]
    InvalidEnumValue(#[from] InvalidEnumValue),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("an unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, SchemaError>`.
pub type SchemaResult<T> = Result<T, SchemaError>;

//=========================================================================================
// Clock Capability
//=========================================================================================

/// Source of the current time for timestamp bookkeeping.
///
/// The adapter binds timestamps explicitly on insert/update instead of
/// relying on database defaults, so tests can substitute a fixed clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

//=========================================================================================
// Store Port (Trait)
//=========================================================================================

/// Typed create/read/update/delete access to the six job-board entities,
/// plus the queries that make each one-to-many relationship navigable from
/// its "many" side. Owning-side navigation is identifier-based: entities
/// carry their foreign-key ids and callers resolve them with `get_*`.
#[async_trait]
pub trait JobBoardStore: Send + Sync {
    // --- Users ---
    async fn create_user(&self, new: NewUser) -> SchemaResult<User>;

    async fn get_user(&self, id: Uuid) -> SchemaResult<User>;

    async fn get_user_by_email(&self, email: &str) -> SchemaResult<User>;

    async fn update_user(&self, id: Uuid, patch: UserPatch) -> SchemaResult<User>;

    async fn delete_user(&self, id: Uuid) -> SchemaResult<()>;

    // --- Refresh Tokens ---
    async fn create_refresh_token(&self, new: NewRefreshToken) -> SchemaResult<RefreshToken>;

    async fn get_refresh_token_by_token(&self, token: &str) -> SchemaResult<RefreshToken>;

    async fn refresh_tokens_for_user(&self, user_id: Uuid) -> SchemaResult<Vec<RefreshToken>>;

    /// Marks a token inactive. Expiry-based invalidation stays with the
    /// caller; this layer only persists the flag.
    async fn deactivate_refresh_token(&self, id: Uuid) -> SchemaResult<RefreshToken>;

    async fn delete_refresh_token(&self, id: Uuid) -> SchemaResult<()>;

    // --- Companies ---
    async fn create_company(&self, new: NewCompany) -> SchemaResult<Company>;

    async fn get_company(&self, id: Uuid) -> SchemaResult<Company>;

    async fn get_company_by_subdomain(&self, subdomain: &str) -> SchemaResult<Company>;

    async fn update_company(&self, id: Uuid, patch: CompanyPatch) -> SchemaResult<Company>;

    async fn delete_company(&self, id: Uuid) -> SchemaResult<()>;

    async fn companies_owned_by(&self, owner_id: Uuid) -> SchemaResult<Vec<Company>>;

    // --- Locations ---
    async fn create_location(&self, new: NewLocation) -> SchemaResult<Location>;

    async fn get_location(&self, id: Uuid) -> SchemaResult<Location>;

    async fn update_location(&self, id: Uuid, patch: LocationPatch) -> SchemaResult<Location>;

    async fn delete_location(&self, id: Uuid) -> SchemaResult<()>;

    // --- Jobs ---
    async fn create_job(&self, new: NewJob) -> SchemaResult<Job>;

    async fn get_job(&self, id: Uuid) -> SchemaResult<Job>;

    async fn update_job(&self, id: Uuid, patch: JobPatch) -> SchemaResult<Job>;

    async fn delete_job(&self, id: Uuid) -> SchemaResult<()>;

    async fn jobs_for_company(&self, company_id: Uuid) -> SchemaResult<Vec<Job>>;

    async fn jobs_for_location(&self, location_id: Uuid) -> SchemaResult<Vec<Job>>;

    // --- Applications ---
    async fn create_application(&self, new: NewApplication) -> SchemaResult<Application>;

    async fn get_application(&self, id: Uuid) -> SchemaResult<Application>;

    async fn update_application(
        &self,
        id: Uuid,
        patch: ApplicationPatch,
    ) -> SchemaResult<Application>;

    async fn delete_application(&self, id: Uuid) -> SchemaResult<()>;

    async fn applications_for_user(&self, user_id: Uuid) -> SchemaResult<Vec<Application>>;

    async fn applications_for_job(&self, job_id: Uuid) -> SchemaResult<Vec<Application>>;
}
