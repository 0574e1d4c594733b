//! services/store/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `JobBoardStore` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.
//!
//! Identifiers are generated here with `Uuid::new_v4()` and timestamps come
//! from the injected `Clock`; the schema has no database-side defaults for
//! either. Every create/update runs inside a transaction, so a constraint
//! violation rolls the whole operation back.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jobboard_core::domain::{
    Application, ApplicationPatch, ApplicationStatus, Company, CompanyPatch, InvalidEnumValue,
    Job, JobPatch, JobStatus, Location, LocationPatch, NewApplication, NewCompany, NewJob,
    NewLocation, NewRefreshToken, NewUser, RefreshToken, User, UserPatch, UserRole,
};
use jobboard_core::ports::{Clock, JobBoardStore, SchemaError, SchemaResult};
use sqlx::postgres::PgDatabaseError;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `JobBoardStore` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
    clock: Arc<dyn Clock>,
}

impl DbAdapter {
    /// Creates a new `DbAdapter` over a connection pool and a clock.
    pub fn new(pool: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

/// Translates store-native failures into the schema error taxonomy.
///
/// Postgres SQLSTATE classes: 23505 unique, 23503 foreign key, 23502
/// not-null, 22P02/23514 invalid input for a constrained domain.
fn map_db_err(err: sqlx::Error) -> SchemaError {
    match err {
        sqlx::Error::RowNotFound => SchemaError::NotFound("row not found".to_string()),
        sqlx::Error::Database(db) => {
            let constraint = db.constraint().unwrap_or("unknown").to_string();
            match db.code().as_deref() {
                Some("23505") => SchemaError::UniqueViolation { constraint },
                Some("23503") => SchemaError::ForeignKeyViolation { constraint },
                Some("23502") => {
                    let column = db
                        .try_downcast_ref::<PgDatabaseError>()
                        .and_then(|pg| pg.column())
                        .unwrap_or("unknown")
                        .to_string();
                    SchemaError::NotNullViolation { column }
                }
                Some("22P02") | Some("23514") => {
                    SchemaError::InvalidEnumValue(InvalidEnumValue {
                        value: db.message().to_string(),
                        expected: "a value from the column's enum domain",
                    })
                }
                _ => SchemaError::Unexpected(db.to_string()),
            }
        }
        other => SchemaError::Unexpected(other.to_string()),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================
// Enum columns are selected as `::text` and parsed here, so the core crate
// stays free of database types.

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    email: String,
    password_hash: String,
    full_name: Option<String>,
    role: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> SchemaResult<User> {
        let role = self
            .role
            .as_deref()
            .map(UserRole::from_str)
            .transpose()?;
        Ok(User {
            id: self.id,
            email: self.email,
            password_hash: self.password_hash,
            full_name: self.full_name,
            role,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct RefreshTokenRecord {
    id: Uuid,
    user_id: Uuid,
    token: String,
    expires_at: DateTime<Utc>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl RefreshTokenRecord {
    fn to_domain(self) -> RefreshToken {
        RefreshToken {
            id: self.id,
            user_id: self.user_id,
            token: self.token,
            expires_at: self.expires_at,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct CompanyRecord {
    id: Uuid,
    name: String,
    description: Option<String>,
    subdomain: String,
    owner_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl CompanyRecord {
    fn to_domain(self) -> Company {
        Company {
            id: self.id,
            name: self.name,
            description: self.description,
            subdomain: self.subdomain,
            owner_id: self.owner_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct LocationRecord {
    id: Uuid,
    city: String,
    state: Option<String>,
    country: Option<String>,
    timezone: Option<String>,
}
impl LocationRecord {
    fn to_domain(self) -> Location {
        Location {
            id: self.id,
            city: self.city,
            state: self.state,
            country: self.country,
            timezone: self.timezone,
        }
    }
}

#[derive(FromRow)]
struct JobRecord {
    id: Uuid,
    company_id: Uuid,
    location_id: Option<Uuid>,
    title: String,
    description: Option<String>,
    salary_min: Option<i32>,
    salary_max: Option<i32>,
    status: String,
    created_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl JobRecord {
    fn to_domain(self) -> SchemaResult<Job> {
        let status = JobStatus::from_str(&self.status)?;
        Ok(Job {
            id: self.id,
            company_id: self.company_id,
            location_id: self.location_id,
            title: self.title,
            description: self.description,
            salary_min: self.salary_min,
            salary_max: self.salary_max,
            status,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct ApplicationRecord {
    id: Uuid,
    user_id: Uuid,
    job_id: Uuid,
    status: String,
    cover_letter: Option<String>,
    resume_url: Option<String>,
    applied_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl ApplicationRecord {
    fn to_domain(self) -> SchemaResult<Application> {
        let status = ApplicationStatus::from_str(&self.status)?;
        Ok(Application {
            id: self.id,
            user_id: self.user_id,
            job_id: self.job_id,
            status,
            cover_letter: self.cover_letter,
            resume_url: self.resume_url,
            applied_at: self.applied_at,
            updated_at: self.updated_at,
        })
    }
}

//=========================================================================================
// Column Lists
//=========================================================================================

const USER_COLUMNS: &str =
    "id, email, password_hash, full_name, role::text AS role, is_active, created_at, updated_at";
const TOKEN_COLUMNS: &str = "id, user_id, token, expires_at, is_active, created_at, updated_at";
const COMPANY_COLUMNS: &str =
    "id, name, description, subdomain, owner_id, created_at, updated_at";
const LOCATION_COLUMNS: &str = "id, city, state, country, timezone";
const JOB_COLUMNS: &str = "id, company_id, location_id, title, description, salary_min, \
                           salary_max, status::text AS status, created_by, created_at, updated_at";
const APPLICATION_COLUMNS: &str = "id, user_id, job_id, status::text AS status, cover_letter, \
                                   resume_url, applied_at, updated_at";

//=========================================================================================
// `JobBoardStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl JobBoardStore for DbAdapter {
    // --- Users ---

    async fn create_user(&self, new: NewUser) -> SchemaResult<User> {
        let now = self.clock.now();
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "INSERT INTO users (id, email, password_hash, full_name, role, is_active, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5::user_roles, TRUE, $6, $6) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.full_name)
        .bind(new.role.map(|r| r.as_str()))
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db_err)?;
        tx.commit().await.map_err(map_db_err)?;
        record.to_domain()
    }

    async fn get_user(&self, id: Uuid) -> SchemaResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => SchemaError::NotFound(format!("User {} not found", id)),
            other => map_db_err(other),
        })?;
        record.to_domain()
    }

    async fn get_user_by_email(&self, email: &str) -> SchemaResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                SchemaError::NotFound(format!("User with email {} not found", email))
            }
            other => map_db_err(other),
        })?;
        record.to_domain()
    }

    async fn update_user(&self, id: Uuid, patch: UserPatch) -> SchemaResult<User> {
        if patch.is_empty() {
            return self.get_user(id).await;
        }
        let now = self.clock.now();
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "UPDATE users SET \
                 email = COALESCE($2, email), \
                 password_hash = COALESCE($3, password_hash), \
                 full_name = COALESCE($4, full_name), \
                 role = COALESCE($5::user_roles, role), \
                 is_active = COALESCE($6, is_active), \
                 updated_at = $7 \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(&patch.email)
        .bind(&patch.password_hash)
        .bind(&patch.full_name)
        .bind(patch.role.map(|r| r.as_str()))
        .bind(patch.is_active)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => SchemaError::NotFound(format!("User {} not found", id)),
            other => map_db_err(other),
        })?;
        tx.commit().await.map_err(map_db_err)?;
        record.to_domain()
    }

    async fn delete_user(&self, id: Uuid) -> SchemaResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;
        if result.rows_affected() == 0 {
            return Err(SchemaError::NotFound(format!("User {} not found", id)));
        }
        Ok(())
    }

    // --- Refresh Tokens ---

    async fn create_refresh_token(&self, new: NewRefreshToken) -> SchemaResult<RefreshToken> {
        let now = self.clock.now();
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;
        let record = sqlx::query_as::<_, RefreshTokenRecord>(&format!(
            "INSERT INTO refresh_tokens (id, user_id, token, expires_at, is_active, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, TRUE, $5, $5) \
             RETURNING {TOKEN_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(new.user_id)
        .bind(&new.token)
        .bind(new.expires_at)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db_err)?;
        tx.commit().await.map_err(map_db_err)?;
        Ok(record.to_domain())
    }

    async fn get_refresh_token_by_token(&self, token: &str) -> SchemaResult<RefreshToken> {
        let record = sqlx::query_as::<_, RefreshTokenRecord>(&format!(
            "SELECT {TOKEN_COLUMNS} FROM refresh_tokens WHERE token = $1"
        ))
        .bind(token)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                SchemaError::NotFound("Refresh token not found".to_string())
            }
            other => map_db_err(other),
        })?;
        Ok(record.to_domain())
    }

    async fn refresh_tokens_for_user(&self, user_id: Uuid) -> SchemaResult<Vec<RefreshToken>> {
        let records = sqlx::query_as::<_, RefreshTokenRecord>(&format!(
            "SELECT {TOKEN_COLUMNS} FROM refresh_tokens WHERE user_id = $1 ORDER BY created_at ASC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn deactivate_refresh_token(&self, id: Uuid) -> SchemaResult<RefreshToken> {
        let now = self.clock.now();
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;
        let record = sqlx::query_as::<_, RefreshTokenRecord>(&format!(
            "UPDATE refresh_tokens SET is_active = FALSE, updated_at = $2 \
             WHERE id = $1 \
             RETURNING {TOKEN_COLUMNS}"
        ))
        .bind(id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                SchemaError::NotFound(format!("Refresh token {} not found", id))
            }
            other => map_db_err(other),
        })?;
        tx.commit().await.map_err(map_db_err)?;
        Ok(record.to_domain())
    }

    async fn delete_refresh_token(&self, id: Uuid) -> SchemaResult<()> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;
        if result.rows_affected() == 0 {
            return Err(SchemaError::NotFound(format!(
                "Refresh token {} not found",
                id
            )));
        }
        Ok(())
    }

    // --- Companies ---

    async fn create_company(&self, new: NewCompany) -> SchemaResult<Company> {
        let now = self.clock.now();
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;
        let record = sqlx::query_as::<_, CompanyRecord>(&format!(
            "INSERT INTO companies (id, name, description, subdomain, owner_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $6) \
             RETURNING {COMPANY_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&new.name)
        .bind(&new.description)
        .bind(&new.subdomain)
        .bind(new.owner_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db_err)?;
        tx.commit().await.map_err(map_db_err)?;
        Ok(record.to_domain())
    }

    async fn get_company(&self, id: Uuid) -> SchemaResult<Company> {
        let record = sqlx::query_as::<_, CompanyRecord>(&format!(
            "SELECT {COMPANY_COLUMNS} FROM companies WHERE id = $1"
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                SchemaError::NotFound(format!("Company {} not found", id))
            }
            other => map_db_err(other),
        })?;
        Ok(record.to_domain())
    }

    async fn get_company_by_subdomain(&self, subdomain: &str) -> SchemaResult<Company> {
        let record = sqlx::query_as::<_, CompanyRecord>(&format!(
            "SELECT {COMPANY_COLUMNS} FROM companies WHERE subdomain = $1"
        ))
        .bind(subdomain)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                SchemaError::NotFound(format!("Company with subdomain {} not found", subdomain))
            }
            other => map_db_err(other),
        })?;
        Ok(record.to_domain())
    }

    async fn update_company(&self, id: Uuid, patch: CompanyPatch) -> SchemaResult<Company> {
        if patch.is_empty() {
            return self.get_company(id).await;
        }
        let now = self.clock.now();
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;
        let record = sqlx::query_as::<_, CompanyRecord>(&format!(
            "UPDATE companies SET \
                 name = COALESCE($2, name), \
                 description = COALESCE($3, description), \
                 subdomain = COALESCE($4, subdomain), \
                 owner_id = COALESCE($5, owner_id), \
                 updated_at = $6 \
             WHERE id = $1 \
             RETURNING {COMPANY_COLUMNS}"
        ))
        .bind(id)
        .bind(&patch.name)
        .bind(&patch.description)
        .bind(&patch.subdomain)
        .bind(patch.owner_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                SchemaError::NotFound(format!("Company {} not found", id))
            }
            other => map_db_err(other),
        })?;
        tx.commit().await.map_err(map_db_err)?;
        Ok(record.to_domain())
    }

    async fn delete_company(&self, id: Uuid) -> SchemaResult<()> {
        // FKs are ON DELETE RESTRICT: this fails while the company still
        // owns jobs.
        let result = sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;
        if result.rows_affected() == 0 {
            return Err(SchemaError::NotFound(format!("Company {} not found", id)));
        }
        Ok(())
    }

    async fn companies_owned_by(&self, owner_id: Uuid) -> SchemaResult<Vec<Company>> {
        let records = sqlx::query_as::<_, CompanyRecord>(&format!(
            "SELECT {COMPANY_COLUMNS} FROM companies WHERE owner_id = $1 ORDER BY created_at ASC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    // --- Locations ---

    async fn create_location(&self, new: NewLocation) -> SchemaResult<Location> {
        // Locations carry no timestamps, so no clock read here.
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;
        let record = sqlx::query_as::<_, LocationRecord>(&format!(
            "INSERT INTO locations (id, city, state, country, timezone) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {LOCATION_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&new.city)
        .bind(&new.state)
        .bind(&new.country)
        .bind(&new.timezone)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db_err)?;
        tx.commit().await.map_err(map_db_err)?;
        Ok(record.to_domain())
    }

    async fn get_location(&self, id: Uuid) -> SchemaResult<Location> {
        let record = sqlx::query_as::<_, LocationRecord>(&format!(
            "SELECT {LOCATION_COLUMNS} FROM locations WHERE id = $1"
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                SchemaError::NotFound(format!("Location {} not found", id))
            }
            other => map_db_err(other),
        })?;
        Ok(record.to_domain())
    }

    async fn update_location(&self, id: Uuid, patch: LocationPatch) -> SchemaResult<Location> {
        if patch.is_empty() {
            return self.get_location(id).await;
        }
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;
        let record = sqlx::query_as::<_, LocationRecord>(&format!(
            "UPDATE locations SET \
                 city = COALESCE($2, city), \
                 state = COALESCE($3, state), \
                 country = COALESCE($4, country), \
                 timezone = COALESCE($5, timezone) \
             WHERE id = $1 \
             RETURNING {LOCATION_COLUMNS}"
        ))
        .bind(id)
        .bind(&patch.city)
        .bind(&patch.state)
        .bind(&patch.country)
        .bind(&patch.timezone)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                SchemaError::NotFound(format!("Location {} not found", id))
            }
            other => map_db_err(other),
        })?;
        tx.commit().await.map_err(map_db_err)?;
        Ok(record.to_domain())
    }

    async fn delete_location(&self, id: Uuid) -> SchemaResult<()> {
        let result = sqlx::query("DELETE FROM locations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;
        if result.rows_affected() == 0 {
            return Err(SchemaError::NotFound(format!("Location {} not found", id)));
        }
        Ok(())
    }

    // --- Jobs ---

    async fn create_job(&self, new: NewJob) -> SchemaResult<Job> {
        let now = self.clock.now();
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;
        let record = sqlx::query_as::<_, JobRecord>(&format!(
            "INSERT INTO jobs (id, company_id, location_id, title, description, salary_min, \
                               salary_max, status, created_by, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8::job_statuses, $9, $10, $10) \
             RETURNING {JOB_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(new.company_id)
        .bind(new.location_id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.salary_min)
        .bind(new.salary_max)
        .bind(new.status.as_str())
        .bind(new.created_by)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db_err)?;
        tx.commit().await.map_err(map_db_err)?;
        record.to_domain()
    }

    async fn get_job(&self, id: Uuid) -> SchemaResult<Job> {
        let record = sqlx::query_as::<_, JobRecord>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1"
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => SchemaError::NotFound(format!("Job {} not found", id)),
            other => map_db_err(other),
        })?;
        record.to_domain()
    }

    async fn update_job(&self, id: Uuid, patch: JobPatch) -> SchemaResult<Job> {
        if patch.is_empty() {
            return self.get_job(id).await;
        }
        let now = self.clock.now();
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;
        let record = sqlx::query_as::<_, JobRecord>(&format!(
            "UPDATE jobs SET \
                 title = COALESCE($2, title), \
                 description = COALESCE($3, description), \
                 salary_min = COALESCE($4, salary_min), \
                 salary_max = COALESCE($5, salary_max), \
                 status = COALESCE($6::job_statuses, status), \
                 location_id = COALESCE($7, location_id), \
                 updated_at = $8 \
             WHERE id = $1 \
             RETURNING {JOB_COLUMNS}"
        ))
        .bind(id)
        .bind(&patch.title)
        .bind(&patch.description)
        .bind(patch.salary_min)
        .bind(patch.salary_max)
        .bind(patch.status.map(|s| s.as_str()))
        .bind(patch.location_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => SchemaError::NotFound(format!("Job {} not found", id)),
            other => map_db_err(other),
        })?;
        tx.commit().await.map_err(map_db_err)?;
        record.to_domain()
    }

    async fn delete_job(&self, id: Uuid) -> SchemaResult<()> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;
        if result.rows_affected() == 0 {
            return Err(SchemaError::NotFound(format!("Job {} not found", id)));
        }
        Ok(())
    }

    async fn jobs_for_company(&self, company_id: Uuid) -> SchemaResult<Vec<Job>> {
        let records = sqlx::query_as::<_, JobRecord>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE company_id = $1 ORDER BY created_at ASC"
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn jobs_for_location(&self, location_id: Uuid) -> SchemaResult<Vec<Job>> {
        let records = sqlx::query_as::<_, JobRecord>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE location_id = $1 ORDER BY created_at ASC"
        ))
        .bind(location_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    // --- Applications ---

    async fn create_application(&self, new: NewApplication) -> SchemaResult<Application> {
        let now = self.clock.now();
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;
        let record = sqlx::query_as::<_, ApplicationRecord>(&format!(
            "INSERT INTO applications (id, user_id, job_id, status, cover_letter, resume_url, \
                                       applied_at, updated_at) \
             VALUES ($1, $2, $3, $4::application_statuses, $5, $6, $7, $7) \
             RETURNING {APPLICATION_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(new.user_id)
        .bind(new.job_id)
        .bind(new.status.as_str())
        .bind(&new.cover_letter)
        .bind(&new.resume_url)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db_err)?;
        tx.commit().await.map_err(map_db_err)?;
        record.to_domain()
    }

    async fn get_application(&self, id: Uuid) -> SchemaResult<Application> {
        let record = sqlx::query_as::<_, ApplicationRecord>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = $1"
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                SchemaError::NotFound(format!("Application {} not found", id))
            }
            other => map_db_err(other),
        })?;
        record.to_domain()
    }

    async fn update_application(
        &self,
        id: Uuid,
        patch: ApplicationPatch,
    ) -> SchemaResult<Application> {
        if patch.is_empty() {
            return self.get_application(id).await;
        }
        let now = self.clock.now();
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;
        let record = sqlx::query_as::<_, ApplicationRecord>(&format!(
            "UPDATE applications SET \
                 status = COALESCE($2::application_statuses, status), \
                 cover_letter = COALESCE($3, cover_letter), \
                 resume_url = COALESCE($4, resume_url), \
                 updated_at = $5 \
             WHERE id = $1 \
             RETURNING {APPLICATION_COLUMNS}"
        ))
        .bind(id)
        .bind(patch.status.map(|s| s.as_str()))
        .bind(&patch.cover_letter)
        .bind(&patch.resume_url)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                SchemaError::NotFound(format!("Application {} not found", id))
            }
            other => map_db_err(other),
        })?;
        tx.commit().await.map_err(map_db_err)?;
        record.to_domain()
    }

    async fn delete_application(&self, id: Uuid) -> SchemaResult<()> {
        let result = sqlx::query("DELETE FROM applications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;
        if result.rows_affected() == 0 {
            return Err(SchemaError::NotFound(format!(
                "Application {} not found",
                id
            )));
        }
        Ok(())
    }

    async fn applications_for_user(&self, user_id: Uuid) -> SchemaResult<Vec<Application>> {
        let records = sqlx::query_as::<_, ApplicationRecord>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE user_id = $1 ORDER BY applied_at ASC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn applications_for_job(&self, job_id: Uuid) -> SchemaResult<Vec<Application>> {
        let records = sqlx::query_as::<_, ApplicationRecord>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE job_id = $1 ORDER BY applied_at ASC"
        ))
        .bind(job_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }
}
