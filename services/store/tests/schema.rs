//! Integration tests for the Postgres adapter.
//!
//! These run against a live database and are ignored by default. Point
//! `DATABASE_URL` at a disposable Postgres instance and run:
//!
//! ```text
//! cargo test -p store -- --ignored
//! ```

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use jobboard_core::domain::{
    ApplicationStatus, JobPatch, JobStatus, NewApplication, NewCompany, NewJob, NewLocation,
    NewRefreshToken, NewUser, User, UserPatch, UserRole,
};
use jobboard_core::ports::{Clock, JobBoardStore, SchemaError};
use sqlx::postgres::PgPoolOptions;
use store_lib::adapters::{DbAdapter, SystemClock};
use uuid::Uuid;

/// A clock that only moves when a test tells it to.
struct SteppingClock {
    now: Mutex<DateTime<Utc>>,
}

impl SteppingClock {
    fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now = *now + by;
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

async fn adapter_with_clock(clock: Arc<dyn Clock>) -> DbAdapter {
    let url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must point at a disposable test database");
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("failed to connect to the test database");
    let adapter = DbAdapter::new(pool, clock);
    adapter
        .run_migrations()
        .await
        .expect("failed to run migrations");
    adapter
}

async fn adapter() -> DbAdapter {
    adapter_with_clock(Arc::new(SystemClock)).await
}

fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}

fn new_user() -> NewUser {
    NewUser {
        email: format!("{}@example.com", unique("user")),
        password_hash: "argon2id$stub".to_string(),
        full_name: Some("Test User".to_string()),
        role: Some(UserRole::Candidate),
    }
}

async fn seed_user(store: &DbAdapter) -> User {
    store.create_user(new_user()).await.expect("create user")
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database (set DATABASE_URL)"]
async fn end_to_end_create_and_navigate() {
    let store = adapter().await;

    let owner = store
        .create_user(NewUser {
            email: format!("{}@x.com", unique("a")),
            password_hash: "hash".to_string(),
            full_name: None,
            role: Some(UserRole::Recruiter),
        })
        .await
        .unwrap();
    assert!(!owner.id.is_nil());
    assert!(owner.is_active);

    let company = store
        .create_company(NewCompany {
            name: unique("Acme"),
            description: None,
            subdomain: unique("acme"),
            owner_id: owner.id,
        })
        .await
        .unwrap();

    let location = store
        .create_location(NewLocation {
            city: "Austin".to_string(),
            state: Some("TX".to_string()),
            country: Some("USA".to_string()),
            timezone: Some("America/Chicago".to_string()),
        })
        .await
        .unwrap();

    let job = store
        .create_job(NewJob {
            company_id: company.id,
            location_id: Some(location.id),
            title: "Engineer".to_string(),
            description: None,
            salary_min: Some(100_000),
            salary_max: Some(150_000),
            status: JobStatus::default(),
            created_by: Some(owner.id),
        })
        .await
        .unwrap();
    assert_eq!(job.status, JobStatus::Open);

    let application = store
        .create_application(NewApplication {
            user_id: owner.id,
            job_id: job.id,
            status: ApplicationStatus::default(),
            cover_letter: None,
            resume_url: None,
        })
        .await
        .unwrap();
    assert_eq!(application.status, ApplicationStatus::Applied);

    // Navigate each relationship from both ends.
    assert_eq!(store.get_company(job.company_id).await.unwrap().id, company.id);
    let company_jobs = store.jobs_for_company(company.id).await.unwrap();
    assert!(company_jobs.iter().any(|j| j.id == job.id));

    assert_eq!(
        store.get_location(job.location_id.unwrap()).await.unwrap().id,
        location.id
    );
    let location_jobs = store.jobs_for_location(location.id).await.unwrap();
    assert!(location_jobs.iter().any(|j| j.id == job.id));

    assert_eq!(store.get_user(company.owner_id).await.unwrap().id, owner.id);
    let owned = store.companies_owned_by(owner.id).await.unwrap();
    assert!(owned.iter().any(|c| c.id == company.id));

    assert_eq!(store.get_user(application.user_id).await.unwrap().id, owner.id);
    assert_eq!(store.get_job(application.job_id).await.unwrap().id, job.id);
    let user_apps = store.applications_for_user(owner.id).await.unwrap();
    assert!(user_apps.iter().any(|a| a.id == application.id));
    let job_apps = store.applications_for_job(job.id).await.unwrap();
    assert!(job_apps.iter().any(|a| a.id == application.id));
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database (set DATABASE_URL)"]
async fn duplicate_user_email_is_rejected() {
    let store = adapter().await;
    let mut new = new_user();
    store.create_user(new.clone()).await.unwrap();

    new.full_name = None;
    let err = store.create_user(new).await.unwrap_err();
    assert!(matches!(err, SchemaError::UniqueViolation { .. }), "{err:?}");
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database (set DATABASE_URL)"]
async fn duplicate_company_name_and_subdomain_are_rejected() {
    let store = adapter().await;
    let owner = seed_user(&store).await;
    let name = unique("Globex");
    let subdomain = unique("globex");

    store
        .create_company(NewCompany {
            name: name.clone(),
            description: None,
            subdomain: subdomain.clone(),
            owner_id: owner.id,
        })
        .await
        .unwrap();

    let same_name = store
        .create_company(NewCompany {
            name: name.clone(),
            description: None,
            subdomain: unique("other"),
            owner_id: owner.id,
        })
        .await
        .unwrap_err();
    assert!(matches!(same_name, SchemaError::UniqueViolation { .. }));

    let same_subdomain = store
        .create_company(NewCompany {
            name: unique("Other"),
            description: None,
            subdomain,
            owner_id: owner.id,
        })
        .await
        .unwrap_err();
    assert!(matches!(same_subdomain, SchemaError::UniqueViolation { .. }));
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database (set DATABASE_URL)"]
async fn duplicate_refresh_token_is_rejected() {
    let store = adapter().await;
    let user = seed_user(&store).await;
    let token = unique("token");

    store
        .create_refresh_token(NewRefreshToken {
            user_id: user.id,
            token: token.clone(),
            expires_at: Utc::now() + Duration::days(30),
        })
        .await
        .unwrap();

    let err = store
        .create_refresh_token(NewRefreshToken {
            user_id: user.id,
            token,
            expires_at: Utc::now() + Duration::days(30),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, SchemaError::UniqueViolation { .. }));
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database (set DATABASE_URL)"]
async fn missing_references_are_rejected() {
    let store = adapter().await;
    let nowhere = Uuid::new_v4();

    let token = store
        .create_refresh_token(NewRefreshToken {
            user_id: nowhere,
            token: unique("token"),
            expires_at: Utc::now() + Duration::days(1),
        })
        .await
        .unwrap_err();
    assert!(matches!(token, SchemaError::ForeignKeyViolation { .. }));

    let company = store
        .create_company(NewCompany {
            name: unique("Ghost"),
            description: None,
            subdomain: unique("ghost"),
            owner_id: nowhere,
        })
        .await
        .unwrap_err();
    assert!(matches!(company, SchemaError::ForeignKeyViolation { .. }));

    let job = store
        .create_job(NewJob {
            company_id: nowhere,
            location_id: None,
            title: "Phantom".to_string(),
            description: None,
            salary_min: None,
            salary_max: None,
            status: JobStatus::default(),
            created_by: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(job, SchemaError::ForeignKeyViolation { .. }));

    let application = store
        .create_application(NewApplication {
            user_id: nowhere,
            job_id: nowhere,
            status: ApplicationStatus::default(),
            cover_letter: None,
            resume_url: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        application,
        SchemaError::ForeignKeyViolation { .. }
    ));
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database (set DATABASE_URL)"]
async fn job_without_location_reads_absent() {
    let store = adapter().await;
    let owner = seed_user(&store).await;
    let company = store
        .create_company(NewCompany {
            name: unique("Initech"),
            description: None,
            subdomain: unique("initech"),
            owner_id: owner.id,
        })
        .await
        .unwrap();

    let job = store
        .create_job(NewJob {
            company_id: company.id,
            location_id: None,
            title: "Remote Engineer".to_string(),
            description: None,
            salary_min: None,
            salary_max: None,
            status: JobStatus::default(),
            created_by: None,
        })
        .await
        .unwrap();

    assert!(job.location_id.is_none());
    assert!(store.get_job(job.id).await.unwrap().location_id.is_none());
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database (set DATABASE_URL)"]
async fn update_refreshes_updated_at_and_keeps_created_at() {
    let clock = Arc::new(SteppingClock::starting_at(
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
    ));
    let store = adapter_with_clock(clock.clone()).await;

    let user = seed_user(&store).await;
    assert_eq!(user.created_at, user.updated_at);

    clock.advance(Duration::seconds(90));
    let updated = store
        .update_user(
            user.id,
            UserPatch {
                full_name: Some("Renamed".to_string()),
                ..UserPatch::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.created_at, user.created_at);
    assert_eq!(updated.updated_at, user.updated_at + Duration::seconds(90));
    assert_eq!(updated.full_name.as_deref(), Some("Renamed"));
    // Untouched columns survive a partial patch.
    assert_eq!(updated.email, user.email);
    assert_eq!(updated.role, Some(UserRole::Candidate));

    // An empty patch persists nothing and leaves the timestamps alone.
    clock.advance(Duration::seconds(90));
    let unchanged = store.update_user(user.id, UserPatch::default()).await.unwrap();
    assert_eq!(unchanged.updated_at, updated.updated_at);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database (set DATABASE_URL)"]
async fn closing_a_job_refreshes_updated_at() {
    let clock = Arc::new(SteppingClock::starting_at(
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
    ));
    let store = adapter_with_clock(clock.clone()).await;

    let owner = seed_user(&store).await;
    let company = store
        .create_company(NewCompany {
            name: unique("Hooli"),
            description: None,
            subdomain: unique("hooli"),
            owner_id: owner.id,
        })
        .await
        .unwrap();
    let job = store
        .create_job(NewJob {
            company_id: company.id,
            location_id: None,
            title: "Engineer".to_string(),
            description: None,
            salary_min: None,
            salary_max: None,
            status: JobStatus::default(),
            created_by: Some(owner.id),
        })
        .await
        .unwrap();

    clock.advance(Duration::minutes(5));
    let closed = store
        .update_job(
            job.id,
            JobPatch {
                status: Some(JobStatus::Closed),
                ..JobPatch::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(closed.status, JobStatus::Closed);
    assert_eq!(closed.created_at, job.created_at);
    assert!(closed.updated_at > job.updated_at);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database (set DATABASE_URL)"]
async fn deleting_a_company_that_owns_jobs_is_restricted() {
    let store = adapter().await;
    let owner = seed_user(&store).await;
    let company = store
        .create_company(NewCompany {
            name: unique("Umbrella"),
            description: None,
            subdomain: unique("umbrella"),
            owner_id: owner.id,
        })
        .await
        .unwrap();
    let job = store
        .create_job(NewJob {
            company_id: company.id,
            location_id: None,
            title: "Engineer".to_string(),
            description: None,
            salary_min: None,
            salary_max: None,
            status: JobStatus::default(),
            created_by: None,
        })
        .await
        .unwrap();

    let err = store.delete_company(company.id).await.unwrap_err();
    assert!(matches!(err, SchemaError::ForeignKeyViolation { .. }));
    // The company is still there.
    assert!(store.get_company(company.id).await.is_ok());

    // Deleting children first unblocks the parent.
    store.delete_job(job.id).await.unwrap();
    store.delete_company(company.id).await.unwrap();
    assert!(matches!(
        store.get_company(company.id).await.unwrap_err(),
        SchemaError::NotFound(_)
    ));
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database (set DATABASE_URL)"]
async fn deactivating_a_refresh_token_flips_the_flag() {
    let store = adapter().await;
    let user = seed_user(&store).await;
    let token = store
        .create_refresh_token(NewRefreshToken {
            user_id: user.id,
            token: unique("token"),
            expires_at: Utc::now() + Duration::days(30),
        })
        .await
        .unwrap();
    assert!(token.is_active);

    let deactivated = store.deactivate_refresh_token(token.id).await.unwrap();
    assert!(!deactivated.is_active);

    let fetched = store
        .get_refresh_token_by_token(&token.token)
        .await
        .unwrap();
    assert!(!fetched.is_active);

    let listed = store.refresh_tokens_for_user(user.id).await.unwrap();
    assert!(listed.iter().any(|t| t.id == token.id && !t.is_active));
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database (set DATABASE_URL)"]
async fn duplicate_applications_are_permitted() {
    let store = adapter().await;
    let user = seed_user(&store).await;
    let company = store
        .create_company(NewCompany {
            name: unique("Stark"),
            description: None,
            subdomain: unique("stark"),
            owner_id: user.id,
        })
        .await
        .unwrap();
    let job = store
        .create_job(NewJob {
            company_id: company.id,
            location_id: None,
            title: "Engineer".to_string(),
            description: None,
            salary_min: None,
            salary_max: None,
            status: JobStatus::default(),
            created_by: None,
        })
        .await
        .unwrap();

    let new = NewApplication {
        user_id: user.id,
        job_id: job.id,
        status: ApplicationStatus::default(),
        cover_letter: None,
        resume_url: None,
    };
    let first = store.create_application(new.clone()).await.unwrap();
    let second = store.create_application(new).await.unwrap();
    assert_ne!(first.id, second.id);

    let apps = store.applications_for_job(job.id).await.unwrap();
    assert_eq!(
        apps.iter().filter(|a| a.user_id == user.id).count(),
        2,
        "both applications should be stored"
    );
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database (set DATABASE_URL)"]
async fn missing_rows_surface_not_found() {
    let store = adapter().await;
    let nowhere = Uuid::new_v4();

    assert!(matches!(
        store.get_user(nowhere).await.unwrap_err(),
        SchemaError::NotFound(_)
    ));
    assert!(matches!(
        store.get_company(nowhere).await.unwrap_err(),
        SchemaError::NotFound(_)
    ));
    assert!(matches!(
        store.get_location(nowhere).await.unwrap_err(),
        SchemaError::NotFound(_)
    ));
    assert!(matches!(
        store.get_job(nowhere).await.unwrap_err(),
        SchemaError::NotFound(_)
    ));
    assert!(matches!(
        store.get_application(nowhere).await.unwrap_err(),
        SchemaError::NotFound(_)
    ));
    assert!(matches!(
        store.delete_user(nowhere).await.unwrap_err(),
        SchemaError::NotFound(_)
    ));
}
