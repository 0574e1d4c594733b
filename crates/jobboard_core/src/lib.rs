pub mod domain;
pub mod ports;

pub use domain::{
    Application, ApplicationPatch, ApplicationStatus, Company, CompanyPatch, InvalidEnumValue,
    Job, JobPatch, JobStatus, Location, LocationPatch, NewApplication, NewCompany, NewJob,
    NewLocation, NewRefreshToken, NewUser, RefreshToken, User, UserPatch, UserRole,
};
pub use ports::{Clock, JobBoardStore, SchemaError, SchemaResult};
