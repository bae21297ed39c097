mod auth;
mod descriptor;
mod error;
pub mod file_listing;

pub use auth::{AuthResponse, Credentials, ErrorBody, HealthStatus, LoginSession};
pub use descriptor::{FileDescriptor, FileRecord, ListFilesResponse, parse_upload_response, parse_upload_timestamp};
pub use error::{Result, VaultTypesError};
