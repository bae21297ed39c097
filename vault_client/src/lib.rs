#![cfg_attr(feature = "strict", deny(warnings))]

pub use auth::{BearerCredentialHelper, CredentialHelper, NoopCredentialHelper};
pub use error::{Result, UploadError, VaultClientError};
pub use http_client::{build_http_client, build_upload_http_client, retry_policy};
pub use interface::{FileLibraryClient, UploadTransport};
pub use progress_tracked_streams::{StreamProgressReporter, UploadProgressStream};
pub use remote_client::RemoteClient;

mod auth;
mod error;
mod http_client;
mod interface;
mod progress_tracked_streams;
mod remote_client;
