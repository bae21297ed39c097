#![cfg_attr(feature = "strict", deny(warnings))]
//! # upload-session
//!
//! Tracks the upload of a batch of files to a FileVault backend, one session per file.
//!
//! - `UploadSessionManager` - Starts transfers and owns the session table
//! - `SessionTable` - The per-session state machine, usable on its own
//! - `UploadObserver` - Receives progress and terminal notifications
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use upload_session::{NoOpUploadObserver, UploadFile, UploadSessionManager, VaultConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = VaultConfig::new();
//!     let manager = UploadSessionManager::connect(
//!         "http://localhost:5000/api",
//!         "token".to_owned(),
//!         Arc::new(NoOpUploadObserver),
//!         &config,
//!     )?;
//!
//!     let file = UploadFile::from_path("photo.png").await?;
//!     let ids = manager.submit(vec![file]);
//!     manager.wait_idle().await;
//!
//!     let session = manager.session(ids[0]).unwrap();
//!     println!("{}: {}", session.file_name, session.state);
//!     Ok(())
//! }
//! ```

mod errors;
mod manager;
mod observer;
mod session;
mod session_table;

pub use errors::SessionError;
pub use manager::{ABORTED_DETAIL, UploadSessionManager};
pub use observer::{NoOpUploadObserver, SessionOutcome, SessionProgress, UploadObserver};
pub use session::{SessionId, UploadFile, UploadSession, UploadSessionSnapshot, UploadState, mime_type_for_file_name};
pub use session_table::SessionTable;
// Re-exported for convenience
pub use vault_config::VaultConfig;
pub use vault_types::FileRecord;
