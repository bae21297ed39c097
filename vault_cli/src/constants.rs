pub const CLI_PROGRAM: &str = "filevault";

// The current version of executable
pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

// Environment variable names
pub const FILEVAULT_TOKEN_ENV: &str = "FILEVAULT_TOKEN";
pub const FILEVAULT_PASSWORD_ENV: &str = "FILEVAULT_PASSWORD";

/// Quota the storage summary is measured against unless `--quota` is given.
pub const DEFAULT_STORAGE_QUOTA: u64 = 10 * 1024 * 1024 * 1024;
