use std::path::PathBuf;

use vault_config::{LogConfig, VaultConfig};

#[derive(Clone, Debug, PartialEq)]
pub enum LoggingMode {
    Directory(PathBuf),
    File(PathBuf),
    Console,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoggingConfig {
    pub logging_mode: LoggingMode,
    pub use_json: bool,
    pub file_prefix: String,
    pub version: String,
}

impl LoggingConfig {
    /// Logging setup from the `log` group of `config`.
    pub fn from_config(config: &VaultConfig, version: impl Into<String>) -> LoggingConfig {
        Self::from_log_group(&config.log, version)
    }

    pub fn from_log_group(log: &LogConfig, version: impl Into<String>) -> LoggingConfig {
        // Choose the logging mode.
        let logging_mode = match log.dest.as_deref().map(str::trim) {
            None | Some("") => LoggingMode::Console,
            Some(log_dest) => {
                let path = normalized_path(log_dest);

                if log_dest.ends_with('/') || log_dest.ends_with('\\') || path.is_dir() {
                    LoggingMode::Directory(path)
                } else {
                    LoggingMode::File(path)
                }
            },
        };

        let use_json = match &log.format {
            Some(format) => format.to_ascii_lowercase().trim() == "json",
            None => logging_mode != LoggingMode::Console,
        };

        Self {
            logging_mode,
            use_json,
            file_prefix: log.prefix.clone(),
            version: version.into(),
        }
    }

    /// Plain text logging to the console, ignoring any configured destination.
    pub fn console(version: impl Into<String>) -> LoggingConfig {
        Self {
            logging_mode: LoggingMode::Console,
            use_json: false,
            file_prefix: LogConfig::default().prefix,
            version: version.into(),
        }
    }
}

/// Expands a leading `~/` to the home directory.
fn normalized_path(dest: &str) -> PathBuf {
    if let Some(rest) = dest.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(dest)
}
