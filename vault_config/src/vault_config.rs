use crate::groups;

/// All configuration for the client, grouped by concern.
///
/// `VaultConfig::default()` holds only the built-in defaults; `VaultConfig::new()` additionally
/// applies `FILEVAULT_<GROUP>_<FIELD>` environment overrides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VaultConfig {
    pub client: groups::client::ConfigValues,
    pub upload: groups::upload::ConfigValues,
    pub log: groups::log::ConfigValues,
}

impl VaultConfig {
    pub fn new() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    pub fn apply_env_overrides(&mut self) {
        self.client.apply_env_overrides();
        self.upload.apply_env_overrides();
        self.log.apply_env_overrides();
    }

    /// Replaces the API endpoint, e.g. from a command line flag.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.client.endpoint = endpoint.into();
        self
    }

    /// Replaces the upload concurrency limit; 0 means unbounded.
    pub fn with_max_concurrent_uploads(mut self, max_concurrent_uploads: usize) -> Self {
        self.upload.max_concurrent_uploads = max_concurrent_uploads;
        self
    }
}
