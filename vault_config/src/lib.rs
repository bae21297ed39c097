pub mod groups;
pub mod macros;
pub mod vault_config;

// Re-exported for use by the config_group macro.
pub use utils::configuration_utils::ParsableConfigValue;
pub use vault_config::VaultConfig;

pub type ClientConfig = groups::client::ConfigValueGroup;
pub type UploadConfig = groups::upload::ConfigValueGroup;
pub type LogConfig = groups::log::ConfigValueGroup;
