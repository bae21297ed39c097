#![allow(non_snake_case)]

use std::time::Duration;

use serial_test::serial;
use utils::EnvVarGuard;
use vault_config::{VaultConfig, config_group};

mod sample {
    use super::*;
    config_group!({
        ref TEST_INT: usize = 42;
        ref TEST_STRING: String = "default".to_string();
        ref TEST_FLAG: bool = false;
    });
}

#[test]
fn test_defaults() {
    let config = VaultConfig::default();

    assert_eq!(config.client.endpoint, "http://localhost:5000/api");
    assert_eq!(config.client.retry_max_attempts, 5);
    assert_eq!(config.upload.max_concurrent_uploads, 0);
    assert_eq!(config.upload.stream_block_size, 64 * 1024);
    assert_eq!(config.upload.speed_smoothing_half_life, None);
    assert_eq!(config.log.prefix, "filevault");
}

#[test]
fn test_group_name_from_module() {
    assert_eq!(sample::ConfigValueGroup::group_name(), "sample");
}

#[test]
#[serial(config_env)]
fn test_custom_group_env_overrides() {
    let _int = EnvVarGuard::set("FILEVAULT_SAMPLE_TEST_INT", "7");
    let _flag = EnvVarGuard::set("FILEVAULT_SAMPLE_TEST_FLAG", "yes");

    let mut group = sample::ConfigValueGroup::new();
    group.apply_env_overrides();

    assert_eq!(group.TEST_INT, 7);
    assert!(group.TEST_FLAG);
    assert_eq!(group.TEST_STRING, "default");
}

#[test]
#[serial(config_env)]
fn test_vault_config_env_overrides() {
    let _endpoint = EnvVarGuard::set("FILEVAULT_CLIENT_ENDPOINT", "https://vault.example.com/api");
    let _cap = EnvVarGuard::set("FILEVAULT_UPLOAD_MAX_CONCURRENT_UPLOADS", "3");
    let _smoothing = EnvVarGuard::set("FILEVAULT_UPLOAD_SPEED_SMOOTHING_HALF_LIFE", "2s");
    let _delay = EnvVarGuard::set("FILEVAULT_CLIENT_RETRY_BASE_DELAY", "500ms");

    let config = VaultConfig::new();

    assert_eq!(config.client.endpoint, "https://vault.example.com/api");
    assert_eq!(config.upload.max_concurrent_uploads, 3);
    assert_eq!(config.upload.speed_smoothing_half_life, Some(Duration::from_secs(2)));
    assert_eq!(config.client.retry_base_delay, Duration::from_millis(500));
}

#[test]
#[serial(config_env)]
fn test_unparsable_override_keeps_default() {
    let _cap = EnvVarGuard::set("FILEVAULT_UPLOAD_MAX_CONCURRENT_UPLOADS", "lots");

    let config = VaultConfig::new();
    assert_eq!(config.upload.max_concurrent_uploads, 0);
}

#[test]
fn test_builder_overrides() {
    let config = VaultConfig::default()
        .with_endpoint("http://127.0.0.1:9000/api")
        .with_max_concurrent_uploads(2);

    assert_eq!(config.client.endpoint, "http://127.0.0.1:9000/api");
    assert_eq!(config.upload.max_concurrent_uploads, 2);
}
