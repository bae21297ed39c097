use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::RetryTransientMiddleware;
use reqwest_retry::policies::ExponentialBackoff;
use tracing::debug;
use vault_config::ClientConfig;

use crate::error::{Result, VaultClientError};

fn reqwest_client(config: &ClientConfig) -> Result<reqwest::Client> {
    if config.user_agent.trim().is_empty() {
        return Err(VaultClientError::ConfigurationError("user agent must not be empty".to_owned()));
    }

    let client = reqwest::Client::builder()
        .connect_timeout(config.connect_timeout)
        .read_timeout(config.read_timeout)
        .pool_idle_timeout(config.idle_connection_timeout)
        .pool_max_idle_per_host(config.max_idle_connections)
        .user_agent(config.user_agent.as_str())
        .build()?;
    Ok(client)
}

/// Exponential backoff between `retry_base_delay` and `retry_max_delay`, for at most
/// `retry_max_attempts` retries.
pub fn retry_policy(config: &ClientConfig) -> ExponentialBackoff {
    let min = config.retry_base_delay.min(config.retry_max_delay);
    ExponentialBackoff::builder()
        .retry_bounds(min, config.retry_max_delay)
        .build_with_max_retries(config.retry_max_attempts)
}

/// Builds the client for the idempotent API calls, retrying transient failures.
pub fn build_http_client(config: &ClientConfig) -> Result<ClientWithMiddleware> {
    let client = reqwest_client(config)?;
    debug!(
        retries = config.retry_max_attempts,
        base_delay = ?config.retry_base_delay,
        max_delay = ?config.retry_max_delay,
        "building http client with retry"
    );
    Ok(ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy(config)))
        .build())
}

/// Builds the client for uploads.  Upload bodies are streamed once, so there is no retry layer.
pub fn build_upload_http_client(config: &ClientConfig) -> Result<ClientWithMiddleware> {
    Ok(ClientBuilder::new(reqwest_client(config)?).build())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_clients_build_from_defaults() {
        let config = ClientConfig::default();
        assert!(build_http_client(&config).is_ok());
        assert!(build_upload_http_client(&config).is_ok());
    }

    #[test]
    fn test_empty_user_agent_is_rejected() {
        let mut config = ClientConfig::default();
        config.user_agent = " ".to_owned();
        assert!(matches!(build_http_client(&config), Err(VaultClientError::ConfigurationError(_))));
    }

    #[test]
    fn test_retry_policy_tolerates_inverted_bounds() {
        let mut config = ClientConfig::default();
        config.retry_base_delay = Duration::from_secs(120);
        config.retry_max_delay = Duration::from_secs(1);
        config.retry_max_attempts = 2;

        let policy = retry_policy(&config);
        assert_eq!(policy.max_n_retries, Some(2));
        assert_eq!(policy.min_retry_interval, Duration::from_secs(1));
        assert_eq!(policy.max_retry_interval, Duration::from_secs(1));
    }
}
