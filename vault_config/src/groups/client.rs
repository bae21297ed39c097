use std::time::Duration;

crate::config_group!({

    /// Base URL of the FileVault API; every route is appended to it.
    ///
    /// The default value is "http://localhost:5000/api".
    ///
    /// Use the environment variable `FILEVAULT_CLIENT_ENDPOINT` to set this value.
    ref endpoint : String = "http://localhost:5000/api".to_string();

    /// Retry at most this many times before permanently failing.  Applies to the
    /// login, register, list, delete and health requests; uploads are never retried.
    ///
    /// The default value is 5.
    ///
    /// Use the environment variable `FILEVAULT_CLIENT_RETRY_MAX_ATTEMPTS` to set this value.
    ref retry_max_attempts : u32 = 5;

    /// On errors that can be retried, delay for this amount of time
    /// before retrying.
    ///
    /// The default value is 3sec.
    ///
    /// Use the environment variable `FILEVAULT_CLIENT_RETRY_BASE_DELAY` to set this value.
    ref retry_base_delay : Duration = Duration::from_millis(3000);

    /// Upper bound on the backoff between two retries.
    ///
    /// The default value is 60sec.
    ///
    /// Use the environment variable `FILEVAULT_CLIENT_RETRY_MAX_DELAY` to set this value.
    ref retry_max_delay : Duration = Duration::from_secs(60);

    /// Maximum time allowed to establish a TCP connection to the server.
    ///
    /// The default value is 60sec.
    ///
    /// Use the environment variable `FILEVAULT_CLIENT_CONNECT_TIMEOUT` to set this value.
    ref connect_timeout : Duration = Duration::from_secs(60);

    /// Maximum time allowed between receiving data packets during a transfer.
    /// If no data is received for this duration, the connection is considered stalled.
    ///
    /// The default value is 120sec.
    ///
    /// Use the environment variable `FILEVAULT_CLIENT_READ_TIMEOUT` to set this value.
    ref read_timeout : Duration = Duration::from_secs(120);

    /// Cleanup idle connections that are unused for this amount of time.
    ///
    /// The default value is 60sec.
    ///
    /// Use the environment variable `FILEVAULT_CLIENT_IDLE_CONNECTION_TIMEOUT` to set this value.
    ref idle_connection_timeout : Duration = Duration::from_secs(60);

    /// No more than this number of idle connections in the connection pool.
    ///
    /// The default value is 16.
    ///
    /// Use the environment variable `FILEVAULT_CLIENT_MAX_IDLE_CONNECTIONS` to set this value.
    ref max_idle_connections : usize = 16;

    /// User agent sent with every request.
    ///
    /// Use the environment variable `FILEVAULT_CLIENT_USER_AGENT` to set this value.
    ref user_agent : String = concat!("filevault/", env!("CARGO_PKG_VERSION")).to_string();
});
