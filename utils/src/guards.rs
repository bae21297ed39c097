use std::env;
use std::ffi::{OsStr, OsString};

/// Sets or clears one environment variable for the lifetime of the guard, then puts back
/// whatever was there before.
///
/// Tests of env-driven configuration use this; pair it with `serial_test` since the process
/// environment is shared across test threads.
///
/// ```no_run
/// use utils::EnvVarGuard;
///
/// let _cap = EnvVarGuard::set("FILEVAULT_UPLOAD_MAX_CONCURRENT_UPLOADS", "4");
/// let _dest = EnvVarGuard::remove("FILEVAULT_LOG_DEST");
/// ```
pub struct EnvVarGuard {
    key: &'static str,
    saved: Option<OsString>,
}

impl EnvVarGuard {
    pub fn set(key: &'static str, value: impl AsRef<OsStr>) -> Self {
        let saved = env::var_os(key);
        // SAFETY: callers serialise env access across tests.
        unsafe { env::set_var(key, value) };
        Self { key, saved }
    }

    pub fn remove(key: &'static str) -> Self {
        let saved = env::var_os(key);
        // SAFETY: as above.
        unsafe { env::remove_var(key) };
        Self { key, saved }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        // SAFETY: as above.
        match self.saved.take() {
            Some(value) => unsafe { env::set_var(self.key, value) },
            None => unsafe { env::remove_var(self.key) },
        }
    }
}
