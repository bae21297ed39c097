crate::config_group!({

    /// The log destination.  If unset or empty, logs go to the console (stderr).
    /// Otherwise logs are appended to the file at this path; if the path is a directory or
    /// ends with a /, a file named from `prefix` and the process id is created inside it.
    ///
    /// The default value is None.
    ///
    /// Use the environment variable `FILEVAULT_LOG_DEST` to set this value.
    ref dest : Option<String> = None;

    /// The format the logs are printed in. If "json", then logs are dumped as json blobs; otherwise they
    /// are treated as text.  By default logging to files is done in json and console logging is done with text.
    ///
    /// The default value is None.
    ///
    /// Use the environment variable `FILEVAULT_LOG_FORMAT` to set this value.
    ref format : Option<String> = None;

    /// The base name for a log file when logging to a directory.
    ///
    /// The default value is "filevault".
    ///
    /// Use the environment variable `FILEVAULT_LOG_PREFIX` to set this value.
    ref prefix : String = "filevault".to_string();
});
