use std::time::Duration;

crate::config_group!({

    /// Maximum number of uploads transferring at once.  Sessions beyond this stay queued
    /// until a running upload finishes.  0 disables the limit.
    ///
    /// The default value is 0.
    ///
    /// Use the environment variable `FILEVAULT_UPLOAD_MAX_CONCURRENT_UPLOADS` to set this value.
    ref max_concurrent_uploads : usize = 0;

    /// The upload body is streamed in blocks of this many bytes; one progress tick
    /// is reported per block handed to the connection.
    ///
    /// The default value is 65536.
    ///
    /// Use the environment variable `FILEVAULT_UPLOAD_STREAM_BLOCK_SIZE` to set this value.
    ref stream_block_size : usize = 64 * 1024;

    /// When set, each session also reports a speed smoothed with an exponentially
    /// weighted moving average of this half-life, next to the instantaneous speed.
    ///
    /// The default value is None.
    ///
    /// Use the environment variable `FILEVAULT_UPLOAD_SPEED_SMOOTHING_HALF_LIFE` to set this value.
    ref speed_smoothing_half_life : Option<Duration> = None;
});
