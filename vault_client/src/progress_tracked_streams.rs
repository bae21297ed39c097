use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Stream;
use more_asserts::debug_assert_le;
use progress_tracking::ProgressCallback;

/// Reports `(loaded, total)` for a body stream, only ever moving forward.  When a stream is
/// recreated over the same data, bytes below the previous high-water mark are not reported again.
#[derive(Clone)]
pub struct StreamProgressReporter {
    total: u64,
    bytes_reported: Arc<AtomicU64>,
    progress_callback: Option<ProgressCallback>,
}

impl StreamProgressReporter {
    pub fn new(total: u64) -> Self {
        Self {
            total,
            bytes_reported: Arc::new(AtomicU64::new(0)),
            progress_callback: None,
        }
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Reports progress only if `new_completed` exceeds the previous high-water mark.
    pub fn report_progress(&self, new_completed: u64) {
        let old_completed = self.bytes_reported.fetch_max(new_completed, Ordering::Relaxed);

        if old_completed >= new_completed {
            return;
        }

        if let Some(cb) = self.progress_callback.as_ref() {
            cb(new_completed, self.total.max(new_completed));
        }
    }

    pub fn bytes_reported(&self) -> u64 {
        self.bytes_reported.load(Ordering::Relaxed)
    }
}

/// Yields `data` in blocks of at most `block_size` bytes.
///
/// A block counts as sent once the connection asks for the next one, so progress trails the
/// stream by one block; the last block is reported when the stream ends.
pub struct UploadProgressStream {
    data: Bytes,
    block_size: usize,
    bytes_sent: usize,
    reporter: StreamProgressReporter,
}

impl Stream for UploadProgressStream {
    type Item = std::result::Result<Bytes, std::io::Error>;

    fn poll_next(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        debug_assert_le!(self.bytes_sent, self.data.len());

        if self.bytes_sent != 0 {
            self.reporter.report_progress(self.bytes_sent as u64);
        }

        if self.bytes_sent == self.data.len() {
            return Poll::Ready(None);
        }

        let slice_start = self.bytes_sent;
        let slice_end = (self.bytes_sent + self.block_size).min(self.data.len());

        self.bytes_sent = slice_end;

        Poll::Ready(Some(Ok(self.data.slice(slice_start..slice_end))))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.data.len() - self.bytes_sent).div_ceil(self.block_size);
        (remaining, Some(remaining))
    }
}

impl UploadProgressStream {
    pub fn new(data: impl Into<Bytes>, block_size: usize) -> Self {
        let data = data.into();
        let total = data.len() as u64;
        Self::wrap_bytes_as_stream(data, block_size, StreamProgressReporter::new(total))
    }

    /// Wraps `data` as a stream reporting through `reporter`.  A zero `block_size` sends
    /// everything as one block.
    pub fn wrap_bytes_as_stream(data: impl Into<Bytes>, block_size: usize, reporter: StreamProgressReporter) -> Self {
        let data = data.into();
        let block_size = if block_size == 0 { data.len().max(1) } else { block_size };
        Self {
            data,
            block_size,
            bytes_sent: 0,
            reporter,
        }
    }
}
