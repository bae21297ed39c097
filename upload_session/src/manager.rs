//! UploadSessionManager - runs uploads and tracks them as sessions

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use futures::FutureExt;
use parking_lot::Mutex;
use progress_tracking::ProgressCallback;
use tokio::runtime::Handle;
use tokio::sync::{Notify, OwnedSemaphorePermit, Semaphore, mpsc};
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use vault_client::{BearerCredentialHelper, RemoteClient, UploadError, UploadTransport};
use vault_config::VaultConfig;
use vault_types::FileRecord;

use crate::errors::SessionError;
use crate::observer::{SessionOutcome, UploadObserver};
use crate::session::{SessionId, UploadFile, UploadSessionSnapshot};
use crate::session_table::SessionTable;

/// Error detail recorded on a session ended by [UploadSessionManager::abort].
pub const ABORTED_DETAIL: &str = "Upload aborted";

enum TransferEvent {
    /// A control operation or submission changed a session; tell the observer.
    StateChanged { id: SessionId },
    /// A queued session got its transfer slot.
    Started { id: SessionId, at: Instant },
    Progress {
        id: SessionId,
        loaded: u64,
        total: u64,
        at: Instant,
    },
    Finished {
        id: SessionId,
        result: Result<FileRecord, UploadError>,
    },
    Aborted { snapshot: UploadSessionSnapshot },
}

enum TransferSlot {
    Unbounded,
    Granted(OwnedSemaphorePermit),
    Wait(Arc<Semaphore>),
}

/// State shared between the manager handles and the event loop.
struct SharedState {
    table: Mutex<SessionTable>,
    transfers: Mutex<HashMap<SessionId, AbortHandle>>,
    // Sessions whose terminal notification has not been delivered yet (and were not dismissed).
    unsettled: AtomicUsize,
    // Set once the event loop has exited; nothing settles after that.
    closed: AtomicBool,
    idle: Notify,
}

impl SharedState {
    fn settle_one(&self) {
        self.unsettled.fetch_sub(1, Ordering::AcqRel);
        self.idle.notify_waiters();
    }
}

/// Marks the shared state closed when the event loop ends, however it ends.
struct EventLoopGuard(Arc<SharedState>);

impl Drop for EventLoopGuard {
    fn drop(&mut self) {
        self.0.closed.store(true, Ordering::Release);
        self.0.idle.notify_waiters();
    }
}

/// All shared state for a manager.
/// Lives behind `Arc<UploadSessionManagerInner>`; do not use this type directly.
#[doc(hidden)]
pub struct UploadSessionManagerInner {
    shared: Arc<SharedState>,
    transport: Arc<dyn UploadTransport>,
    event_tx: mpsc::UnboundedSender<TransferEvent>,
    transfer_slots: Option<Arc<Semaphore>>,
    runtime: Handle,
}

impl Drop for UploadSessionManagerInner {
    fn drop(&mut self) {
        for (_, handle) in self.shared.transfers.lock().drain() {
            handle.abort();
        }
    }
}

/// Tracks the upload of a batch of files, one session per file.
///
/// Every file submitted gets its own transfer task.  Transfer tasks never touch the session
/// table; they post events to a single event loop that applies them in order and then awaits the
/// [UploadObserver].  Control operations (`pause`, `resume`, `dismiss`, `abort`) update the
/// table directly and return immediately.
///
/// Pausing is advisory: the session shows as `Paused` and its counters stop moving, but the bytes
/// keep flowing.  `dismiss` forgets a session without stopping its transfer; `abort` stops it.
///
/// # Cloning
///
/// Cloning is cheap: it only increments a reference count.
/// All clones share the same sessions and event loop.  Dropping the last clone aborts transfers
/// that are still running.
#[derive(Clone)]
pub struct UploadSessionManager {
    inner: Arc<UploadSessionManagerInner>,
}

impl std::ops::Deref for UploadSessionManager {
    type Target = UploadSessionManagerInner;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl UploadSessionManager {
    /// Create a manager uploading through `transport`.  Must be called within a tokio runtime;
    /// transfers and the event loop are spawned onto it.
    pub fn new(
        transport: Arc<dyn UploadTransport>,
        observer: Arc<dyn UploadObserver>,
        config: &VaultConfig,
    ) -> Result<Self, SessionError> {
        let runtime = Handle::try_current().map_err(|_| SessionError::NoRuntime)?;

        let shared = Arc::new(SharedState {
            table: Mutex::new(SessionTable::new(config.upload.speed_smoothing_half_life)),
            transfers: Mutex::new(HashMap::new()),
            unsettled: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            idle: Notify::new(),
        });

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        runtime.spawn(run_event_loop(shared.clone(), observer, event_rx));

        let transfer_slots = match config.upload.max_concurrent_uploads {
            0 => None,
            n => Some(Arc::new(Semaphore::new(n))),
        };

        info!(max_concurrent_uploads = config.upload.max_concurrent_uploads, "upload session manager started");

        Ok(Self {
            inner: Arc::new(UploadSessionManagerInner {
                shared,
                transport,
                event_tx,
                transfer_slots,
                runtime,
            }),
        })
    }

    /// Create a manager uploading to `endpoint` with `token` as the bearer credential.
    pub fn connect(
        endpoint: &str,
        token: String,
        observer: Arc<dyn UploadObserver>,
        config: &VaultConfig,
    ) -> Result<Self, SessionError> {
        let cred_helper = BearerCredentialHelper::new(token, "upload-session");
        let client = RemoteClient::new(endpoint, cred_helper, config)?;
        Self::new(Arc::new(client), observer, config)
    }

    /// Creates one session per file, in order, and starts their transfers.  Sessions start out
    /// `Transferring`, or `Queued` when the concurrency limit is reached.  Never blocks.
    pub fn submit(&self, files: Vec<UploadFile>) -> Vec<SessionId> {
        let now = Instant::now();
        files.into_iter().map(|file| self.submit_one(file, now)).collect()
    }

    fn submit_one(&self, file: UploadFile, now: Instant) -> SessionId {
        let slot = match &self.transfer_slots {
            None => TransferSlot::Unbounded,
            Some(slots) => match slots.clone().try_acquire_owned() {
                Ok(permit) => TransferSlot::Granted(permit),
                Err(_) => TransferSlot::Wait(slots.clone()),
            },
        };
        let starts_now = !matches!(slot, TransferSlot::Wait(_));

        let id = {
            let mut table = self.shared.table.lock();
            let id = table.insert(&file, now);
            if starts_now {
                table.start_transfer(id, now);
            }
            self.shared.unsettled.fetch_add(1, Ordering::AcqRel);
            id
        };
        let _ = self.event_tx.send(TransferEvent::StateChanged { id });

        info!(%id, name = file.name(), size = file.size(), queued = !starts_now, "submitted upload");

        let task = run_transfer(id, file, self.transport.clone(), self.event_tx.clone(), slot);

        // Hold the map while spawning so a fast transfer cannot finish before its handle is stored.
        let mut transfers = self.shared.transfers.lock();
        let handle = self.runtime.spawn(task);
        transfers.insert(id, handle.abort_handle());

        id
    }

    /// Marks a `Transferring` session as `Paused`.  Returns whether the state changed.
    pub fn pause(&self, id: SessionId) -> bool {
        let changed = self.shared.table.lock().pause(id);
        if changed {
            debug!(%id, "paused upload");
            let _ = self.event_tx.send(TransferEvent::StateChanged { id });
        }
        changed
    }

    /// Marks a `Paused` session as `Transferring` again.  Returns whether the state changed.
    pub fn resume(&self, id: SessionId) -> bool {
        let changed = self.shared.table.lock().resume(id);
        if changed {
            debug!(%id, "resumed upload");
            let _ = self.event_tx.send(TransferEvent::StateChanged { id });
        }
        changed
    }

    /// Removes a session in any state.  Its transfer keeps running and its result is dropped.
    pub fn dismiss(&self, id: SessionId) -> bool {
        let removed = self.shared.table.lock().remove(id);
        let Some(session) = removed else {
            return false;
        };

        if !session.state().is_terminal() {
            self.shared.settle_one();
        }
        info!(%id, state = %session.state(), "dismissed upload session");
        true
    }

    /// Stops the transfer of a session that has not finished and marks it `Failed` with
    /// [ABORTED_DETAIL].  Returns false for unknown or finished sessions.
    pub fn abort(&self, id: SessionId) -> bool {
        let snapshot = self.shared.table.lock().fail(id, ABORTED_DETAIL.to_owned());
        let Some(snapshot) = snapshot else {
            return false;
        };

        if let Some(handle) = self.shared.transfers.lock().remove(&id) {
            handle.abort();
        }
        info!(%id, "aborted upload");
        let _ = self.event_tx.send(TransferEvent::Aborted { snapshot });
        true
    }

    /// All sessions, in submission order.
    pub fn sessions(&self) -> Vec<UploadSessionSnapshot> {
        self.shared.table.lock().snapshots()
    }

    pub fn session(&self, id: SessionId) -> Option<UploadSessionSnapshot> {
        self.shared.table.lock().get(id)
    }

    /// Resolves once every session has either been dismissed or finished with its terminal
    /// notification delivered to the observer.  Also returns if the event loop has stopped.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.shared.idle.notified();
            if self.shared.unsettled.load(Ordering::Acquire) == 0 {
                return;
            }
            if self.shared.closed.load(Ordering::Acquire) {
                warn!("upload event loop stopped with sessions still unsettled");
                return;
            }
            notified.await;
        }
    }
}

async fn run_transfer(
    id: SessionId,
    file: UploadFile,
    transport: Arc<dyn UploadTransport>,
    events: mpsc::UnboundedSender<TransferEvent>,
    slot: TransferSlot,
) {
    let _permit = match slot {
        TransferSlot::Unbounded => None,
        TransferSlot::Granted(permit) => Some(permit),
        TransferSlot::Wait(slots) => match slots.acquire_owned().await {
            Ok(permit) => {
                let _ = events.send(TransferEvent::Started { id, at: Instant::now() });
                Some(permit)
            },
            Err(_) => {
                let result = Err(UploadError::Setup("no transfer slot available".to_owned()));
                let _ = events.send(TransferEvent::Finished { id, result });
                return;
            },
        },
    };

    let progress_events = events.clone();
    let progress_callback: ProgressCallback = Arc::new(move |loaded, total| {
        let _ = progress_events.send(TransferEvent::Progress {
            id,
            loaded,
            total,
            at: Instant::now(),
        });
    });

    let result = transport
        .upload_file(file.name(), file.mime_type(), file.data(), progress_callback)
        .await;
    let _ = events.send(TransferEvent::Finished { id, result });
}

async fn run_event_loop(
    shared: Arc<SharedState>,
    observer: Arc<dyn UploadObserver>,
    mut events: mpsc::UnboundedReceiver<TransferEvent>,
) {
    let _guard = EventLoopGuard(shared.clone());
    while let Some(event) = events.recv().await {
        match event {
            TransferEvent::StateChanged { id } => {
                let snapshot = shared.table.lock().get(id);
                match snapshot {
                    Some(s) if !s.state.is_terminal() => notify(id, observer.on_progress((&s).into())).await,
                    Some(_) => {},
                    None => debug!(%id, "state change for dismissed session"),
                }
            },
            TransferEvent::Started { id, at } => {
                let snapshot = shared.table.lock().start_transfer(id, at);
                if let Some(s) = snapshot {
                    debug!(%id, "transfer slot granted");
                    notify(id, observer.on_progress((&s).into())).await;
                }
            },
            TransferEvent::Progress { id, loaded, total, at } => {
                let snapshot = shared.table.lock().record_progress(id, loaded, total, at);
                if let Some(s) = snapshot {
                    notify(id, observer.on_progress((&s).into())).await;
                }
            },
            TransferEvent::Finished { id, result } => {
                shared.transfers.lock().remove(&id);

                let snapshot = match result {
                    Ok(record) => shared.table.lock().complete(id, record),
                    Err(e) => {
                        warn!(%id, error = %e, "upload failed");
                        shared.table.lock().fail(id, e.error_detail())
                    },
                };

                match snapshot.as_ref().and_then(SessionOutcome::from_snapshot) {
                    Some(outcome) => {
                        info!(%id, state = %outcome_state(&outcome), "upload finished");
                        notify(id, observer.on_terminal(outcome)).await;
                        shared.settle_one();
                    },
                    None => debug!(%id, "dropping result for dismissed or finished session"),
                }
            },
            TransferEvent::Aborted { snapshot } => {
                if let Some(outcome) = SessionOutcome::from_snapshot(&snapshot) {
                    notify(snapshot.session_id, observer.on_terminal(outcome)).await;
                }
                shared.settle_one();
            },
        }
    }
    debug!("upload event loop finished");
}

/// Awaits one observer callback.  A panic inside it is logged and the loop carries on.
async fn notify(id: SessionId, callback: impl Future<Output = ()>) {
    if AssertUnwindSafe(callback).catch_unwind().await.is_err() {
        warn!(%id, "upload observer panicked");
    }
}

fn outcome_state(outcome: &SessionOutcome) -> &'static str {
    match outcome {
        SessionOutcome::Completed { .. } => "completed",
        SessionOutcome::Failed { .. } => "failed",
    }
}
