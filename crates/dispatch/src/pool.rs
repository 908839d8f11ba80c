//! Worker pool executing dispatch requests on single-threaded engines.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::thread::JoinHandle;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::{CodeSnapshot, DispatchError, DispatchRequest, DispatchResponse, ScriptEngine};

/// Pool sizing and the default per-request deadline.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub num_workers: usize,
    pub queue_len: usize,
    pub default_timeout: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            num_workers: 4,
            queue_len: 64,
            default_timeout: Duration::from_millis(500),
        }
    }
}

/// Batch dispatch seam consumed by the bidding and auction reactors.
#[async_trait]
pub trait CodeDispatcher: Send + Sync {
    /// Executes a batch; resolves once every request finished or timed out.
    /// Per-request failures are inline, a batch-level failure (queue full,
    /// unknown version) is the outer error. Response order matches request
    /// order; callers must not assume execution order.
    async fn batch_execute(
        &self,
        requests: Vec<DispatchRequest>,
        timeout: Duration,
    ) -> Result<Vec<Result<DispatchResponse, DispatchError>>, DispatchError>;
}

struct Job {
    request: DispatchRequest,
    snapshot: Arc<CodeSnapshot>,
    interrupted: Arc<AtomicBool>,
    reply: oneshot::Sender<Result<DispatchResponse, DispatchError>>,
}

/// Pool of `num_workers` engine threads fed from one bounded queue.
pub struct DispatcherPool {
    snapshots: RwLock<HashMap<u64, Arc<CodeSnapshot>>>,
    queue: mpsc::Sender<Job>,
    workers: Vec<JoinHandle<()>>,
    default_timeout: Duration,
}

impl DispatcherPool {
    /// Starts the worker threads. `engine_factory` runs once per worker on
    /// that worker's own thread, so the engine type itself does not need to
    /// be `Send`.
    pub fn new<E, F>(config: DispatcherConfig, engine_factory: F) -> Self
    where
        E: ScriptEngine,
        F: Fn() -> E + Send + Sync + 'static,
    {
        let (tx, rx) = mpsc::channel::<Job>(config.queue_len.max(1));
        let rx = Arc::new(std::sync::Mutex::new(rx));
        let factory = Arc::new(engine_factory);

        let workers = (0..config.num_workers.max(1))
            .map(|worker_id| {
                let rx = Arc::clone(&rx);
                let factory = Arc::clone(&factory);
                std::thread::Builder::new()
                    .name(format!("dispatch-worker-{worker_id}"))
                    .spawn(move || {
                        let mut engine = factory();
                        loop {
                            // Hold the receiver lock only while waiting for
                            // the next job, not while executing it.
                            let job = rx.lock().expect("dispatch queue poisoned").blocking_recv();
                            let Some(job) = job else {
                                return;
                            };
                            run_job(&mut engine, job);
                        }
                    })
                    .expect("failed to spawn dispatch worker")
            })
            .collect();

        Self {
            snapshots: RwLock::new(HashMap::new()),
            queue: tx,
            workers,
            default_timeout: config.default_timeout,
        }
    }

    /// Atomically installs wrapped code under `version`. Batches already
    /// submitted keep executing against the snapshot they captured.
    pub fn load_sync(&self, version: u64, blob: impl Into<String>) {
        let snapshot = Arc::new(CodeSnapshot { version, blob: Arc::from(blob.into()) });
        self.snapshots
            .write()
            .expect("snapshot map poisoned")
            .insert(version, snapshot);
        debug!(message = "installed code snapshot", version);
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Stops accepting work and joins the workers. Queued jobs still drain.
    pub fn stop(mut self) {
        drop(self.queue);
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                warn!(message = "dispatch worker panicked during shutdown");
            }
        }
    }

    fn snapshot(&self, version: u64) -> Result<Arc<CodeSnapshot>, DispatchError> {
        self.snapshots
            .read()
            .expect("snapshot map poisoned")
            .get(&version)
            .cloned()
            .ok_or(DispatchError::VersionNotFound(version))
    }
}

fn run_job<E: ScriptEngine>(engine: &mut E, job: Job) {
    // A request that timed out on the caller side is dropped unexecuted.
    if job.interrupted.load(Ordering::Acquire) {
        return;
    }
    let result = engine
        .invoke(
            &job.snapshot,
            &job.request.handler_name,
            &job.request.input,
            &job.interrupted,
        )
        .map(|resp| DispatchResponse { id: job.request.id.clone(), resp })
        .map_err(DispatchError::Engine);
    // The receiver may be gone after a timeout; nothing to do then.
    let _ = job.reply.send(result);
}

#[async_trait]
impl CodeDispatcher for DispatcherPool {
    async fn batch_execute(
        &self,
        requests: Vec<DispatchRequest>,
        timeout: Duration,
    ) -> Result<Vec<Result<DispatchResponse, DispatchError>>, DispatchError> {
        // Resolve snapshots up front so the whole batch runs one version even
        // if load_sync lands mid-batch.
        let mut pending = Vec::with_capacity(requests.len());
        for request in requests {
            let snapshot = self.snapshot(request.version)?;
            let (reply_tx, reply_rx) = oneshot::channel();
            let interrupted = Arc::new(AtomicBool::new(false));
            let job = Job {
                request,
                snapshot,
                interrupted: Arc::clone(&interrupted),
                reply: reply_tx,
            };
            self.queue.try_send(job).map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => DispatchError::QueueFull,
                mpsc::error::TrySendError::Closed(_) => DispatchError::Stopped,
            })?;
            pending.push((reply_rx, interrupted));
        }

        // One deadline for the batch; each request reports Timeout
        // individually so a single stuck invocation cannot hide the rest.
        let deadline = tokio::time::Instant::now() + timeout;
        let mut results = Vec::with_capacity(pending.len());
        for (reply_rx, interrupted) in pending {
            let result = match tokio::time::timeout_at(deadline, reply_rx).await {
                Ok(Ok(result)) => result,
                Ok(Err(_)) => Err(DispatchError::Stopped),
                Err(_) => {
                    // Ask the engine to stop; cooperative, best-effort.
                    interrupted.store(true, Ordering::Release);
                    Err(DispatchError::Timeout)
                }
            };
            results.push(result);
        }
        Ok(results)
    }
}
