// Job Runner - bodies on a bounded worker pool, finalize on the interactive thread

mod completion;
pub mod config;
pub mod constants;
mod error;
mod handle;
mod job;
mod panic_guard;

pub use config::RunnerConfig;
pub use error::{BodyError, JobError, SchedulingError};
pub use handle::JobHandle;
pub use job::{Job, JobContext, JobFailure, JobOutcome};
pub use panic_guard::{execute_guarded, panic_message, PanicGuardResult};

use crate::domain::JobId;
use crate::error::{AppError, Result};
use crate::port::UiDispatcher;
use completion::{Completion, FinalizeGuard, PendingJob};
use handle::Lifecycle;
use job::Body;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{watch, OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tracing::{debug, info, warn};

/// Runs job bodies off the interactive thread and reports back onto it
///
/// Cheap to clone; clones share the same pool. Two semaphores bound the pool:
/// `workers` limits bodies running at once, `admission` limits jobs accepted
/// (running plus waiting). A job that cannot be admitted fails immediately with
/// [`SchedulingError::QueueFull`] and is still finalized.
#[derive(Clone)]
pub struct JobRunner {
    inner: Arc<Inner>,
}

struct Inner {
    config: RunnerConfig,
    runtime: Handle,
    dispatcher: Arc<dyn UiDispatcher>,
    workers: Arc<Semaphore>,
    admission: Arc<Semaphore>,
    /// Admitted jobs whose finalize is not yet queued on the interactive thread
    pending: Arc<watch::Sender<usize>>,
}

impl JobRunner {
    /// Create a runner on the current tokio runtime
    pub fn new(config: RunnerConfig, dispatcher: Arc<dyn UiDispatcher>) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| AppError::Runtime(e.to_string()))?;
        Self::with_runtime(config, dispatcher, runtime)
    }

    /// Create a runner spawning onto `runtime`; `start` may then be called
    /// from threads outside the runtime, such as the interactive thread
    pub fn with_runtime(
        config: RunnerConfig,
        dispatcher: Arc<dyn UiDispatcher>,
        runtime: Handle,
    ) -> Result<Self> {
        config.validate()?;
        info!(
            max_workers = config.max_workers,
            queue_capacity = config.queue_capacity,
            "Job runner created"
        );
        let inner = Inner {
            workers: Arc::new(Semaphore::new(config.max_workers)),
            admission: Arc::new(Semaphore::new(config.admission_capacity())),
            pending: Arc::new(watch::channel(0).0),
            config,
            runtime,
            dispatcher,
        };
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.inner.config
    }

    /// Start a job. Returns at once; never blocks the caller.
    ///
    /// The body runs on a worker thread. Finalize always runs exactly once on
    /// the interactive thread, including when the job cannot be scheduled.
    pub fn start<T: Send + 'static>(&self, job: Job<T>) -> JobHandle {
        let id = JobId::new();
        let name: Arc<str> = Arc::from(job.name());
        let (lifecycle, handle) = Lifecycle::new(id, Arc::clone(&name));
        let (body, completion) =
            Completion::from_job(job, lifecycle, Arc::clone(&self.inner.dispatcher));

        let admission = match Arc::clone(&self.inner.admission).try_acquire_owned() {
            Ok(permit) => permit,
            Err(TryAcquireError::NoPermits) => {
                let capacity = self.inner.config.admission_capacity();
                warn!(job_id = %id, job = %name, capacity, "Job queue full, rejecting job");
                completion.complete(Err(SchedulingError::QueueFull { capacity }.into()));
                return handle;
            }
            Err(TryAcquireError::Closed) => {
                warn!(job_id = %id, job = %name, "Job runner shut down, rejecting job");
                completion.complete(Err(SchedulingError::ShutDown.into()));
                return handle;
            }
        };

        debug!(job_id = %id, job = %name, "Job queued");
        let guard = FinalizeGuard::new(completion, PendingJob::new(&self.inner.pending));
        let workers = Arc::clone(&self.inner.workers);
        self.inner
            .runtime
            .spawn(run_job(body, guard, workers, admission));
        handle
    }

    /// Jobs admitted whose outcome is not yet known
    pub fn active_jobs(&self) -> usize {
        self.inner.config.admission_capacity() - self.inner.admission.available_permits()
    }

    /// Stop accepting jobs. Jobs still waiting for a worker fail with
    /// [`SchedulingError::ShutDown`]; running bodies complete normally.
    pub fn shutdown(&self) {
        if self.is_shut_down() {
            return;
        }
        info!(active_jobs = self.active_jobs(), "Job runner shutting down");
        self.inner.admission.close();
        self.inner.workers.close();
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.admission.is_closed()
    }

    /// Shut down, then wait until every admitted job has its finalize queued
    /// on the interactive thread.
    ///
    /// Call this before stopping the interactive thread: a finalize dispatched
    /// after the loop has quit is lost.
    pub async fn drain(&self) {
        self.shutdown();
        let mut pending = self.inner.pending.subscribe();
        // the sender lives in `inner`, so this cannot fail
        let _ = pending.wait_for(|count| *count == 0).await;
        debug!("Job runner drained");
    }
}

async fn run_job<T: Send + 'static>(
    body: Body<T>,
    guard: FinalizeGuard<T>,
    workers: Arc<Semaphore>,
    admission: OwnedSemaphorePermit,
) {
    let Ok(permit) = workers.acquire_owned().await else {
        drop(admission);
        guard.complete(Err(SchedulingError::ShutDown.into()));
        return;
    };
    let Some(completion) = guard.completion() else {
        return;
    };

    completion.mark_running();
    let ctx = JobContext {
        id: completion.lifecycle().id(),
        name: Arc::clone(completion.lifecycle().name()),
        progress: completion.progress().cloned(),
        dispatcher: Arc::clone(completion.dispatcher()),
    };

    // Panics in the body are caught by the JoinHandle
    let joined = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        body(&ctx)
    })
    .await;

    let result = match joined {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(JobError::Body(e)),
        Err(join_err) if join_err.is_panic() => Err(JobError::Panicked(panic_message(
            join_err.into_panic().as_ref(),
        ))),
        Err(_) => Err(SchedulingError::Abandoned.into()),
    };

    drop(admission);
    guard.complete(result);
}
