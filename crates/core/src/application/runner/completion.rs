// Outcome reconciliation: error message, failure hook, hand-off to the interactive thread

use super::error::{JobError, SchedulingError};
use super::handle::Lifecycle;
use super::job::{ErrorFormatter, FailureHandler, Finalizer, Job, JobFailure, JobOutcome};
use super::panic_guard::{execute_guarded, PanicGuardResult};
use crate::domain::JobState;
use crate::port::{MessageSurface, ProgressSink, UiDispatcher};
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Everything about a job except its body
pub(crate) struct Completion<T> {
    lifecycle: Lifecycle,
    user: bool,
    progress: Option<Arc<dyn ProgressSink>>,
    surface: Option<Weak<dyn MessageSurface>>,
    error_message: Option<ErrorFormatter>,
    failure_handler: Option<FailureHandler>,
    finalize: Option<Finalizer<T>>,
    dispatcher: Arc<dyn UiDispatcher>,
}

impl<T: Send + 'static> Completion<T> {
    /// Split a job into its body and the state needed to complete it
    pub(crate) fn from_job(
        job: Job<T>,
        lifecycle: Lifecycle,
        dispatcher: Arc<dyn UiDispatcher>,
    ) -> (super::job::Body<T>, Self) {
        let Job {
            name: _,
            user,
            progress,
            surface,
            body,
            error_message,
            failure_handler,
            finalize,
        } = job;
        let completion = Self {
            lifecycle,
            user,
            progress,
            surface,
            error_message,
            failure_handler,
            finalize,
            dispatcher,
        };
        (body, completion)
    }

    pub(crate) fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub(crate) fn progress(&self) -> Option<&Arc<dyn ProgressSink>> {
        self.progress.as_ref()
    }

    pub(crate) fn dispatcher(&self) -> &Arc<dyn UiDispatcher> {
        &self.dispatcher
    }

    /// The body got a worker and is about to run
    pub(crate) fn mark_running(&self) {
        let id = self.lifecycle.id();
        let name = self.lifecycle.name();
        self.lifecycle.advance(JobState::Running);
        if self.user {
            info!(job_id = %id, job = %name, "Job started");
        } else {
            debug!(job_id = %id, job = %name, "Job started");
        }
        if let Some(progress) = &self.progress {
            execute_guarded("Job progress", || progress.begin(id, name));
        }
    }

    /// Record the outcome and schedule finalize on the interactive thread.
    ///
    /// Runs on whichever thread observed the outcome, never on the interactive
    /// thread's behalf: the error message and failure hook are computed here.
    pub(crate) fn complete(self, result: Result<T, JobError>) {
        let Completion {
            lifecycle,
            user,
            progress,
            surface,
            error_message,
            failure_handler,
            finalize,
            dispatcher,
        } = self;
        let id = lifecycle.id();
        let name = Arc::clone(lifecycle.name());
        let ran = lifecycle.state() == JobState::Running;

        let outcome = match result {
            Ok(value) => {
                lifecycle.advance(JobState::Succeeded);
                if user {
                    info!(job_id = %id, job = %name, "Job completed");
                } else {
                    debug!(job_id = %id, job = %name, "Job completed");
                }
                JobOutcome::Succeeded(value)
            }
            Err(error) => {
                lifecycle.advance(JobState::Failed);
                let message = failure_message(&name, error_message, &error);
                warn!(job_id = %id, job = %name, error = %error, "Job failed");
                if let Some(handler) = failure_handler {
                    execute_guarded("Job failure handler", || handler(&error));
                }
                JobOutcome::Failed(JobFailure { error, message })
            }
        };

        if ran {
            if let Some(progress) = &progress {
                let succeeded = outcome.is_success();
                execute_guarded("Job progress", || progress.finish(id, &name, succeeded));
            }
        }

        lifecycle.advance(JobState::Finalizing);
        let callback = Box::new(move || deliver(lifecycle, surface, finalize, outcome));
        if let Err(e) = dispatcher.dispatch(callback) {
            error!(job_id = %id, job = %name, error = %e, "Finalize could not be scheduled");
        }
    }
}

fn failure_message(name: &str, formatter: Option<ErrorFormatter>, error: &JobError) -> String {
    let default = || format!("{}: {}", name, error);
    match formatter {
        Some(formatter) => execute_guarded("Job error formatter", || formatter(error))
            .ok()
            .unwrap_or_else(default),
        None => default(),
    }
}

/// Interactive-thread half: show the error, run finalize, mark finalized
fn deliver<T>(
    lifecycle: Lifecycle,
    surface: Option<Weak<dyn MessageSurface>>,
    finalize: Option<Finalizer<T>>,
    outcome: JobOutcome<T>,
) {
    if let (JobOutcome::Failed(failure), Some(surface)) = (&outcome, &surface) {
        show_error(&lifecycle, surface, &failure.message);
    }
    if let Some(finalize) = finalize {
        if let PanicGuardResult::Panicked(msg) = execute_guarded("Job finalize", || finalize(outcome)) {
            debug!(job_id = %lifecycle.id(), job = %lifecycle.name(), panic_msg = %msg, "Finalize aborted");
        }
    }
    lifecycle.advance(JobState::Finalized);
}

fn show_error(lifecycle: &Lifecycle, surface: &Weak<dyn MessageSurface>, message: &str) {
    match surface.upgrade() {
        Some(surface) if !surface.is_disposed() => {
            execute_guarded("Message surface", || surface.show_error(message));
        }
        _ => {
            warn!(
                job_id = %lifecycle.id(),
                job = %lifecycle.name(),
                message = %message,
                "Message surface is gone, error not shown"
            );
        }
    }
}

/// Completes the job on drop if nobody else did
///
/// Held by the task driving a job, so a task dropped by the runtime (shutdown,
/// cancelled) still reaches finalize with `SchedulingError::Abandoned`.
pub(crate) struct FinalizeGuard<T: Send + 'static> {
    completion: Option<Completion<T>>,
    // dropped after `Drop::drop`, so the count falls only once finalize is dispatched
    _pending: PendingJob,
}

impl<T: Send + 'static> FinalizeGuard<T> {
    pub(crate) fn new(completion: Completion<T>, pending: PendingJob) -> Self {
        Self {
            completion: Some(completion),
            _pending: pending,
        }
    }

    pub(crate) fn completion(&self) -> Option<&Completion<T>> {
        self.completion.as_ref()
    }

    pub(crate) fn complete(mut self, result: Result<T, JobError>) {
        if let Some(completion) = self.completion.take() {
            completion.complete(result);
        }
    }
}

impl<T: Send + 'static> Drop for FinalizeGuard<T> {
    fn drop(&mut self) {
        if let Some(completion) = self.completion.take() {
            completion.complete(Err(SchedulingError::Abandoned.into()));
        }
    }
}

/// One admitted job whose finalize has not been handed to the interactive thread
pub(crate) struct PendingJob {
    counter: Arc<watch::Sender<usize>>,
}

impl PendingJob {
    pub(crate) fn new(counter: &Arc<watch::Sender<usize>>) -> Self {
        counter.send_modify(|pending| *pending += 1);
        Self {
            counter: Arc::clone(counter),
        }
    }
}

impl Drop for PendingJob {
    fn drop(&mut self) {
        self.counter.send_modify(|pending| *pending = pending.saturating_sub(1));
    }
}
