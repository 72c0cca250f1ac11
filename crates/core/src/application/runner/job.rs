// Job - single-use unit of background work

use super::error::{BodyError, JobError};
use super::panic_guard::execute_guarded;
use crate::domain::JobId;
use crate::port::{MessageSurface, ProgressSink, UiDispatcher};
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::debug;

pub(crate) type Body<T> = Box<dyn FnOnce(&JobContext) -> Result<T, BodyError> + Send + 'static>;
pub(crate) type ErrorFormatter = Box<dyn FnOnce(&JobError) -> String + Send + 'static>;
pub(crate) type FailureHandler = Box<dyn FnOnce(&JobError) + Send + 'static>;
pub(crate) type Finalizer<T> = Box<dyn FnOnce(JobOutcome<T>) + Send + 'static>;

/// A named unit of background work
///
/// Built right before [`JobRunner::start`](super::JobRunner::start) consumes it:
///
/// ```ignore
/// let page = UiRef::new(&page);
/// runner.start(
///     Job::new(format!("Update access list for {}", name), move |_| {
///         session.modify_object(&md)?;
///         Ok(())
///     })
///     .message_surface(&message_area)
///     .error_prefix("Cannot change access control list")
///     .finalize(move |_| {
///         page.with(|p| p.set_valid(true));
///     }),
/// );
/// ```
pub struct Job<T = ()> {
    pub(crate) name: String,
    pub(crate) user: bool,
    pub(crate) progress: Option<Arc<dyn ProgressSink>>,
    pub(crate) surface: Option<Weak<dyn MessageSurface>>,
    pub(crate) body: Body<T>,
    pub(crate) error_message: Option<ErrorFormatter>,
    pub(crate) failure_handler: Option<FailureHandler>,
    pub(crate) finalize: Option<Finalizer<T>>,
}

impl<T: Send + 'static> Job<T> {
    /// Create a job. The body runs on a worker thread and may block.
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: FnOnce(&JobContext) -> Result<T, BodyError> + Send + 'static,
    {
        Self {
            name: name.into(),
            user: false,
            progress: None,
            surface: None,
            body: Box::new(body),
            error_message: None,
            failure_handler: None,
            finalize: None,
        }
    }

    /// Mark the job as started by the operator; its lifecycle is logged at `info`
    pub fn user(mut self, user: bool) -> Self {
        self.user = user;
        self
    }

    pub fn progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(sink);
        self
    }

    /// Show failures on `surface` for as long as it lives. Only a weak
    /// reference is kept.
    pub fn message_surface<S: MessageSurface + 'static>(mut self, surface: &Arc<S>) -> Self {
        let weak: Weak<dyn MessageSurface> = Arc::downgrade(surface) as Weak<dyn MessageSurface>;
        self.surface = Some(weak);
        self
    }

    pub fn message_surface_weak(mut self, surface: Weak<dyn MessageSurface>) -> Self {
        self.surface = Some(surface);
        self
    }

    /// Failure message `"<prefix>: <error>"`
    pub fn error_prefix(self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.error_message(move |error| format!("{}: {}", prefix, error))
    }

    /// Build the failure message from the triggering error.
    /// Defaults to `"<job name>: <error>"`.
    pub fn error_message<F>(mut self, formatter: F) -> Self
    where
        F: FnOnce(&JobError) -> String + Send + 'static,
    {
        self.error_message = Some(Box::new(formatter));
        self
    }

    /// Runs off the interactive thread after a failure, before finalize is scheduled
    pub fn on_failure<F>(mut self, handler: F) -> Self
    where
        F: FnOnce(&JobError) + Send + 'static,
    {
        self.failure_handler = Some(Box::new(handler));
        self
    }

    /// Runs on the interactive thread exactly once, whatever the outcome
    pub fn finalize<F>(mut self, finalize: F) -> Self
    where
        F: FnOnce(JobOutcome<T>) + Send + 'static,
    {
        self.finalize = Some(Box::new(finalize));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<T> fmt::Debug for Job<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("name", &self.name)
            .field("user", &self.user)
            .field("has_surface", &self.surface.is_some())
            .field("has_progress", &self.progress.is_some())
            .finish_non_exhaustive()
    }
}

/// What a running body can see of its job
pub struct JobContext {
    pub(crate) id: JobId,
    pub(crate) name: Arc<str>,
    pub(crate) progress: Option<Arc<dyn ProgressSink>>,
    pub(crate) dispatcher: Arc<dyn UiDispatcher>,
}

impl JobContext {
    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Forward a status line to the job's progress sink, if any
    pub fn report(&self, message: &str) {
        if let Some(progress) = &self.progress {
            execute_guarded("Job progress", || progress.report(self.id, &self.name, message));
        }
    }

    /// Queue `f` on the interactive thread without waiting for it.
    /// Returns false if the interactive thread is gone.
    pub fn run_in_ui_thread<F>(&self, f: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        match self.dispatcher.dispatch(Box::new(f)) {
            Ok(()) => true,
            Err(e) => {
                debug!(job_id = %self.id, job = %self.name, error = %e, "UI callback dropped");
                false
            }
        }
    }
}

/// Failed outcome: the triggering error plus the message built from it
#[derive(Debug)]
pub struct JobFailure {
    pub error: JobError,
    pub message: String,
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Result of a job as seen by finalize
#[derive(Debug)]
pub enum JobOutcome<T> {
    Succeeded(T),
    Failed(JobFailure),
}

impl<T> JobOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Succeeded(_))
    }

    pub fn failure(&self) -> Option<&JobFailure> {
        match self {
            JobOutcome::Succeeded(_) => None,
            JobOutcome::Failed(failure) => Some(failure),
        }
    }

    pub fn into_result(self) -> Result<T, JobFailure> {
        match self {
            JobOutcome::Succeeded(value) => Ok(value),
            JobOutcome::Failed(failure) => Err(failure),
        }
    }
}
