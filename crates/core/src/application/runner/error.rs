// Job errors

use thiserror::Error;

/// Error type job bodies return; any `std::error::Error` converts with `?`
pub type BodyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Why a job could not get a worker
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulingError {
    #[error("job queue is full ({capacity} jobs admitted)")]
    QueueFull { capacity: usize },

    #[error("job runner is shut down")]
    ShutDown,

    #[error("job was dropped before it completed")]
    Abandoned,
}

/// Failure of one job
#[derive(Error, Debug)]
pub enum JobError {
    /// The body returned an error
    #[error(transparent)]
    Body(BodyError),

    /// The body panicked
    #[error("job panicked: {0}")]
    Panicked(String),

    /// The body never ran to completion
    #[error("job could not be scheduled: {0}")]
    Scheduling(#[from] SchedulingError),
}

impl JobError {
    pub fn body(error: impl Into<BodyError>) -> Self {
        JobError::Body(error.into())
    }

    pub fn is_scheduling(&self) -> bool {
        matches!(self, JobError::Scheduling(_))
    }

    /// Downcast the body error
    pub fn body_error<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            JobError::Body(e) => e.downcast_ref::<E>(),
            _ => None,
        }
    }
}
