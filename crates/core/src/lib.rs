// Panelkit Core - Background job runner, domain model & ports
// NO toolkit or wire-protocol dependencies

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use application::runner::{
    Job, JobContext, JobError, JobFailure, JobHandle, JobOutcome, JobRunner, RunnerConfig,
    SchedulingError,
};
pub use error::{AppError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
