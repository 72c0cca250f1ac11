// Domain Layer - Pure job lifecycle and request model

pub mod error;
pub mod job;
pub mod modification;

// Re-exports
pub use error::DomainError;
pub use job::{JobId, JobSnapshot, JobState};
pub use modification::{ModificationRequest, ObjectId};
