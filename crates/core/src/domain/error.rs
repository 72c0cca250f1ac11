// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid job state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Modification request for object {0} carries no changes")]
    EmptyModification(u32),
}

pub type Result<T> = std::result::Result<T, DomainError>;
