// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No session registered")]
    NoSession,

    #[error("Session error: {0}")]
    Session(#[from] crate::port::SessionError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] crate::port::DispatchError),

    #[error("Runtime error: {0}")]
    Runtime(String),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
