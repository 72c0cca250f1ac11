// Panic isolation for job callbacks
use super::constants::UNKNOWN_PANIC_MESSAGE;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::error;

/// Result of a panic-guarded execution
#[derive(Debug)]
pub enum PanicGuardResult<T> {
    /// Execution completed successfully
    Success(T),
    /// Execution panicked
    Panicked(String),
}

impl<T> PanicGuardResult<T> {
    pub fn ok(self) -> Option<T> {
        match self {
            PanicGuardResult::Success(value) => Some(value),
            PanicGuardResult::Panicked(_) => None,
        }
    }
}

/// Execute a closure with panic isolation
///
/// Callbacks handed to the runner (error formatters, finalize steps) run on
/// threads the runner does not own; a panic there is logged under `what` and
/// returned as `Panicked` instead of unwinding into the event loop.
///
/// Callers must not touch state the closure left half-updated.
pub fn execute_guarded<F, T>(what: &str, f: F) -> PanicGuardResult<T>
where
    F: FnOnce() -> T,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => PanicGuardResult::Success(result),
        Err(panic_info) => {
            let panic_msg = panic_message(panic_info.as_ref());
            error!(panic_msg = %panic_msg, "{} panicked", what);
            PanicGuardResult::Panicked(panic_msg)
        }
    }
}

/// Extract the message from a panic payload
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        UNKNOWN_PANIC_MESSAGE.to_string()
    }
}
