// Session Port
// Remote session to the management server (owned by the process-wide registry)

use crate::domain::ModificationRequest;
use thiserror::Error;

/// Session errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Request rejected by server (code {code}): {message}")]
    Rejected { code: u32, message: String },

    #[error("{0}")]
    Communication(String),
}

/// Remote session
///
/// Calls block the calling thread until the server answers. Job bodies call
/// it from worker threads; implementations synchronize themselves.
pub trait Session: Send + Sync {
    /// Apply a field-level diff to a managed object
    ///
    /// # Errors
    /// - SessionError::Rejected if the server refused the change
    /// - SessionError::Communication if the server could not be reached
    fn modify_object(&self, request: &ModificationRequest) -> Result<(), SessionError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Mock session behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Always succeed
        Success,
        /// Fail with a communication error
        Fail(String),
        /// Server-side rejection
        Reject { code: u32, message: String },
        /// Panic with message (for panic isolation testing)
        Panic(String),
        /// Sleep, then succeed
        Delay(Duration),
    }

    /// Mock Session for testing
    pub struct MockSession {
        behavior: Mutex<MockBehavior>,
        requests: Mutex<Vec<ModificationRequest>>,
    }

    impl MockSession {
        pub fn new(behavior: MockBehavior) -> Self {
            Self {
                behavior: Mutex::new(behavior),
                requests: Mutex::new(Vec::new()),
            }
        }
        pub fn new_success() -> Self {
            Self::new(MockBehavior::Success)
        }
        pub fn new_fail(message: impl Into<String>) -> Self {
            Self::new(MockBehavior::Fail(message.into()))
        }
        pub fn new_panic_inducing(message: impl Into<String>) -> Self {
            Self::new(MockBehavior::Panic(message.into()))
        }
        pub fn set_behavior(&self, behavior: MockBehavior) {
            *self.behavior.lock().unwrap() = behavior;
        }
        pub fn call_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
        pub fn requests(&self) -> Vec<ModificationRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Session for MockSession {
        fn modify_object(&self, request: &ModificationRequest) -> Result<(), SessionError> {
            self.requests.lock().unwrap().push(request.clone());

            let behavior = self.behavior.lock().unwrap().clone();

            match behavior {
                MockBehavior::Success => Ok(()),
                MockBehavior::Fail(msg) => Err(SessionError::Communication(msg)),
                MockBehavior::Reject { code, message } => {
                    Err(SessionError::Rejected { code, message })
                }
                MockBehavior::Panic(msg) => {
                    panic!("{}", msg); // Actually panic for panic isolation testing
                }
                MockBehavior::Delay(duration) => {
                    std::thread::sleep(duration);
                    Ok(())
                }
            }
        }
    }
}
