// UI Dispatch Port
// The only way work reaches the interactive thread

use thiserror::Error;

/// Callback to run on the interactive thread
pub type UiCallback = Box<dyn FnOnce() + Send + 'static>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Interactive thread is no longer accepting callbacks")]
    Closed,
}

/// "Run this callback on the interactive thread"
///
/// Implementations:
/// - EventLoopHandle (infra-ui): dedicated OS thread draining a channel
/// - QueueDispatcher (mocks): callbacks run when the test pumps them
pub trait UiDispatcher: Send + Sync {
    /// Queue a callback. Never runs it inline and never blocks.
    ///
    /// # Errors
    /// - DispatchError::Closed if the interactive thread has exited; the
    ///   callback is dropped without running
    fn dispatch(&self, callback: UiCallback) -> Result<(), DispatchError>;

    /// True when called from the interactive thread
    fn is_ui_thread(&self) -> bool;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::thread::{self, ThreadId};

    /// Dispatcher whose "interactive thread" is whichever thread calls `pump`
    #[derive(Default)]
    pub struct QueueDispatcher {
        queue: Mutex<VecDeque<UiCallback>>,
        pump_thread: Mutex<Option<ThreadId>>,
        closed: Mutex<bool>,
    }

    impl QueueDispatcher {
        pub fn new() -> Self {
            Self::default()
        }

        /// Run every queued callback on the current thread, returning how many ran.
        /// Callbacks queued while pumping are run too.
        pub fn pump(&self) -> usize {
            *self.pump_thread.lock().unwrap() = Some(thread::current().id());
            let mut count = 0;
            loop {
                let next = self.queue.lock().unwrap().pop_front();
                match next {
                    Some(callback) => {
                        callback();
                        count += 1;
                    }
                    None => break,
                }
            }
            *self.pump_thread.lock().unwrap() = None;
            count
        }

        pub fn pending(&self) -> usize {
            self.queue.lock().unwrap().len()
        }

        /// Refuse further callbacks and drop the queued ones
        pub fn close(&self) {
            *self.closed.lock().unwrap() = true;
            self.queue.lock().unwrap().clear();
        }
    }

    impl UiDispatcher for QueueDispatcher {
        fn dispatch(&self, callback: UiCallback) -> Result<(), DispatchError> {
            if *self.closed.lock().unwrap() {
                return Err(DispatchError::Closed);
            }
            self.queue.lock().unwrap().push_back(callback);
            Ok(())
        }

        fn is_ui_thread(&self) -> bool {
            *self.pump_thread.lock().unwrap() == Some(thread::current().id())
        }
    }
}
