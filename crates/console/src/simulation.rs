//! Simulated server session and property pages

use panelkit_core::application::{Disposable, PropertyPage};
use panelkit_core::domain::ModificationRequest;
use panelkit_core::port::{Session, SessionError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tracing::info;

/// Session answering after a fixed latency; objects listed in `unreachable`
/// fail with a communication error
pub struct SimulatedSession {
    latency: Duration,
    unreachable: Vec<u32>,
    failure: String,
    applied: Mutex<Vec<ModificationRequest>>,
}

impl SimulatedSession {
    pub fn new(latency: Duration, unreachable: Vec<u32>, failure: impl Into<String>) -> Self {
        Self {
            latency,
            unreachable,
            failure: failure.into(),
            applied: Mutex::new(Vec::new()),
        }
    }

    pub fn applied(&self) -> usize {
        self.applied.lock().map(|a| a.len()).unwrap_or(0)
    }
}

impl Session for SimulatedSession {
    fn modify_object(&self, request: &ModificationRequest) -> Result<(), SessionError> {
        std::thread::sleep(self.latency);
        if self.unreachable.contains(&request.object_id()) {
            return Err(SessionError::Communication(self.failure.clone()));
        }
        info!(
            object_id = request.object_id(),
            fields = request.len(),
            "Server applied modification"
        );
        if let Ok(mut applied) = self.applied.lock() {
            applied.push(request.clone());
        }
        Ok(())
    }
}

/// Property page stand-in: tracks whether its controls are enabled
pub struct SimulatedPage {
    title: String,
    valid: AtomicBool,
    disposed: AtomicBool,
}

impl SimulatedPage {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            valid: AtomicBool::new(true),
            disposed: AtomicBool::new(false),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn is_valid(&self) -> bool {
        self.valid.load(Ordering::SeqCst)
    }

    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
        info!(page = %self.title, "Page closed");
    }
}

impl Disposable for SimulatedPage {
    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

impl PropertyPage for SimulatedPage {
    fn set_valid(&self, valid: bool) {
        self.valid.store(valid, Ordering::SeqCst);
        info!(page = %self.title, valid, "Page state changed");
    }
}
