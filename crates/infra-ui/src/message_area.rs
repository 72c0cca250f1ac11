// Message area shown at the top of a property page
use panelkit_core::port::MessageSurface;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, error};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Information,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub level: MessageLevel,
    pub text: String,
}

/// Message area owned by one page; disposed together with it
pub struct MessageArea {
    owner: String,
    messages: Mutex<Vec<Message>>,
    disposed: AtomicBool,
}

impl MessageArea {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            messages: Mutex::new(Vec::new()),
            disposed: AtomicBool::new(false),
        }
    }

    pub fn add_message(&self, level: MessageLevel, text: impl Into<String>) {
        let text = text.into();
        if self.is_disposed() {
            debug!(owner = %self.owner, text = %text, "Message area disposed, message dropped");
            return;
        }
        if level == MessageLevel::Error {
            error!(owner = %self.owner, "{}", text);
        }
        self.lock().push(Message { level, text });
    }

    pub fn messages(&self) -> Vec<Message> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Page closed: drop stored messages and refuse new ones
    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
        self.clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Message>> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MessageSurface for MessageArea {
    fn show_error(&self, message: &str) {
        self.add_message(MessageLevel::Error, message);
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}
