// Session Registry - process-wide holder of the remote session

use crate::error::{AppError, Result};
use crate::port::Session;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use tracing::info;

/// Holds the single remote-session handle job bodies use
///
/// The registry only hands out clones of the `Arc`; it does not serialize
/// calls on the session.
#[derive(Default)]
pub struct SessionRegistry {
    session: RwLock<Option<Arc<dyn Session>>>,
}

static GLOBAL: OnceLock<SessionRegistry> = OnceLock::new();

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry
    pub fn global() -> &'static SessionRegistry {
        GLOBAL.get_or_init(SessionRegistry::new)
    }

    /// Install the session, replacing any previous one
    pub fn set(&self, session: Arc<dyn Session>) {
        let mut slot = self.session.write().unwrap_or_else(PoisonError::into_inner);
        if slot.replace(session).is_some() {
            info!("Session replaced");
        } else {
            info!("Session registered");
        }
    }

    pub fn clear(&self) {
        let mut slot = self.session.write().unwrap_or_else(PoisonError::into_inner);
        if slot.take().is_some() {
            info!("Session cleared");
        }
    }

    /// # Errors
    /// - AppError::NoSession if no session is registered
    pub fn session(&self) -> Result<Arc<dyn Session>> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(AppError::NoSession)
    }
}
