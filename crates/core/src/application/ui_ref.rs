// Weak back-reference from a job to UI state it does not own

use std::fmt;
use std::sync::{Arc, Weak};

/// UI state that can be torn down while a job still refers to it
pub trait Disposable {
    fn is_disposed(&self) -> bool {
        false
    }
}

/// Weak reference to a page or widget, checked for liveness on every access
///
/// Finalize steps capture a `UiRef` instead of the page itself, so a page
/// closed while its job was running is simply skipped.
pub struct UiRef<T: ?Sized> {
    inner: Weak<T>,
}

impl<T: ?Sized> UiRef<T> {
    pub fn new(target: &Arc<T>) -> Self {
        Self {
            inner: Arc::downgrade(target),
        }
    }

    /// Run `f` against the target if it is still alive; `None` otherwise
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        self.inner.upgrade().map(|target| f(&target))
    }

    pub fn upgrade(&self) -> Option<Arc<T>> {
        self.inner.upgrade()
    }

    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl<T: ?Sized + Disposable> UiRef<T> {
    /// Like [`UiRef::with`], also skipping targets that are alive but disposed
    pub fn with_live<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let target = self.inner.upgrade()?;
        if target.is_disposed() {
            return None;
        }
        Some(f(&target))
    }
}

impl<T: ?Sized> Clone for UiRef<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<T: ?Sized> fmt::Debug for UiRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiRef")
            .field("alive", &self.is_alive())
            .finish()
    }
}
