// Property Page glue - the "apply changes to object" job every page submits

use crate::application::runner::{Job, JobHandle, JobRunner};
use crate::application::ui_ref::{Disposable, UiRef};
use crate::domain::ModificationRequest;
use crate::port::{MessageSurface, Session};
use std::sync::{Arc, Weak};
use tracing::debug;

/// A page editing some attributes of one managed object
///
/// Called on the interactive thread only.
pub trait PropertyPage: Disposable + Send + Sync {
    /// Enable or disable the page's controls (greyed out while a change is in flight)
    fn set_valid(&self, valid: bool);
}

/// How the dialog submitted the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMode {
    /// "Apply": the dialog stays open; the page is disabled until the server answers
    Apply,
    /// "OK": the dialog is closing; the page is left alone
    Ok,
}

/// Submission of one page's changes as a background job
pub struct ObjectUpdate {
    request: ModificationRequest,
    mode: ApplyMode,
    name: Option<String>,
    surface: Option<Weak<dyn MessageSurface>>,
}

impl ObjectUpdate {
    pub fn new(request: ModificationRequest, mode: ApplyMode) -> Self {
        Self {
            request,
            mode,
            name: None,
            surface: None,
        }
    }

    /// Job name shown in progress reporting; defaults to "Update object <id>"
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn message_surface<S: MessageSurface + 'static>(mut self, surface: &Arc<S>) -> Self {
        self.surface = Some(Arc::downgrade(surface) as Weak<dyn MessageSurface>);
        self
    }

    /// Start the job. Returns `None` without contacting the server when the
    /// request carries no changes.
    pub fn submit<P: PropertyPage + 'static>(
        self,
        runner: &JobRunner,
        session: Arc<dyn Session>,
        page: &Arc<P>,
    ) -> Option<JobHandle> {
        let ObjectUpdate {
            request,
            mode,
            name,
            surface,
        } = self;
        let object_id = request.object_id();
        if let Err(e) = request.validate() {
            debug!(object_id, error = %e, "Nothing to submit");
            return None;
        }

        if mode == ApplyMode::Apply {
            page.set_valid(false);
        }
        let page = UiRef::new(page);
        let name = name.unwrap_or_else(|| format!("Update object {}", object_id));

        let mut job = Job::new(name, move |ctx| {
            ctx.report(&format!("Sending {} changed field(s)", request.len()));
            session.modify_object(&request)?;
            Ok(())
        })
        .user(true)
        .error_prefix(format!("Cannot modify object {}", object_id))
        .finalize(move |_| {
            if mode == ApplyMode::Apply {
                page.with_live(|p| p.set_valid(true));
            }
        });
        if let Some(surface) = surface {
            job = job.message_surface_weak(surface);
        }

        Some(runner.start(job))
    }
}
