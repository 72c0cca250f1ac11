// Job lifecycle publishing

use crate::domain::{JobId, JobSnapshot, JobState};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::error;

/// Writer side of a job's state, owned by whoever is driving the job
pub(crate) struct Lifecycle {
    id: JobId,
    name: Arc<str>,
    tx: watch::Sender<JobSnapshot>,
}

impl Lifecycle {
    pub(crate) fn new(id: JobId, name: Arc<str>) -> (Self, JobHandle) {
        let (tx, rx) = watch::channel(JobSnapshot::created());
        let handle = JobHandle {
            id,
            name: Arc::clone(&name),
            rx,
        };
        (Self { id, name, tx }, handle)
    }

    pub(crate) fn id(&self) -> JobId {
        self.id
    }

    pub(crate) fn name(&self) -> &Arc<str> {
        &self.name
    }

    pub(crate) fn state(&self) -> JobState {
        self.tx.borrow().state
    }

    /// Publish a transition. Invalid transitions are logged and ignored.
    pub(crate) fn advance(&self, to: JobState) {
        let mut outcome = Ok(());
        self.tx.send_if_modified(|snapshot| {
            outcome = snapshot.advance(to);
            outcome.is_ok()
        });
        if let Err(e) = outcome {
            error!(job_id = %self.id, job = %self.name, error = %e, "Job lifecycle violated");
        }
    }
}

/// Observer of a started job. Dropping it does not affect the job.
#[derive(Clone)]
pub struct JobHandle {
    id: JobId,
    name: Arc<str>,
    rx: watch::Receiver<JobSnapshot>,
}

impl JobHandle {
    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn snapshot(&self) -> JobSnapshot {
        *self.rx.borrow()
    }

    pub fn state(&self) -> JobState {
        self.snapshot().state
    }

    /// Wait until the job reaches `target` or a later lifecycle stage.
    ///
    /// If the job is dropped before getting there (the interactive thread
    /// exited with finalize still queued), returns the last published snapshot.
    pub async fn wait_until(&mut self, target: JobState) -> JobSnapshot {
        let reached = self
            .rx
            .wait_for(|s| s.state.rank() >= target.rank())
            .await
            .map(|snapshot| *snapshot);
        match reached {
            Ok(snapshot) => snapshot,
            Err(_) => *self.rx.borrow(),
        }
    }

    /// Wait until finalize has run on the interactive thread
    pub async fn wait_finalized(&mut self) -> JobSnapshot {
        self.wait_until(JobState::Finalized).await
    }
}

impl std::fmt::Debug for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobHandle")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("snapshot", &self.snapshot())
            .finish()
    }
}
