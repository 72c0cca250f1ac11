// Progress Sink Port

use crate::domain::JobId;

/// Receives status updates for running jobs (status bar, progress view, log)
///
/// Called from worker threads.
pub trait ProgressSink: Send + Sync {
    fn begin(&self, job_id: JobId, name: &str);

    fn report(&self, job_id: JobId, name: &str, message: &str);

    fn finish(&self, job_id: JobId, name: &str, succeeded: bool);
}
