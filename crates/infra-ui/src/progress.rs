// Progress sink backed by tracing (status-bar stand-in)
use panelkit_core::domain::JobId;
use panelkit_core::port::ProgressSink;
use tracing::{info, warn};

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn begin(&self, job_id: JobId, name: &str) {
        info!(job_id = %job_id, job = %name, "Progress: started");
    }

    fn report(&self, job_id: JobId, name: &str, message: &str) {
        info!(job_id = %job_id, job = %name, "Progress: {}", message);
    }

    fn finish(&self, job_id: JobId, name: &str, succeeded: bool) {
        if succeeded {
            info!(job_id = %job_id, job = %name, "Progress: done");
        } else {
            warn!(job_id = %job_id, job = %name, "Progress: failed");
        }
    }
}
