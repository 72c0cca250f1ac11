// Job Domain Model

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::error::{DomainError, Result};

/// Job ID (UUID v4, assigned when the job is started)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Job lifecycle state
///
/// `Created -> Running -> (Succeeded | Failed) -> Finalizing -> Finalized`.
/// A job that could not be scheduled goes straight from `Created` to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Created,
    Running,
    Succeeded,
    Failed,
    Finalizing,
    Finalized,
}

impl JobState {
    /// Position along the lifecycle; outcome states share a rank.
    pub fn rank(&self) -> u8 {
        match self {
            JobState::Created => 0,
            JobState::Running => 1,
            JobState::Succeeded | JobState::Failed => 2,
            JobState::Finalizing => 3,
            JobState::Finalized => 4,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Finalized)
    }

    pub fn can_transition_to(&self, to: JobState) -> bool {
        use JobState::*;
        matches!(
            (self, to),
            (Created, Running)
                | (Created, Failed)
                | (Running, Succeeded)
                | (Running, Failed)
                | (Succeeded, Finalizing)
                | (Failed, Finalizing)
                | (Finalizing, Finalized)
        )
    }

    /// Validate and return the next state
    pub fn transition(self, to: JobState) -> Result<JobState> {
        if !self.can_transition_to(to) {
            return Err(DomainError::InvalidStateTransition {
                from: self.to_string(),
                to: to.to_string(),
            });
        }
        Ok(to)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobState::Created => write!(f, "CREATED"),
            JobState::Running => write!(f, "RUNNING"),
            JobState::Succeeded => write!(f, "SUCCEEDED"),
            JobState::Failed => write!(f, "FAILED"),
            JobState::Finalizing => write!(f, "FINALIZING"),
            JobState::Finalized => write!(f, "FINALIZED"),
        }
    }
}

/// Point-in-time view of a job, as published to its handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub state: JobState,
    /// Set once the body outcome is known
    pub succeeded: Option<bool>,
}

impl JobSnapshot {
    pub fn created() -> Self {
        Self {
            state: JobState::Created,
            succeeded: None,
        }
    }

    /// Apply a transition, recording the outcome when entering an outcome state
    pub fn advance(&mut self, to: JobState) -> Result<()> {
        self.state = self.state.transition(to)?;
        match to {
            JobState::Succeeded => self.succeeded = Some(true),
            JobState::Failed => self.succeeded = Some(false),
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_path() {
        let mut snapshot = JobSnapshot::created();
        for to in [
            JobState::Running,
            JobState::Succeeded,
            JobState::Finalizing,
            JobState::Finalized,
        ] {
            snapshot.advance(to).unwrap();
        }
        assert_eq!(snapshot.state, JobState::Finalized);
        assert_eq!(snapshot.succeeded, Some(true));
    }

    #[test]
    fn test_scheduling_failure_skips_running() {
        let mut snapshot = JobSnapshot::created();
        snapshot.advance(JobState::Failed).unwrap();
        assert_eq!(snapshot.succeeded, Some(false));
        assert!(snapshot.advance(JobState::Finalizing).is_ok());
    }

    #[test]
    fn test_finalized_is_terminal() {
        let all = [
            JobState::Created,
            JobState::Running,
            JobState::Succeeded,
            JobState::Failed,
            JobState::Finalizing,
            JobState::Finalized,
        ];
        for to in all {
            assert!(!JobState::Finalized.can_transition_to(to));
        }
        assert!(JobState::Finalized.is_terminal());
    }

    #[test]
    fn test_cannot_start_twice() {
        let err = JobState::Running.transition(JobState::Running).unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidStateTransition {
                from: "RUNNING".to_string(),
                to: "RUNNING".to_string(),
            }
        );
    }

    #[test]
    fn test_finalize_requires_outcome() {
        assert!(JobState::Running.transition(JobState::Finalizing).is_err());
        assert!(JobState::Created.transition(JobState::Finalized).is_err());
    }

    #[test]
    fn test_job_ids_are_unique() {
        assert_ne!(JobId::new(), JobId::new());
    }
}
