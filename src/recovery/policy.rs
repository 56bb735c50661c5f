use std::time::Duration;

use crate::engine::{EngineError, ErrorCategory};

pub const DEFAULT_RESUME_DELAY: Duration = Duration::from_millis(2_000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    None,
    ScheduleResume(Duration),
}

/// Only fatal network errors are retried, once per occurrence, with no
/// backoff and no ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryPolicy {
    resume_delay: Duration,
}

impl RecoveryPolicy {
    pub fn new(resume_delay: Duration) -> Self {
        Self { resume_delay }
    }

    pub fn resume_delay(&self) -> Duration {
        self.resume_delay
    }

    pub fn on_error(&self, error: &EngineError) -> RecoveryAction {
        match (error.fatal, error.category) {
            (true, ErrorCategory::Network) => RecoveryAction::ScheduleResume(self.resume_delay),
            _ => RecoveryAction::None,
        }
    }
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RESUME_DELAY)
    }
}
