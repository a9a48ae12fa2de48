//! Structured stage logging.

use tracing::{info, warn, Span};

use crate::session::Action;

/// Logs stage action lifecycle events with session and action context.
#[derive(Debug, Clone)]
pub struct StageLogger {
    session_id: String,
    action: Action,
}

impl StageLogger {
    pub fn new(session_id: impl Into<String>, action: Action) -> Self {
        Self {
            session_id: session_id.into(),
            action,
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            session_id = %self.session_id,
            action = %self.action,
            "Stage started: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            session_id = %self.session_id,
            action = %self.action,
            "Stage completed: {}", message
        );
    }

    pub fn log_failure(&self, message: &str) {
        warn!(
            session_id = %self.session_id,
            action = %self.action,
            "Stage failed: {}", message
        );
    }

    /// Result arrived for a session that has since been reset or replaced.
    pub fn log_stale(&self, ticket_epoch: u64, session_epoch: u64) {
        info!(
            session_id = %self.session_id,
            action = %self.action,
            ticket_epoch,
            session_epoch,
            "Discarding stale stage result"
        );
    }

    /// Result derived from a slot that was written while the call ran.
    pub fn log_superseded(&self, slot: &str) {
        info!(
            session_id = %self.session_id,
            action = %self.action,
            slot,
            "Discarding superseded stage result"
        );
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn action(&self) -> Action {
        self.action
    }

    /// Span wrapping the remote part of an action.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "stage",
            session_id = %self.session_id,
            action = %self.action
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_logger_creation() {
        let logger = StageLogger::new("p-1", Action::GenerateVideo);
        assert_eq!(logger.session_id(), "p-1");
        assert_eq!(logger.action(), Action::GenerateVideo);
    }
}
