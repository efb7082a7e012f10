//! Structured run logging utilities.

use tracing::{error, info, warn, Span};

use reelforge_models::ProjectId;

/// Run logger for structured logging with consistent formatting.
///
/// Attaches the project id and operation type to every line so a run's
/// lifecycle can be followed across components.
#[derive(Debug, Clone)]
pub struct RunLogger {
    project_id: String,
    operation: String,
}

impl RunLogger {
    /// Create a new logger for a project and operation.
    pub fn new(project_id: &ProjectId, operation: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            operation: operation.to_string(),
        }
    }

    /// Log the start of an operation.
    pub fn log_start(&self, message: &str) {
        info!(
            project_id = %self.project_id,
            operation = %self.operation,
            "Run started: {}", message
        );
    }

    /// Log a progress update.
    pub fn log_progress(&self, message: &str) {
        info!(
            project_id = %self.project_id,
            operation = %self.operation,
            "Run progress: {}", message
        );
    }

    /// Log a warning.
    pub fn log_warning(&self, message: &str) {
        warn!(
            project_id = %self.project_id,
            operation = %self.operation,
            "Run warning: {}", message
        );
    }

    /// Log an error.
    pub fn log_error(&self, message: &str) {
        error!(
            project_id = %self.project_id,
            operation = %self.operation,
            "Run error: {}", message
        );
    }

    /// Log completion.
    pub fn log_completion(&self, message: &str) {
        info!(
            project_id = %self.project_id,
            operation = %self.operation,
            "Run completed: {}", message
        );
    }

    /// Create a tracing span for this run.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "run",
            project_id = %self.project_id,
            operation = %self.operation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_logger_creation() {
        let project_id = ProjectId::new();
        let logger = RunLogger::new(&project_id, "production_run");
        assert_eq!(logger.project_id, project_id.to_string());
        assert_eq!(logger.operation, "production_run");
    }
}
