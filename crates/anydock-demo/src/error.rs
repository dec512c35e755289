use anydock::{DockError, DragRejection};
use anydock_core::LoggingError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DemoError>;

#[derive(Debug, Error)]
pub enum DemoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("logging setup failed: {0}")]
    Logging(#[from] LoggingError),

    #[error("dock operation failed: {0}")]
    Dock(#[from] DockError),

    #[error("step {step:?}: drag rejected: {reason}")]
    Rejected { step: &'static str, reason: DragRejection },

    #[error("step {step:?}: {message}")]
    Script { step: &'static str, message: String },
}

impl DemoError {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Dock(_) => 2,
            Self::Rejected { .. } | Self::Script { .. } => 3,
            Self::Logging(_) => 4,
            Self::Io(_) | Self::Json(_) => 1,
        }
    }

    #[must_use]
    pub fn script(step: &'static str, message: impl Into<String>) -> Self {
        Self::Script {
            step,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DemoError;
    use anydock::{DockError, DockNodeId, DragRejection};

    #[test]
    fn dock_errors_exit_with_two() {
        let error = DemoError::from(DockError::UnknownNode {
            node: DockNodeId::new(9).expect("non-zero"),
        });
        assert_eq!(error.exit_code(), 2);
        assert_eq!(error.to_string(), "dock operation failed: node #9 does not exist");
    }

    #[test]
    fn rejected_drag_names_step_and_reason() {
        let error = DemoError::Rejected {
            step: "tab drop",
            reason: DragRejection::TargetNotLeaf,
        };
        assert_eq!(error.exit_code(), 3);
        assert_eq!(
            error.to_string(),
            "step \"tab drop\": drag rejected: drop target is a split"
        );
    }
}
