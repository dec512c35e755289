use thiserror::Error;

use crate::content::ContentId;
use crate::node::DockNodeId;

pub type Result<T> = std::result::Result<T, DockError>;

/// Contract violations raised by dock tree operations.
///
/// None of these are retried; a failed operation leaves the tree unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DockError {
    /// Operation is illegal for the node variant or lifecycle phase.
    #[error("invalid state: {reason}")]
    InvalidState { reason: String },

    /// The node was absorbed by a collapse and must not be touched again.
    #[error("node {node} was abandoned by a collapse")]
    UseAfterAbandon { node: DockNodeId },

    #[error("index {index} out of range for {len} item(s)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("unknown drop region tag {tag:?}")]
    UnknownDropRegion { tag: String },

    #[error("node {node} does not exist")]
    UnknownNode { node: DockNodeId },

    #[error("content {content} is not docked")]
    UnknownContent { content: ContentId },
}

impl DockError {
    #[must_use]
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidState {
            reason: reason.into(),
        }
    }

    /// Whether this error is one of the lifecycle violations a view layer
    /// can hit by holding a stale node id.
    #[must_use]
    pub const fn is_stale_node(&self) -> bool {
        matches!(self, Self::UseAfterAbandon { .. } | Self::UnknownNode { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offender() {
        let node = DockNodeId::new(7).expect("non-zero id");
        assert_eq!(
            DockError::UseAfterAbandon { node }.to_string(),
            "node #7 was abandoned by a collapse"
        );
        assert_eq!(
            DockError::IndexOutOfRange { index: 3, len: 2 }.to_string(),
            "index 3 out of range for 2 item(s)"
        );
        assert_eq!(
            DockError::invalid("leaf still holds items").to_string(),
            "invalid state: leaf still holds items"
        );
    }

    #[test]
    fn stale_node_classification() {
        let node = DockNodeId::MIN;
        assert!(DockError::UseAfterAbandon { node }.is_stale_node());
        assert!(DockError::UnknownNode { node }.is_stale_node());
        assert!(!DockError::invalid("x").is_stale_node());
    }
}
