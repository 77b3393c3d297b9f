//! Placement error types.
//!
//! Only structural problems are errors here. Missing attempts, skipped games
//! and uncovered axes degrade to neutral or penalized values and surface
//! through coverage and confidence instead.

use thiserror::Error;

/// Errors raised by the decision flow, the aggregator and catalog loading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlacementError {
    /// The decision tree, catalog or plan is malformed.
    #[error("configuration error: {0}")]
    Config(String),

    /// Traversal referenced a node id that is not part of the tree.
    #[error("unknown node \"{0}\"")]
    UnknownNode(String),

    /// A result was submitted after the flow ended.
    #[error("placement flow already finished")]
    FlowFinished,
}

impl PlacementError {
    /// Returns `true` if this error points at bad configuration rather than
    /// a bad traversal request.
    pub fn is_configuration(&self) -> bool {
        matches!(self, PlacementError::Config(_))
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        PlacementError::Config(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            PlacementError::UnknownNode("ghost".into()).to_string(),
            "unknown node \"ghost\""
        );
        assert_eq!(
            PlacementError::config("empty decision tree").to_string(),
            "configuration error: empty decision tree"
        );
    }

    #[test]
    fn classification() {
        assert!(PlacementError::config("x").is_configuration());
        assert!(!PlacementError::UnknownNode("x".into()).is_configuration());
        assert!(!PlacementError::FlowFinished.is_configuration());
    }
}
