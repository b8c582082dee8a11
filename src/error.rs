//! Error types for nodegroup.
//!
//! Two families live here: [`Rejection`] is an advisory outcome of
//! validation (nothing was mutated), while the remaining [`GroupError`]
//! variants describe failures of the graph model, persistence or config.

use thiserror::Error;

use uuid::Uuid;

use crate::graph::{LinkId, NodeId, SocketRef};

/// Why a selection cannot be turned into a subprogram.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// A selected node carries the "no subprogram" restriction.
    #[error("selection contains a non-extractable node")]
    IneligibleNode { node: NodeId },

    /// The selection mixes networks that cannot share a subprogram.
    #[error("incompatible node networks")]
    IncompatibleNetworks,

    /// Some unselected nodes are both upstream and downstream of the selection.
    #[error("invalid node dependencies")]
    InvalidDependencyCycle { nodes: Vec<NodeId> },

    /// Nothing crosses the selection boundary.
    #[error("selection has no external links")]
    NoExternalLinks,
}

/// Errors that can occur in nodegroup operations.
#[derive(Debug, Error)]
pub enum GroupError {
    #[error("extraction rejected: {0}")]
    Rejected(#[from] Rejection),

    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("socket not found: {0}")]
    SocketNotFound(SocketRef),

    #[error("link not found: {0}")]
    LinkNotFound(LinkId),

    #[error("cannot link {from} to {to}: {reason}")]
    InvalidLink {
        from: SocketRef,
        to: SocketRef,
        reason: String,
    },

    #[error("node kind does not accept parameters: {0}")]
    NotAnInterface(NodeId),

    #[error("unknown node name: {0}")]
    UnknownNode(String),

    #[error("duplicate node name: {0}")]
    DuplicateName(String),

    #[error("duplicate node identifier: {0}")]
    DuplicateIdentifier(Uuid),

    #[error("malformed node {name}: {reason}")]
    MalformedNode { name: String, reason: String },

    #[error("malformed tree document: {0}")]
    Document(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bincode error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
}

impl GroupError {
    /// The rejection carried by this error, if validation refused the selection.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            GroupError::Rejected(r) => Some(r),
            _ => None,
        }
    }
}

/// Result type alias for nodegroup operations.
pub type Result<T> = std::result::Result<T, GroupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_messages() {
        assert_eq!(
            Rejection::IncompatibleNetworks.to_string(),
            "incompatible node networks"
        );
        assert_eq!(
            Rejection::NoExternalLinks.to_string(),
            "selection has no external links"
        );
        let err: GroupError = Rejection::InvalidDependencyCycle { nodes: vec![] }.into();
        assert_eq!(
            err.to_string(),
            "extraction rejected: invalid node dependencies"
        );
        assert!(err.rejection().is_some());
    }

    #[test]
    fn test_graph_error_is_not_rejection() {
        let err = GroupError::UnknownNode("Math".to_string());
        assert!(err.rejection().is_none());
    }
}
