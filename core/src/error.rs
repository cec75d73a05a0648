use thiserror::Error;

use crate::filter::CompareOp;
use crate::graph::NodeId;

pub type Result<T> = std::result::Result<T, GraphError>;

/// Failures surfaced by the store, the pattern compiler and filter evaluation.
///
/// Lookup misses are never errors: absent nodes and relationships come back
/// as `None`, `false` or an empty result.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("node record has no non-negative integer 'id' property")]
    MissingNodeId,

    #[error("node id {id} is already used by a {existing_type} node")]
    DuplicateNodeId { id: NodeId, existing_type: String },

    #[error("property '{0}' is reserved")]
    ReservedProperty(String),

    #[error("expected a JSON object of properties, got {0}")]
    NotAnObject(String),

    #[error("property '{key}' has unsupported value {value} (expected a number, string or boolean)")]
    UnsupportedValue { key: String, value: String },

    #[error("cannot compare {left} with {right} using '{op}'")]
    TypeMismatch {
        left: &'static str,
        op: CompareOp,
        right: &'static str,
    },

    #[error("relationship type '{rel_type}' exceeds the limit of {max} distinct types")]
    TooManyRelTypes { rel_type: String, max: usize },

    #[error("invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("invalid graph document: {0}")]
    InvalidDocument(String),
}
