//! Error types for graph loading and interactive edits

use thiserror::Error;

/// Transport-level failure reported by a [`RelationFetcher`](crate::RelationFetcher).
///
/// The engine treats this as non-fatal: the affected node stays
/// permanently unexpanded for the session and the drain loop moves on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct FetchError(pub String);

/// Errors that can occur in the graph engine
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("relation fetch for node {node_id} failed: {source}")]
    Fetch {
        node_id: String,
        #[source]
        source: FetchError,
    },

    #[error("a load or edit is already in flight")]
    Busy,

    #[error("unknown node: {0}")]
    UnknownNode(String),

    #[error("no link {source_id} -> {target}")]
    UnknownLink { source_id: String, target: String },

    #[error("relation editing requires an editing role")]
    Forbidden,
}

pub type GraphResult<T> = Result<T, GraphError>;
