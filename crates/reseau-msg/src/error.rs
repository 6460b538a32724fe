use thiserror::Error;

use reseau_graph::GraphError;
use reseau_store::StoreError;

/// Errors produced by the messaging engine.
#[derive(Error, Debug)]
pub enum MsgError {
    /// The message does not exist, or is deleted from this viewer's view.
    #[error("Message not found")]
    NotFound,

    /// The caller is not a party to the message (or, with friendship-gated
    /// sending, not connected to the receiver).
    #[error("Not allowed to access this message")]
    Forbidden,

    /// Message body was empty after trimming.
    #[error("Message content is empty")]
    EmptyContent,

    /// Failure from the graph engine while checking the friendship gate.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Store failure, surfaced unmodified.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MsgError>;
