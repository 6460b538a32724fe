use thiserror::Error;

use reseau_shared::UserId;
use reseau_store::StoreError;

/// Errors produced by the connection graph engine.
#[derive(Error, Debug)]
pub enum GraphError {
    /// A user tried to friend themselves.
    #[error("A user cannot send a friend request to themselves")]
    SelfRequest,

    /// The target of the operation does not exist in the user directory.
    #[error("Unknown user: {0}")]
    NotFound(UserId),

    /// Degree threshold exceeded and no introduction path within the hop
    /// bound (or re-requesting a rejected pair while policy forbids it).
    #[error("Requester is not eligible to connect with this user")]
    NotEligible,

    /// A request between this pair is already awaiting an answer.
    #[error("A request between these users is already pending")]
    AlreadyPending,

    /// The pair already has an accepted connection.
    #[error("These users are already connected")]
    AlreadyConnected,

    /// No pending request from that user toward the responder.
    #[error("No pending friend request from that user")]
    NoSuchRequest,

    /// The pair has no accepted connection to remove.
    #[error("These users are not friends")]
    NotFriends,

    /// Requested traversal depth is outside the allowed range.
    #[error("Hop count {requested} exceeds the traversal limit of {max}")]
    HopLimitExceeded { requested: u32, max: u32 },

    /// Store failure, surfaced unmodified.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GraphError>;
