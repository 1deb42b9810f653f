//! Error types for the view engine.

use thiserror::Error;

/// Errors surfaced by view construction and the event log.
#[derive(Debug, Error)]
pub enum ViewError {
    /// The input could not be decoded into events.
    #[error("malformed event input: {0}")]
    MalformedInput(String),
    /// Strict matching mode found tool calls without counterparts.
    #[error(
        "unmatched tool calls: {unmatched_actions} action(s), {unmatched_observations} observation(s)"
    )]
    Matching {
        unmatched_actions: usize,
        unmatched_observations: usize,
    },
    /// A post-validation invariant check failed. Indicates an engine bug;
    /// checked in debug builds only.
    #[error("view invariant violated: {0}")]
    Invariant(String),
    /// An event could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Convenience result type for view operations.
pub type ViewResult<T> = Result<T, ViewError>;
