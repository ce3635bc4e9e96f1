//! Error types for the transaction log.

use thiserror::Error;

/// Errors that can occur when talking to the transaction log actor.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransactionLogError {
    /// The log actor is no longer running.
    #[error("Transaction log actor unavailable")]
    ActorClosed,
}
