//! Error types for the dispenser link.

use thiserror::Error;

/// Errors that can occur on the serial link.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LinkError {
    /// The device could not be opened (absent, busy, or permission denied).
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// A command was issued while the link was not open.
    #[error("Link not open")]
    NotOpen,

    /// A session is already in flight. The single actuator takes one command
    /// at a time; the coordinator's gate normally prevents this from ever
    /// being observed.
    #[error("Dispenser busy")]
    Busy,

    /// The command could not be transmitted.
    #[error("Write error: {0}")]
    WriteError(String),

    /// The link actor is no longer running.
    #[error("Link actor unavailable")]
    ActorClosed,
}
