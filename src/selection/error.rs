//! Selection Error Types
//!
//! Error handling for the selection transfer module.

use thiserror::Error;

/// Result type for selection operations
pub type Result<T> = std::result::Result<T, SelectionError>;

/// Selection module error types
#[derive(Error, Debug)]
pub enum SelectionError {
    /// The selection owner declined the requested conversion target
    #[error("target {0} not available from the selection owner")]
    TargetUnavailable(String),

    /// X connection setup failed
    #[error("failed to connect to X display: {0}")]
    Connect(#[from] x11rb::errors::ConnectError),

    /// X connection broke mid-protocol
    #[error("X connection error: {0}")]
    Connection(#[from] x11rb::errors::ConnectionError),

    /// An X request was answered with a protocol error
    #[error("X request failed: {0}")]
    Reply(#[from] x11rb::errors::ReplyError),

    /// Resource id allocation failed
    #[error("X resource allocation failed: {0}")]
    Id(#[from] x11rb::errors::ReplyOrIdError),
}
