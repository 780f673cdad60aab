//! Error types for SetuIO

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// SetuIO error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Socket-level failure; the link is assumed lost
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed frame or unexpected message
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Payload could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The robot rejected or failed a motion command
    #[error("Command failed: {0}")]
    Command(String),

    /// No acknowledgement within the deadline
    #[error("Communication timeout")]
    Timeout,
}

impl Error {
    /// Whether the link should be treated as dead.
    ///
    /// Everything except a socket-level error is transient: the caller may
    /// log it and keep the connection.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Io(_))
    }
}
