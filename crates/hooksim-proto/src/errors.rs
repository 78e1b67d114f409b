//! Error types for hook tool wire handling.

use thiserror::Error;

/// Errors raised while decoding or encoding hook tool command lines.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Command name is not part of the registry
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// Short option given as the last token, without its value
    #[error("option {0} requires a value")]
    MissingValue(String),

    /// `--format=` names an encoding the tools do not produce
    #[error("unsupported output format: {0}")]
    InvalidFormat(String),

    /// Token is not a valid `<port>/<protocol>` pair
    #[error("invalid port: {0}")]
    InvalidPort(String),

    /// Status name is not recognised
    #[error("invalid status: {0}")]
    InvalidStatus(String),

    /// Result could not be rendered in the requested format
    #[error("encoding error: {0}")]
    Encoding(String),
}

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;
