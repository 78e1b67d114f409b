//! Client errors.

use hooksim_core::{ErrorKind, HookError};
use hooksim_proto::{HookCommand, ProtocolError};
use thiserror::Error;

/// Failure of a typed hook tool call.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The tool itself failed
    #[error(transparent)]
    Hook(#[from] HookError),

    /// The tool answered with JSON of an unexpected shape
    #[error("{command}: cannot decode output: {source}")]
    Decode {
        /// Command whose output was decoded
        command: HookCommand,
        /// Decoder error
        source: serde_json::Error,
    },

    /// The tool answered with a token the client cannot parse
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl ClientError {
    /// Tool failure, if that is what this is.
    pub fn hook_error(&self) -> Option<&HookError> {
        match self {
            Self::Hook(err) => Some(err),
            Self::Decode { .. } | Self::Protocol(_) => None,
        }
    }

    /// Shape of the tool failure, if any.
    pub fn kind(&self) -> Option<ErrorKind> {
        self.hook_error().map(HookError::kind)
    }
}
