//! Error types for the simulated hook environment.
//!
//! Command failures are values, never panics: every handler returns
//! [`HookError`] and the charm decides whether to propagate it. Seed problems
//! are reported separately as [`SnapshotError`] before any command runs.

use hooksim_proto::{HookCommand, ProtocolError};
use thiserror::Error;

/// Failure of a single hook tool invocation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HookError {
    /// Command name is not in the registry
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// Arguments are missing, malformed, or out of range
    #[error("{command}: {detail}")]
    MalformedArguments {
        /// Command that rejected its arguments
        command: HookCommand,
        /// What was wrong
        detail: String,
    },

    /// Leader-only operation attempted by a non-leader
    #[error("{command}: permission denied: {detail}")]
    PermissionDenied {
        /// Command that was refused
        command: HookCommand,
        /// What was refused
        detail: String,
    },

    /// Relation, unit, secret, key or resource does not exist
    #[error("{command}: {what} not found")]
    NotFound {
        /// Command that failed the lookup
        command: HookCommand,
        /// What was looked up
        what: String,
    },

    /// Action-only command used outside an action
    #[error("{command}: not running in an action context")]
    NotInActionContext {
        /// Command that was refused
        command: HookCommand,
    },

    /// Result could not be rendered
    #[error("{command}: cannot encode output: {detail}")]
    Encoding {
        /// Command whose output failed to render
        command: HookCommand,
        /// Encoder message
        detail: String,
    },
}

/// Shape of a [`HookError`], without its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`HookError::UnknownCommand`].
    UnknownCommand,
    /// See [`HookError::MalformedArguments`].
    MalformedArguments,
    /// See [`HookError::PermissionDenied`].
    PermissionDenied,
    /// See [`HookError::NotFound`].
    NotFound,
    /// See [`HookError::NotInActionContext`].
    NotInActionContext,
    /// See [`HookError::Encoding`].
    Encoding,
}

impl HookError {
    /// Error shape, for assertions that must not depend on message text.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownCommand(_) => ErrorKind::UnknownCommand,
            Self::MalformedArguments { .. } => ErrorKind::MalformedArguments,
            Self::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::NotInActionContext { .. } => ErrorKind::NotInActionContext,
            Self::Encoding { .. } => ErrorKind::Encoding,
        }
    }

    /// Command that failed. `None` when the name itself was unknown.
    pub fn command(&self) -> Option<HookCommand> {
        match self {
            Self::UnknownCommand(_) => None,
            Self::MalformedArguments { command, .. }
            | Self::PermissionDenied { command, .. }
            | Self::NotFound { command, .. }
            | Self::NotInActionContext { command }
            | Self::Encoding { command, .. } => Some(*command),
        }
    }

    /// Attribute a codec error to the command being decoded.
    pub fn from_protocol(command: HookCommand, err: ProtocolError) -> Self {
        match err {
            ProtocolError::UnknownCommand(name) => Self::UnknownCommand(name),
            ProtocolError::Encoding(detail) => Self::Encoding { command, detail },
            ProtocolError::MissingValue(_)
            | ProtocolError::InvalidFormat(_)
            | ProtocolError::InvalidPort(_)
            | ProtocolError::InvalidStatus(_) => {
                Self::MalformedArguments { command, detail: err.to_string() }
            },
        }
    }
}

/// Seed snapshot violates a data model invariant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    /// Two relations (regular or peer) share an id
    #[error("duplicate relation id: {0}")]
    DuplicateRelationId(String),

    /// Two secrets share an id
    #[error("duplicate secret id: {0}")]
    DuplicateSecretId(String),

    /// A relation lists a remote or peer unit with an empty id
    #[error("relation {0} has a unit with an empty id")]
    EmptyUnitId(String),
}
