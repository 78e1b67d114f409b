//! In-memory hook environment.
//!
//! A charm talks to the platform only through hook tools. This crate answers
//! those tools from a [`Snapshot`] instead of a live controller, so charm
//! logic can be exercised deterministically in a test suite.
//!
//! # Architecture
//!
//! - [`Snapshot`]: the simulated world of one unit (status, config,
//!   relations, secrets, ports, stored state, logs)
//! - [`HookEnv`]: read-only environment view (hook and action name, unit,
//!   model, charm descriptor)
//! - [`Dispatcher`]: the command table; implements [`CommandRunner`]
//! - [`relation`], [`secret`], [`ports`]: the stateful models behind the
//!   tools
//!
//! The dispatcher is sans-IO: nothing here spawns processes, touches the
//! filesystem or reads the process environment.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod action;
pub mod dispatch;
pub mod env;
pub mod error;
pub mod logging;
pub mod ports;
pub mod relation;
pub mod resource;
pub mod secret;
pub mod state;
pub mod status;
pub mod stored;

#[cfg(test)]
mod testing;

pub use dispatch::{CommandRecord, CommandRunner, Dispatcher, DispatcherConfig};
pub use env::{CharmMetadata, EnvError, HookEnv};
pub use error::{ErrorKind, HookError, SnapshotError};
pub use ports::{PortPlan, reconcile};
pub use secret::{SecretIdGenerator, SecretInfo};
pub use state::{
    DataBag, LogLevel, LogLine, PeerRelation, Relation, RotatePolicy, Secret, SecretOwner,
    Snapshot, Status, bag,
};
pub use status::{AppStatusReport, StatusReport};
