//! Simulation harness for charm handlers.
//!
//! Runs a charm's entry point against an in-memory unit: the handler issues
//! hook tool calls through a [`HookClient`], a [`hooksim_core::Dispatcher`]
//! answers them from a [`Snapshot`], and the test asserts on the returned
//! [`Outcome`].
//!
//! ```text
//! test ──Snapshot──▶ Context::run ──HookClient──▶ Dispatcher
//!   ▲                                               │
//!   └───────────────── Outcome ◀────────────────────┘
//! ```
//!
//! # Chaining
//!
//! [`Outcome::snapshot`] is a plain value. Passing it to the next
//! [`Context::run`] continues from where the previous hook left off.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod context;
pub mod hook;
pub mod sim_env;

pub use config::SimConfig;
pub use context::{Context, Outcome};
pub use hook::Hook;
pub use hooksim_client::{AddSecretOptions, ClientError, HookClient, HookEnv, SecretUpdate};
pub use hooksim_core::{
    CharmMetadata, CommandRecord, DataBag, ErrorKind, HookError, LogLevel, LogLine, PeerRelation,
    Relation, RotatePolicy, Secret, SecretOwner, Snapshot, SnapshotError, Status, bag,
};
pub use hooksim_proto::{Port, StatusName};
pub use sim_env::SimEnv;
