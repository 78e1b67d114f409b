//! Client
//!
//! Typed hook tool calls for charm code. Each method formats one command
//! line, hands it to a [`CommandRunner`], and decodes the JSON answer.
//!
//! # Architecture
//!
//! The runner is injected, never global. In tests it is a
//! [`hooksim_core::Dispatcher`] owned by the invocation context, so parallel
//! tests cannot see each other's state.
//!
//! # Components
//!
//! - [`HookClient`]: one method per hook tool, plus [`HookClient::set_ports`]
//! - [`AddSecretOptions`], [`SecretUpdate`]: optional secret settings
//! - [`ClientError`]: tool failures and decode failures

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod client;
mod error;

pub use client::{AddSecretOptions, HookClient, SecretUpdate};
pub use error::ClientError;
pub use hooksim_core::{CommandRunner, HookEnv};
