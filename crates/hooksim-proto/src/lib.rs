//! Wire vocabulary of the hook tools.
//!
//! Every interaction a charm has with the platform is a named command invoked
//! with a flat list of string arguments, answering with either plain text or
//! JSON. This crate owns that vocabulary and nothing else: it knows which
//! commands exist, how their arguments are tokenized, what a port or status
//! token looks like, and how results are rendered. It never touches state.
//!
//! # Components
//!
//! - [`HookCommand`]: the closed registry of tools, one variant per command
//! - [`HookArgs`]: decoder for the shared argument grammar
//! - [`CommandLine`]: encoder producing argument lists for a command
//! - [`Port`], [`Protocol`]: `<port>/<protocol>` tokens
//! - [`StatusName`]: workload status names
//! - [`output`]: `smart` and `--format=json` result rendering

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod args;
pub mod command;
pub mod errors;
pub mod output;
pub mod port;
pub mod status;

pub use args::{CommandLine, END_OF_OPTIONS, FORMAT_JSON, Format, HookArgs};
pub use command::HookCommand;
pub use errors::{ProtocolError, Result};
pub use port::{Port, Protocol};
pub use status::StatusName;
