//! `juju-log`.
//!
//! Lines are captured in the snapshot for assertions and re-emitted as
//! `tracing` events under the `charm` target, so a test subscriber shows
//! them inline with the simulator's own logs.

use serde_json::Value;
use tracing::{debug, error, info, trace, warn};

use crate::{
    dispatch::Request,
    error::HookError,
    state::{LogLevel, LogLine, Snapshot},
};

/// `juju-log [--debug] [-l <level>] <message...>`
pub(crate) fn juju_log(snapshot: &mut Snapshot, req: &Request<'_>) -> Result<Value, HookError> {
    let level = match req.args.option("log-level") {
        Some(value) => {
            LogLevel::parse(value).ok_or_else(|| req.malformed(format!("invalid log level {value:?}")))?
        },
        None if req.args.flag("debug") => LogLevel::Debug,
        None => LogLevel::Info,
    };
    let message = req.args.positionals().join(" ");
    if message.is_empty() {
        return Err(req.malformed("message required"));
    }

    match level {
        LogLevel::Trace => trace!(target: "charm", unit = %snapshot.unit_id, "{message}"),
        LogLevel::Debug => debug!(target: "charm", unit = %snapshot.unit_id, "{message}"),
        LogLevel::Info => info!(target: "charm", unit = %snapshot.unit_id, "{message}"),
        LogLevel::Warning => warn!(target: "charm", unit = %snapshot.unit_id, "{message}"),
        LogLevel::Error | LogLevel::Critical => {
            error!(target: "charm", unit = %snapshot.unit_id, "{message}")
        },
    }
    snapshot.log_lines.push(LogLine::new(level, message));

    Ok(Value::Null)
}
