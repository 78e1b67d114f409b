//! Action tools.
//!
//! Only reachable while an action runs; the dispatcher refuses them
//! otherwise. Results are flat `key=value` strings, keys may be dotted to
//! express nesting.

use serde_json::Value;

use crate::{dispatch::Request, error::HookError, state::Snapshot};

/// Result keys the platform fills in itself.
pub const RESERVED_RESULT_KEYS: [&str; 4] = ["stdout", "stderr", "stdout-encoding", "stderr-encoding"];

const DEFAULT_FAILURE: &str = "action failed";

/// Whether `key` is a valid `action-set` key.
///
/// Every dotted segment is non-empty, uses `[a-z0-9-]`, and starts and ends
/// with a letter or digit.
pub fn is_valid_result_key(key: &str) -> bool {
    key.split('.').all(|segment| {
        let bytes = segment.as_bytes();
        match (bytes.first(), bytes.last()) {
            (Some(first), Some(last)) => {
                first.is_ascii_alphanumeric()
                    && last.is_ascii_alphanumeric()
                    && bytes.iter().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
            },
            _ => false,
        }
    })
}

/// `action-get [key[.sub...]]`
pub(crate) fn action_get(snapshot: &mut Snapshot, req: &Request<'_>) -> Result<Value, HookError> {
    let Some(path) = req.first() else {
        return Ok(Value::Object(
            snapshot.action_parameters.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        ));
    };

    let mut segments = path.split('.');
    let head = segments.next().unwrap_or_default();
    let mut value = snapshot.action_parameters.get(head);
    for segment in segments {
        value = value.and_then(|v| v.get(segment));
    }
    Ok(value.cloned().unwrap_or(Value::Null))
}

/// `action-set key=value...`
pub(crate) fn action_set(snapshot: &mut Snapshot, req: &Request<'_>) -> Result<Value, HookError> {
    if let Some(token) = req.first() {
        return Err(req.malformed(format!("expected key=value, got {token:?}")));
    }
    let results = req.pairs()?;
    for key in results.keys() {
        if RESERVED_RESULT_KEYS.contains(&key.as_str()) {
            return Err(req.malformed(format!("key {key:?} is reserved")));
        }
        if !is_valid_result_key(key) {
            return Err(req.malformed(format!("invalid key {key:?}")));
        }
    }

    snapshot.action_results.extend(results);
    Ok(Value::Null)
}

/// `action-log <message...>`
pub(crate) fn action_log(snapshot: &mut Snapshot, req: &Request<'_>) -> Result<Value, HookError> {
    let message = req.args.positionals().join(" ");
    if message.is_empty() {
        return Err(req.malformed("message required"));
    }
    snapshot.action_logs.push(message);
    Ok(Value::Null)
}

/// `action-fail [message...]`
pub(crate) fn action_fail(snapshot: &mut Snapshot, req: &Request<'_>) -> Result<Value, HookError> {
    let message = req.args.positionals().join(" ");
    snapshot.action_error =
        Some(if message.is_empty() { DEFAULT_FAILURE.to_string() } else { message });
    Ok(Value::Null)
}
