//! Unit key/value state persisted across hooks.

use serde_json::Value;

use crate::{dispatch::Request, error::HookError, state::Snapshot};

/// `state-get [key]`
pub(crate) fn state_get(snapshot: &mut Snapshot, req: &Request<'_>) -> Result<Value, HookError> {
    match req.first() {
        Some(key) => snapshot
            .stored_state
            .get(key)
            .map(|value| Value::String(value.clone()))
            .ok_or_else(|| req.not_found(format!("state key {key}"))),
        None => Ok(Value::Object(
            snapshot
                .stored_state
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
        )),
    }
}

/// `state-set key=value...`
pub(crate) fn state_set(snapshot: &mut Snapshot, req: &Request<'_>) -> Result<Value, HookError> {
    if let Some(token) = req.first() {
        return Err(req.malformed(format!("expected key=value, got {token:?}")));
    }
    let pairs = req.pairs()?;
    snapshot.stored_state.extend(pairs);
    Ok(Value::Null)
}

/// `state-delete <key>`. Deleting an absent key is not an error.
pub(crate) fn state_delete(snapshot: &mut Snapshot, req: &Request<'_>) -> Result<Value, HookError> {
    let key = req.first().ok_or_else(|| req.malformed("key required"))?;
    snapshot.stored_state.remove(key);
    Ok(Value::Null)
}

#[cfg(test)]
mod tests {
    use hooksim_proto::HookCommand;

    use super::*;
    use crate::{
        dispatch::{Dispatcher, DispatcherConfig},
        error::ErrorKind,
        testing::MapEnv,
    };

    fn call(d: &mut Dispatcher<MapEnv>, command: HookCommand, tokens: &[&str]) -> Result<String, HookError> {
        let args: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
        d.dispatch(command, &args).map(|out| String::from_utf8(out).unwrap())
    }

    #[test]
    fn set_get_delete() {
        let mut d = Dispatcher::new(Snapshot::default(), MapEnv::default(), DispatcherConfig::default());

        call(&mut d, HookCommand::StateSet, &["k=v", "other=x=y"]).unwrap();
        assert_eq!(call(&mut d, HookCommand::StateGet, &["k"]).unwrap(), "v\n");
        assert_eq!(
            call(&mut d, HookCommand::StateGet, &["--format=json"]).unwrap(),
            "{\"k\":\"v\",\"other\":\"x=y\"}\n"
        );

        call(&mut d, HookCommand::StateDelete, &["k"]).unwrap();
        call(&mut d, HookCommand::StateDelete, &["k"]).unwrap();
        let err = call(&mut d, HookCommand::StateGet, &["k"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn malformed_calls() {
        let mut d = Dispatcher::new(Snapshot::default(), MapEnv::default(), DispatcherConfig::default());

        assert_eq!(
            call(&mut d, HookCommand::StateSet, &["k"]).unwrap_err().kind(),
            ErrorKind::MalformedArguments
        );
        assert_eq!(
            call(&mut d, HookCommand::StateDelete, &[]).unwrap_err().kind(),
            ErrorKind::MalformedArguments
        );
        assert_eq!(
            call(&mut d, HookCommand::StateSet, &["=v", "k=v"]).unwrap_err().kind(),
            ErrorKind::MalformedArguments
        );
        assert!(d.snapshot().stored_state.is_empty());
    }
}
