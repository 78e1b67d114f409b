//! Status, leadership, configuration and workload version tools.

use std::collections::BTreeMap;

use hooksim_proto::StatusName;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    dispatch::Request,
    error::HookError,
    state::{Snapshot, Status},
};

/// One status as reported by `status-get --include-data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    /// Status name.
    pub status: StatusName,
    /// Status message.
    #[serde(default)]
    pub message: String,
    /// Extra data attached to the status. Always empty in the simulation.
    #[serde(rename = "status-data", default)]
    pub status_data: Map<String, Value>,
}

impl From<&Status> for StatusReport {
    fn from(status: &Status) -> Self {
        Self { status: status.name, message: status.message.clone(), status_data: Map::new() }
    }
}

/// Application status with the status of every known unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppStatusReport {
    /// Application status.
    #[serde(flatten)]
    pub status: StatusReport,
    /// Unit statuses, by unit id.
    #[serde(default)]
    pub units: BTreeMap<String, StatusReport>,
}

/// `--name`, or `--name=true` as the real tools also accept.
fn switch(req: &Request<'_>, name: &str) -> bool {
    req.args.flag(name) || req.args.option(name).is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

fn to_value<T: Serialize>(req: &Request<'_>, value: T) -> Result<Value, HookError> {
    serde_json::to_value(value)
        .map_err(|e| HookError::Encoding { command: req.command, detail: e.to_string() })
}

/// `status-get [--include-data] [--application]`
pub(crate) fn status_get(snapshot: &mut Snapshot, req: &Request<'_>) -> Result<Value, HookError> {
    if switch(req, "application") {
        if !snapshot.leader {
            return Err(req.denied("only the leader can read application status"));
        }
        let report = AppStatusReport {
            status: StatusReport::from(&snapshot.app_status),
            units: BTreeMap::from([(
                snapshot.unit_id.clone(),
                StatusReport::from(&snapshot.unit_status),
            )]),
        };
        let mut out = Map::new();
        out.insert("application-status".to_string(), to_value(req, report)?);
        return Ok(Value::Object(out));
    }

    if switch(req, "include-data") {
        return to_value(req, StatusReport::from(&snapshot.unit_status));
    }
    Ok(Value::String(snapshot.unit_status.name.as_str().to_string()))
}

/// `status-set [--application] <status> [message...]`
pub(crate) fn status_set(snapshot: &mut Snapshot, req: &Request<'_>) -> Result<Value, HookError> {
    let mut tokens = req.args.positionals().iter();
    let name: StatusName = tokens
        .next()
        .ok_or_else(|| req.malformed("status name required"))?
        .parse()
        .map_err(|e| req.protocol(e))?;
    if !name.is_settable() {
        return Err(req.malformed(format!("cannot set status {name}")));
    }
    let message = tokens.map(String::as_str).collect::<Vec<_>>().join(" ");

    let target = if switch(req, "application") {
        if !snapshot.leader {
            return Err(req.denied("only the leader can set application status"));
        }
        &mut snapshot.app_status
    } else {
        &mut snapshot.unit_status
    };
    *target = Status::new(name, message);

    Ok(Value::Null)
}

/// `config-get [key]`
pub(crate) fn config_get(snapshot: &mut Snapshot, req: &Request<'_>) -> Result<Value, HookError> {
    Ok(match req.first() {
        Some(key) => snapshot.config.get(key).cloned().unwrap_or(Value::Null),
        None => Value::Object(snapshot.config.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
    })
}

/// `is-leader`
pub(crate) fn is_leader(snapshot: &mut Snapshot, _req: &Request<'_>) -> Result<Value, HookError> {
    Ok(Value::Bool(snapshot.leader))
}

/// `application-version-set <version>`
pub(crate) fn application_version_set(
    snapshot: &mut Snapshot,
    req: &Request<'_>,
) -> Result<Value, HookError> {
    snapshot.application_version = req.args.positionals().join(" ");
    Ok(Value::Null)
}

#[cfg(test)]
mod tests {
    use hooksim_proto::HookCommand;
    use serde_json::json;

    use super::*;
    use crate::{
        dispatch::{Dispatcher, DispatcherConfig},
        error::ErrorKind,
        testing::MapEnv,
    };

    fn dispatcher(leader: bool) -> Dispatcher<MapEnv> {
        let snapshot = Snapshot {
            leader,
            unit_id: "web/0".into(),
            unit_status: Status::active("serving"),
            config: BTreeMap::from([
                ("port".to_string(), json!(8080)),
                ("name".to_string(), json!("web")),
            ]),
            ..Snapshot::default()
        };
        Dispatcher::new(snapshot, MapEnv::default(), DispatcherConfig::default())
    }

    fn text(d: &mut Dispatcher<MapEnv>, command: HookCommand, tokens: &[&str]) -> String {
        let args: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
        String::from_utf8(d.dispatch(command, &args).unwrap()).unwrap()
    }

    #[test]
    fn get_name_or_report() {
        let mut d = dispatcher(false);

        assert_eq!(text(&mut d, HookCommand::StatusGet, &[]), "active\n");
        let report: Value = serde_json::from_str(&text(&mut d, HookCommand::StatusGet, &[
            "--include-data",
            "--format=json",
        ]))
        .unwrap();
        assert_eq!(report, json!({"message": "serving", "status": "active", "status-data": {}}));
    }

    #[test]
    fn application_status_is_leader_only() {
        let mut follower = dispatcher(false);
        let err = follower
            .dispatch(HookCommand::StatusGet, &["--application=True".to_string()])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);

        let mut leader = dispatcher(true);
        let out = leader
            .dispatch(HookCommand::StatusGet, &["--application".into(), "--format=json".into()])
            .unwrap();
        let value: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["application-status"]["status"], json!("unknown"));
        assert_eq!(value["application-status"]["units"]["web/0"]["message"], json!("serving"));
    }

    #[test]
    fn set_joins_message_and_rejects_unsettable() {
        let mut d = dispatcher(false);

        text(&mut d, HookCommand::StatusSet, &["blocked", "need", "db=postgres"]);
        assert_eq!(d.snapshot().unit_status, Status::blocked("need db=postgres"));

        let cases: [&[&str]; 3] = [&["error"], &["sleeping"], &[]];
        for bad in cases {
            let args: Vec<String> = bad.iter().map(|t| t.to_string()).collect();
            let err = d.dispatch(HookCommand::StatusSet, &args).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::MalformedArguments);
        }

        let err = d
            .dispatch(HookCommand::StatusSet, &["--application".into(), "active".into()])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
        assert_eq!(d.snapshot().app_status, Status::default());
    }

    #[test]
    fn config_whole_or_key() {
        let mut d = dispatcher(false);

        assert_eq!(text(&mut d, HookCommand::ConfigGet, &["port"]), "8080\n");
        assert_eq!(text(&mut d, HookCommand::ConfigGet, &["missing", "--format=json"]), "null\n");
        assert_eq!(text(&mut d, HookCommand::ConfigGet, &[]), "name: web\nport: 8080\n");
    }

    #[test]
    fn leader_and_version() {
        let mut d = dispatcher(true);

        assert_eq!(text(&mut d, HookCommand::IsLeader, &["--format=json"]), "true\n");
        text(&mut d, HookCommand::ApplicationVersionSet, &["1.2.3"]);
        assert_eq!(d.snapshot().application_version, "1.2.3");
    }
}
