//! What an invocation records: command history, environment and action
//! state carried between chained runs.

use std::collections::BTreeMap;

use hooksim_harness::{
    CharmMetadata, Context, ErrorKind, Hook, HookClient, LogLevel, Secret, SimConfig,
    Snapshot, SnapshotError, Status, StatusName,
};
use insta::assert_json_snapshot;
use serde_json::json;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn install(client: &mut HookClient<'_>) -> anyhow::Result<()> {
    if client.is_leader()? {
        client.set_application_version("2.4.1")?;
    }
    client.status_set(StatusName::Maintenance, "installing")?;
    client.log(LogLevel::Info, "installed")?;
    client.state_set("phase", "installed")?;
    Ok(())
}

#[test]
fn install_records_every_call() {
    init_tracing();
    let ctx = Context::new(install);

    let outcome = ctx.run("install", Snapshot { leader: true, ..Snapshot::default() });

    assert!(outcome.is_ok());
    assert_json_snapshot!(outcome.commands, @r#"
    [
      {
        "name": "is-leader",
        "args": [
          "--format=json"
        ]
      },
      {
        "name": "application-version-set",
        "args": [
          "2.4.1"
        ]
      },
      {
        "name": "status-set",
        "args": [
          "maintenance",
          "installing"
        ]
      },
      {
        "name": "juju-log",
        "args": [
          "--log-level=INFO",
          "installed"
        ]
      },
      {
        "name": "state-set",
        "args": [
          "phase=installed"
        ]
      }
    ]
    "#);
    assert_json_snapshot!(outcome.snapshot.log_lines, @r#"
    [
      {
        "level": "INFO",
        "message": "installed"
      }
    ]
    "#);
    assert_eq!(outcome.snapshot.unit_status, Status::maintenance("installing"));
    assert_eq!(outcome.snapshot.application_version, "2.4.1");
}

#[test]
fn environment_describes_the_hook() {
    init_tracing();
    let config = SimConfig { model_name: "staging".into(), ..SimConfig::default() };
    let ctx = Context::new(|client: &mut HookClient<'_>| {
        let env = client.env();
        let seen = json!({
            "hook": env.hook_name(),
            "action": env.action_name(),
            "unit": env.unit_name(),
            "model": env.model_name(),
            "relation": env.relation_id(),
            "remote-unit": env.remote_unit(),
            "remote-app": env.remote_app(),
            "dispatch": env.dispatch_path(),
            "charm": env.metadata()?.name,
        });
        client.state_set("env", &seen.to_string())?;
        Ok(())
    })
    .with_config(config)
    .with_metadata(CharmMetadata { name: "web".into(), ..CharmMetadata::default() });

    let outcome = ctx.run(
        Hook::new("db-relation-changed").with_relation("db:4").with_remote_unit("postgresql/1"),
        Snapshot::default(),
    );

    let snapshot = outcome.into_result().unwrap();
    let seen: serde_json::Value = serde_json::from_str(&snapshot.stored_state["env"]).unwrap();
    assert_eq!(seen, json!({
        "hook": "db-relation-changed",
        "action": null,
        "unit": "web/0",
        "model": "staging",
        "relation": "db:4",
        "remote-unit": "postgresql/1",
        "remote-app": "postgresql",
        "dispatch": "hooks/db-relation-changed",
        "charm": "web",
    }));
}

#[test]
fn resources_must_be_declared() {
    let metadata = CharmMetadata::from_yaml(
        b"name: model-server\nresources:\n  weights:\n    type: file\n    filename: weights.bin\n",
    )
    .unwrap();
    let ctx = Context::new(|client: &mut HookClient<'_>| {
        let name = client.env().hook_name().unwrap_or_default();
        let path = client.resource_get(name.trim_end_matches("-changed"))?;
        client.state_set("path", &path)?;
        Ok(())
    })
    .with_metadata(metadata);
    let seed = Snapshot {
        resources: BTreeMap::from([
            ("weights".to_string(), "/var/lib/juju/weights.bin".to_string()),
            ("undeclared".to_string(), "/tmp/undeclared".to_string()),
        ]),
        ..Snapshot::default()
    };

    let declared = ctx.run("weights-changed", seed.clone());
    assert_eq!(declared.snapshot.stored_state["path"], "/var/lib/juju/weights.bin");

    let undeclared = ctx.run("undeclared-changed", seed);
    assert_eq!(undeclared.error_kind(), Some(ErrorKind::NotFound));
}

fn backup(client: &mut HookClient<'_>) -> anyhow::Result<()> {
    if client.env().action_name().is_none() {
        // Outside an action the action tools refuse to run.
        client.action_log("not an action")?;
        return Ok(());
    }
    let target: Option<String> = client.action_get("target.path")?;
    let Some(target) = target else {
        client.action_fail("no target")?;
        return Ok(());
    };
    client.action_log("starting backup")?;
    client.action_set(&BTreeMap::from([("backup.path".to_string(), target)]))?;
    Ok(())
}

#[test]
fn action_state_resets_between_invocations() {
    let ctx = Context::new(backup);
    let seed = Snapshot {
        action_parameters: BTreeMap::from([(
            "target".to_string(),
            json!({"path": "/srv/backups"}),
        )]),
        ..Snapshot::default()
    };

    let ran = ctx.run(Hook::action("backup"), seed).into_result().unwrap();
    assert_eq!(ran.action_results["backup.path"], "/srv/backups");
    assert_eq!(ran.action_logs, vec!["starting backup".to_string()]);
    assert_eq!(ran.action_error, None);

    // The next action sees its own parameters only, and none were given.
    let failed = ctx.run(Hook::action("backup"), Snapshot {
        action_parameters: BTreeMap::new(),
        ..ran.clone()
    });
    let failed = failed.into_result().unwrap();
    assert!(failed.action_results.is_empty());
    assert!(failed.action_logs.is_empty());
    assert_eq!(failed.action_error.as_deref(), Some("no target"));

    // A plain hook clears the parameters and may not use the action tools.
    let hook = ctx.run("update-status", ran);
    assert_eq!(hook.error_kind(), Some(ErrorKind::NotInActionContext));
    assert!(hook.snapshot.action_parameters.is_empty());
    assert!(hook.snapshot.action_results.is_empty());
}

#[test]
fn equivalent_secret_ids_rejected_before_the_handler() {
    let ctx = Context::new(install);
    let seed = Snapshot {
        secrets: vec![Secret::new("secret:abc"), Secret::new("abc")],
        ..Snapshot::default()
    };

    let outcome = ctx.run("install", seed);

    assert!(outcome.commands.is_empty());
    assert_eq!(outcome.error_kind(), None);
    let err = outcome.error().and_then(|e| e.downcast_ref::<SnapshotError>());
    assert_eq!(err, Some(&SnapshotError::DuplicateSecretId("abc".into())));
}
