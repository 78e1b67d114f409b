//! Secret lifecycle across chained invocations.

use std::collections::BTreeMap;

use hooksim_harness::{
    AddSecretOptions, Context, ErrorKind, HookClient, Relation, RotatePolicy, SecretOwner,
    SecretUpdate, SimConfig, Snapshot, bag,
};

fn content(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

fn leader() -> Snapshot {
    Snapshot {
        leader: true,
        relations: vec![
            Relation::new("db", "db:1")
                .with_remote_app("postgresql")
                .with_remote_unit("postgresql/0", bag([("host", "10.0.0.7")])),
        ],
        ..Snapshot::default()
    }
}

/// One handler for the whole lifecycle; the hook name picks the step.
fn lifecycle(client: &mut HookClient<'_>) -> anyhow::Result<()> {
    match client.env().hook_name().unwrap_or_default().as_str() {
        "install" => {
            let id = client.secret_add(&content(&[("password", "hunter2")]), AddSecretOptions {
                label: Some("db-password".into()),
                rotate: Some(RotatePolicy::Monthly),
                ..AddSecretOptions::default()
            })?;
            client.state_set("secret-id", &id)?;
            client.secret_grant(&id, "db:1", Some("postgresql/0"))?;
        },
        "config-changed" => {
            let id = client.state_get("secret-id")?;
            client.secret_set(&id, SecretUpdate {
                content: content(&[("password", "correct-horse")]),
                description: Some("rotated".into()),
                ..SecretUpdate::default()
            })?;
        },
        "update-status" => {
            let password = client.secret_get_by_label("db-password")?;
            client.state_set("seen", &password["password"])?;
        },
        "stop" => client.secret_remove_by_label("password")?,
        other => anyhow::bail!("unexpected hook {other}"),
    }
    Ok(())
}

#[test]
fn add_set_get_remove() {
    let ctx = Context::new(lifecycle);

    let installed = ctx.run("install", leader()).into_result().unwrap();
    assert_eq!(installed.secrets.len(), 1);
    let secret = &installed.secrets[0];
    assert_eq!(secret.owner, SecretOwner::Application);
    assert_eq!(secret.rotate, Some(RotatePolicy::Monthly));
    assert_eq!(installed.stored_state["secret-id"], secret.id);

    let changed = ctx.run("config-changed", installed).into_result().unwrap();
    assert_eq!(changed.secrets[0].content, content(&[("password", "correct-horse")]));
    assert_eq!(changed.secrets[0].label.as_deref(), Some("db-password"));
    assert_eq!(changed.secrets[0].description.as_deref(), Some("rotated"));

    let read = ctx.run("update-status", changed).into_result().unwrap();
    assert_eq!(read.stored_state["seen"], "correct-horse");

    let stopped = ctx.run("stop", read).into_result().unwrap();
    assert!(stopped.secrets.is_empty());
}

#[test]
fn ids_follow_the_seed() {
    let run = |seed| {
        Context::new(lifecycle)
            .with_config(SimConfig { seed, ..SimConfig::default() })
            .run("install", leader())
            .into_result()
            .unwrap()
            .secrets[0]
            .id
            .clone()
    };

    let id = run(7);
    assert_eq!(id, run(7));
    assert!(id.starts_with("secret:"));
    assert_eq!(id.len(), "secret:".len() + 20);
}

#[test]
fn follower_cannot_touch_application_secrets() {
    let installed = Context::new(lifecycle).run("install", leader()).into_result().unwrap();
    let follower = Snapshot { leader: false, ..installed.clone() };

    // secret-set is silently ignored for a non-leader.
    let changed = Context::new(lifecycle).run("config-changed", follower.clone());
    assert!(changed.is_ok());
    assert_eq!(changed.snapshot.secrets, installed.secrets);

    let read = Context::new(lifecycle).run("update-status", follower.clone());
    assert_eq!(read.error_kind(), Some(ErrorKind::NotFound));

    let stopped = Context::new(lifecycle).run("stop", follower);
    assert!(stopped.is_ok());
    assert_eq!(stopped.snapshot.secrets.len(), 1);
}

#[test]
fn follower_adds_unit_secrets_only() {
    let ctx = Context::new(|client: &mut HookClient<'_>| {
        let owned = AddSecretOptions { owner: Some(SecretOwner::Unit), ..AddSecretOptions::default() };
        let id = client.secret_add(&content(&[("token", "t")]), owned)?;
        let info = client.secret_info(&id)?;
        anyhow::ensure!(info.owner == SecretOwner::Unit, "owner was {:?}", info.owner);
        anyhow::ensure!(client.secret_ids()? == Some(vec![id]), "unit secret not listed");

        client.secret_add(&content(&[("token", "t")]), AddSecretOptions::default())?;
        Ok(())
    });

    let outcome = ctx.run("install", Snapshot::default());

    assert_eq!(outcome.error_kind(), Some(ErrorKind::PermissionDenied));
    assert_eq!(outcome.snapshot.secrets.len(), 1);
    assert_eq!(outcome.command_names(), vec![
        "secret-add",
        "secret-info-get",
        "secret-ids",
        "secret-add"
    ]);
}

#[test]
fn empty_store_lists_nothing() {
    let ctx = Context::new(|client: &mut HookClient<'_>| {
        anyhow::ensure!(client.secret_ids()?.is_none(), "expected no secret store");
        Ok(())
    });

    assert!(ctx.run("install", Snapshot::default()).is_ok());
}
