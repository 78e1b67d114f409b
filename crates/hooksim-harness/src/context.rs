//! Invocation context.
//!
//! A [`Context`] binds a charm handler to a simulation configuration and,
//! optionally, a charm descriptor. Each [`Context::run`] is one invocation:
//!
//! ```text
//! Idle ──dispatcher built──▶ Running ──handler returns──▶ Done
//!   │                                                      ▲
//!   └──────────────── seed rejected ───────────────────────┘
//! ```
//!
//! # Invariants
//!
//! - An invocation reaches `Done` exactly once, and `Done` steps to itself
//! - The snapshot is owned by the dispatcher while the handler runs and is
//!   handed back only in the [`Outcome`]
//! - A seed that violates the data model never reaches the handler

use hooksim_client::{ClientError, HookClient};
use hooksim_core::{
    CharmMetadata, CommandRecord, Dispatcher, DispatcherConfig, ErrorKind, HookError, Snapshot,
    env,
};
use tracing::{debug, info_span, warn};

use crate::{config::SimConfig, hook::Hook, sim_env::SimEnv};

/// Application name used when neither the seed nor the descriptor names one.
const DEFAULT_APP: &str = "app";

/// Result of one invocation.
#[derive(Debug)]
pub struct Outcome {
    /// World after the handler returned; seed for the next invocation.
    pub snapshot: Snapshot,
    /// Every hook tool call the handler issued, in order.
    pub commands: Vec<CommandRecord>,
    error: Option<anyhow::Error>,
}

impl Outcome {
    /// Whether the handler returned `Ok`.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Error the handler returned, or the seed was rejected with.
    pub fn error(&self) -> Option<&anyhow::Error> {
        self.error.as_ref()
    }

    /// Hook tool failure behind the error, however it was wrapped.
    pub fn hook_error(&self) -> Option<&HookError> {
        self.error.as_ref()?.chain().find_map(|cause| {
            cause
                .downcast_ref::<HookError>()
                .or_else(|| cause.downcast_ref::<ClientError>().and_then(ClientError::hook_error))
        })
    }

    /// Shape of the hook tool failure, if any.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.hook_error().map(HookError::kind)
    }

    /// Names of the issued commands.
    pub fn command_names(&self) -> Vec<&str> {
        self.commands.iter().map(|c| c.name.as_str()).collect()
    }

    /// Snapshot on success, the handler's error otherwise.
    pub fn into_result(self) -> anyhow::Result<Snapshot> {
        match self.error {
            None => Ok(self.snapshot),
            Some(err) => Err(err),
        }
    }
}

/// One invocation on its way to an [`Outcome`].
enum Invocation {
    Idle { snapshot: Snapshot, env: SimEnv },
    /// The dispatcher owns the snapshot; `env` is the view handed to the charm.
    Running { dispatcher: Dispatcher<SimEnv>, env: SimEnv },
    Done(Outcome),
}

impl Invocation {
    /// Advance by one state.
    fn step<F>(self, charm: &F, config: DispatcherConfig) -> Self
    where
        F: Fn(&mut HookClient<'_>) -> anyhow::Result<()>,
    {
        match self {
            Self::Idle { snapshot, env } => {
                Self::Running { dispatcher: Dispatcher::new(snapshot, env.clone(), config), env }
            },
            Self::Running { mut dispatcher, env } => {
                let result = {
                    let mut client = HookClient::new(&mut dispatcher, &env);
                    charm(&mut client)
                };
                let (snapshot, commands) = dispatcher.into_parts();

                if let Err(err) = &result {
                    warn!(error = %err, "charm handler failed");
                }
                debug!(commands = commands.len(), "invocation done");
                Self::Done(Outcome { snapshot, commands, error: result.err() })
            },
            done @ Self::Done(_) => done,
        }
    }

    fn execute<F>(mut self, charm: &F, config: DispatcherConfig) -> Outcome
    where
        F: Fn(&mut HookClient<'_>) -> anyhow::Result<()>,
    {
        loop {
            match self {
                Self::Done(outcome) => return outcome,
                pending => self = pending.step(charm, config),
            }
        }
    }
}

/// Charm handler bound to a simulated unit.
pub struct Context<F> {
    charm: F,
    metadata: Option<CharmMetadata>,
    config: SimConfig,
}

impl<F> Context<F>
where
    F: Fn(&mut HookClient<'_>) -> anyhow::Result<()>,
{
    /// Context running `charm` with the default configuration.
    pub fn new(charm: F) -> Self {
        Self { charm, metadata: None, config: SimConfig::default() }
    }

    /// Provide the charm descriptor, readable as `metadata.yaml`.
    pub fn with_metadata(mut self, metadata: CharmMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: SimConfig) -> Self {
        self.config = config;
        self
    }

    /// Run the handler once for `hook` against `snapshot`.
    ///
    /// Action fields of the seed are cleared first; parameters survive only
    /// when `hook` is an action.
    pub fn run(&self, hook: impl Into<Hook>, snapshot: Snapshot) -> Outcome {
        let hook = hook.into();
        let span = info_span!("invocation", hook = hook.name(), action = hook.is_action());
        let _guard = span.enter();

        let config = DispatcherConfig { seed: self.config.seed };
        self.prepare(&hook, snapshot).execute(&self.charm, config)
    }

    fn prepare(&self, hook: &Hook, mut snapshot: Snapshot) -> Invocation {
        snapshot.reset_action_fields(hook.is_action());
        self.fill_identity(&mut snapshot);

        if let Err(err) = snapshot.validate() {
            warn!(error = %err, "seed rejected");
            return Invocation::Done(Outcome {
                snapshot,
                commands: Vec::new(),
                error: Some(err.into()),
            });
        }

        match self.environment(hook, &snapshot) {
            Ok(env) => Invocation::Idle { snapshot, env },
            Err(err) => Invocation::Done(Outcome { snapshot, commands: Vec::new(), error: Some(err) }),
        }
    }

    /// Give the unit a name when the seed leaves it out.
    fn fill_identity(&self, snapshot: &mut Snapshot) {
        if snapshot.app_name.is_empty() {
            snapshot.app_name = match snapshot.unit_id.split_once('/') {
                Some((app, _)) => app.to_string(),
                None => match &self.metadata {
                    Some(metadata) if !metadata.name.is_empty() => metadata.name.clone(),
                    _ => DEFAULT_APP.to_string(),
                },
            };
        }
        if snapshot.unit_id.is_empty() {
            snapshot.unit_id = format!("{}/0", snapshot.app_name);
        }
    }

    fn environment(&self, hook: &Hook, snapshot: &Snapshot) -> anyhow::Result<SimEnv> {
        let config = &self.config;
        let mut sim = SimEnv::new()
            .with_var(env::MODEL_NAME, &config.model_name)
            .with_var(env::MODEL_UUID, &config.model_uuid)
            .with_var(env::VERSION, &config.juju_version)
            .with_var(env::CHARM_DIR, config.charm_dir.to_string_lossy())
            .with_var(env::UNIT_NAME, &snapshot.unit_id)
            .with_var(env::DISPATCH_PATH, hook.dispatch_path());

        if hook.is_action() {
            sim.set_var(env::ACTION_NAME, hook.name());
        } else {
            sim.set_var(env::HOOK_NAME, hook.name());
        }
        if let Some(id) = hook.relation_id() {
            sim.set_var(env::RELATION_ID, id);
        }
        if let Some(unit) = hook.remote_unit() {
            sim.set_var(env::REMOTE_UNIT, unit);
        }
        if let Some(app) = hook.remote_app() {
            sim.set_var(env::REMOTE_APP, app);
        }
        if let Some(metadata) = &self.metadata {
            sim.write_file(config.charm_dir.join(env::METADATA_FILE), metadata.to_yaml()?);
        }

        Ok(sim)
    }
}

#[cfg(test)]
mod tests {
    use hooksim_core::SnapshotError;

    use super::*;

    #[test]
    fn identity_filled_from_metadata() {
        let ctx = Context::new(|_: &mut HookClient<'_>| Ok(()))
            .with_metadata(CharmMetadata { name: "redis".into(), ..CharmMetadata::default() });

        let outcome = ctx.run("install", Snapshot::default());

        assert!(outcome.is_ok());
        assert_eq!(outcome.snapshot.app_name, "redis");
        assert_eq!(outcome.snapshot.unit_id, "redis/0");
    }

    #[test]
    fn invocation_steps_idle_running_done() {
        let charm = |client: &mut HookClient<'_>| -> anyhow::Result<()> {
            client.state_set("ran", "yes")?;
            Ok(())
        };
        let config = DispatcherConfig::default();
        let idle = Invocation::Idle { snapshot: Snapshot::default(), env: SimEnv::new() };

        let running = idle.step(&charm, config);
        assert!(matches!(running, Invocation::Running { .. }));

        let done = running.step(&charm, config).step(&charm, config);
        assert!(matches!(done, Invocation::Done(_)));

        let outcome = done.execute(&charm, config);
        assert!(outcome.is_ok());
        assert_eq!(outcome.command_names(), vec!["state-set"]);
        assert_eq!(outcome.snapshot.stored_state["ran"], "yes");
    }

    #[test]
    fn rejected_seed_skips_handler() {
        let ctx = Context::new(|client: &mut HookClient<'_>| {
            client.state_set("ran", "yes")?;
            Ok(())
        });
        let seed = Snapshot {
            secrets: vec![hooksim_core::Secret::new("secret:a"), hooksim_core::Secret::new("secret:a")],
            ..Snapshot::default()
        };

        let outcome = ctx.run("install", seed);

        assert!(outcome.commands.is_empty());
        assert!(outcome.snapshot.stored_state.is_empty());
        let err = outcome.error().unwrap().downcast_ref::<SnapshotError>();
        assert_eq!(err, Some(&SnapshotError::DuplicateSecretId("secret:a".into())));
    }
}
