//! Command dispatch table.
//!
//! [`Dispatcher`] owns the [`Snapshot`] for one invocation and answers hook
//! tool calls against it. Lookup is an exhaustive match over [`HookCommand`],
//! so adding a tool without a handler does not compile.
//!
//! Each call:
//!
//! 1. resets the transient output/error fields and records the call
//! 2. refuses action-only tools when no action is running
//! 3. decodes the arguments with [`HookArgs`]
//! 4. runs the handler, which alone validates and mutates the snapshot
//! 5. renders the result in the requested format
//!
//! Charm code does not see the dispatcher directly. It talks to a
//! [`CommandRunner`], which the invocation context injects.

use std::collections::BTreeMap;

use hooksim_proto::{HookArgs, HookCommand, ProtocolError, output};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    action,
    env::HookEnv,
    error::HookError,
    logging, ports, relation, resource,
    secret::{self, SecretIdGenerator},
    state::Snapshot,
    status, stored,
};

/// Executes hook tools by name.
///
/// The seam between charm code and the platform: production code would
/// spawn the real tool, a simulation answers from a [`Snapshot`].
pub trait CommandRunner {
    /// Run `name` with `args`, returning the tool's standard output.
    fn run(&mut self, name: &str, args: &[String]) -> Result<Vec<u8>, HookError>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &mut R {
    fn run(&mut self, name: &str, args: &[String]) -> Result<Vec<u8>, HookError> {
        (**self).run(name, args)
    }
}

/// Dispatcher configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Seed for generated secret ids.
    pub seed: u64,
}

/// One command issued during an invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandRecord {
    /// Tool name as invoked, known or not.
    pub name: String,
    /// Raw arguments.
    pub args: Vec<String>,
}

/// Decoded call handed to a handler.
pub(crate) struct Request<'a> {
    pub(crate) command: HookCommand,
    pub(crate) args: HookArgs,
    pub(crate) env: &'a dyn HookEnv,
}

impl Request<'_> {
    pub(crate) fn malformed(&self, detail: impl Into<String>) -> HookError {
        HookError::MalformedArguments { command: self.command, detail: detail.into() }
    }

    pub(crate) fn not_found(&self, what: impl Into<String>) -> HookError {
        HookError::NotFound { command: self.command, what: what.into() }
    }

    pub(crate) fn denied(&self, detail: impl Into<String>) -> HookError {
        HookError::PermissionDenied { command: self.command, detail: detail.into() }
    }

    pub(crate) fn protocol(&self, err: ProtocolError) -> HookError {
        HookError::from_protocol(self.command, err)
    }

    /// First bare positional token.
    pub(crate) fn first(&self) -> Option<&str> {
        self.args.bare().next()
    }

    /// Positional `key=value` pairs. Every key must be non-empty.
    pub(crate) fn pairs(&self) -> Result<BTreeMap<String, String>, HookError> {
        let pairs = self.args.pairs();
        if pairs.contains_key("") {
            return Err(self.malformed("empty key"));
        }
        Ok(pairs)
    }

    /// `--relation=` / `-r`, else the relation of the running hook.
    pub(crate) fn relation_id(&self) -> Result<String, HookError> {
        match self.args.option("relation") {
            Some(id) if !id.is_empty() => Ok(id.to_string()),
            _ => self.env.relation_id().ok_or_else(|| self.malformed("no relation id specified")),
        }
    }
}

/// In-memory command table for one invocation.
pub struct Dispatcher<E> {
    snapshot: Snapshot,
    env: E,
    secret_ids: SecretIdGenerator,
    output: Vec<u8>,
    error: Option<HookError>,
    history: Vec<CommandRecord>,
}

impl<E: HookEnv> Dispatcher<E> {
    /// Take ownership of `snapshot` for the duration of an invocation.
    ///
    /// An empty `unit_id` is filled from the environment, and an empty
    /// `app_name` from the unit id.
    pub fn new(mut snapshot: Snapshot, env: E, config: DispatcherConfig) -> Self {
        if snapshot.unit_id.is_empty() {
            snapshot.unit_id = env.unit_name().unwrap_or_default();
        }
        if snapshot.app_name.is_empty()
            && let Some((app, _)) = snapshot.unit_id.split_once('/')
        {
            snapshot.app_name = app.to_string();
        }

        Self {
            snapshot,
            env,
            secret_ids: SecretIdGenerator::new(config.seed),
            output: Vec::new(),
            error: None,
            history: Vec::new(),
        }
    }

    /// Current state of the simulated world.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Environment view the handlers consult.
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Output of the most recent call. Empty when it failed.
    pub fn last_output(&self) -> &[u8] {
        &self.output
    }

    /// Error of the most recent call, if it failed.
    pub fn last_error(&self) -> Option<&HookError> {
        self.error.as_ref()
    }

    /// Every call issued so far, in order.
    pub fn history(&self) -> &[CommandRecord] {
        &self.history
    }

    /// Release the snapshot and the command record.
    pub fn into_parts(self) -> (Snapshot, Vec<CommandRecord>) {
        (self.snapshot, self.history)
    }

    /// Run one command.
    pub fn dispatch(&mut self, command: HookCommand, args: &[String]) -> Result<Vec<u8>, HookError> {
        self.begin(command.name(), args);
        let result = self.execute(command, args);
        self.finish(result)
    }

    fn begin(&mut self, name: &str, args: &[String]) {
        self.output.clear();
        self.error = None;
        self.history.push(CommandRecord { name: name.to_string(), args: args.to_vec() });
        debug!(command = name, ?args, "hook tool");
    }

    fn finish(&mut self, result: Result<Vec<u8>, HookError>) -> Result<Vec<u8>, HookError> {
        match &result {
            Ok(output) => self.output.clone_from(output),
            Err(err) => {
                warn!(error = %err, "hook tool failed");
                self.error = Some(err.clone());
            },
        }
        result
    }

    fn execute(&mut self, command: HookCommand, args: &[String]) -> Result<Vec<u8>, HookError> {
        if command.requires_action() && self.env.action_name().is_none() {
            return Err(HookError::NotInActionContext { command });
        }

        let args = HookArgs::parse(args).map_err(|e| HookError::from_protocol(command, e))?;
        let format = args.format();
        let request = Request { command, args, env: &self.env };
        let snapshot = &mut self.snapshot;

        let value: Value = match command {
            HookCommand::StatusGet => status::status_get(snapshot, &request),
            HookCommand::StatusSet => status::status_set(snapshot, &request),
            HookCommand::ConfigGet => status::config_get(snapshot, &request),
            HookCommand::IsLeader => status::is_leader(snapshot, &request),
            HookCommand::ApplicationVersionSet => {
                status::application_version_set(snapshot, &request)
            },
            HookCommand::GoalState => relation::goal_state(snapshot, &request),
            HookCommand::ResourceGet => resource::resource_get(snapshot, &request),
            HookCommand::RelationIds => relation::relation_ids(snapshot, &request),
            HookCommand::RelationGet => relation::relation_get(snapshot, &request),
            HookCommand::RelationList => relation::relation_list(snapshot, &request),
            HookCommand::RelationSet => relation::relation_set(snapshot, &request),
            HookCommand::RelationModelGet => relation::relation_model_get(snapshot, &request),
            HookCommand::SecretAdd => secret::secret_add(snapshot, &request, &mut self.secret_ids),
            HookCommand::SecretGet => secret::secret_get(snapshot, &request),
            HookCommand::SecretSet => secret::secret_set(snapshot, &request),
            HookCommand::SecretGrant => secret::secret_grant(snapshot, &request),
            HookCommand::SecretRemove => secret::secret_remove(snapshot, &request),
            HookCommand::SecretRevoke => secret::secret_revoke(snapshot, &request),
            HookCommand::SecretIds => secret::secret_ids(snapshot, &request),
            HookCommand::SecretInfoGet => secret::secret_info_get(snapshot, &request),
            HookCommand::StateGet => stored::state_get(snapshot, &request),
            HookCommand::StateSet => stored::state_set(snapshot, &request),
            HookCommand::StateDelete => stored::state_delete(snapshot, &request),
            HookCommand::OpenPort => ports::open_port(snapshot, &request),
            HookCommand::ClosePort => ports::close_port(snapshot, &request),
            HookCommand::OpenedPorts => ports::opened_ports(snapshot, &request),
            HookCommand::ActionGet => action::action_get(snapshot, &request),
            HookCommand::ActionSet => action::action_set(snapshot, &request),
            HookCommand::ActionLog => action::action_log(snapshot, &request),
            HookCommand::ActionFail => action::action_fail(snapshot, &request),
            HookCommand::JujuLog => logging::juju_log(snapshot, &request),
        }?;

        output::encode(format, &value).map_err(|e| HookError::from_protocol(command, e))
    }
}

impl<E: HookEnv> CommandRunner for Dispatcher<E> {
    fn run(&mut self, name: &str, args: &[String]) -> Result<Vec<u8>, HookError> {
        match name.parse::<HookCommand>() {
            Ok(command) => self.dispatch(command, args),
            Err(err) => {
                self.begin(name, args);
                let err = match err {
                    ProtocolError::UnknownCommand(name) => HookError::UnknownCommand(name),
                    other => HookError::UnknownCommand(other.to_string()),
                };
                self.finish(Err(err))
            },
        }
    }
}
