//! Typed hook tool calls.

use std::collections::{BTreeMap, BTreeSet};

use hooksim_core::{
    AppStatusReport, CommandRunner, DataBag, HookEnv, LogLevel, RotatePolicy, SecretInfo,
    SecretOwner, StatusReport, reconcile,
};
use hooksim_proto::{CommandLine, HookCommand, Port, StatusName, output};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::debug;

use crate::error::ClientError;

/// Optional settings of a new secret.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddSecretOptions {
    /// Owning scope. The platform defaults to the application.
    pub owner: Option<SecretOwner>,
    /// Label to find the secret by.
    pub label: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Rotation schedule.
    pub rotate: Option<RotatePolicy>,
    /// Expiry timestamp.
    pub expire: Option<String>,
}

/// Changes to an existing secret. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretUpdate {
    /// Replacement content. Empty keeps the current content.
    pub content: BTreeMap<String, String>,
    /// New owner.
    pub owner: Option<SecretOwner>,
    /// New label.
    pub label: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New rotation schedule.
    pub rotate: Option<RotatePolicy>,
    /// New expiry.
    pub expire: Option<String>,
}

#[derive(Deserialize)]
struct ApplicationStatus {
    #[serde(rename = "application-status")]
    application_status: AppStatusReport,
}

#[derive(Deserialize)]
struct ModelBinding {
    uuid: String,
}

/// Charm-facing API over a [`CommandRunner`].
///
/// Every method issues exactly the tool calls a charm would make against a
/// real unit, so the same charm code runs against the simulator.
pub struct HookClient<'a> {
    runner: &'a mut dyn CommandRunner,
    env: &'a dyn HookEnv,
}

impl<'a> HookClient<'a> {
    /// Client issuing calls through `runner`.
    pub fn new(runner: &'a mut dyn CommandRunner, env: &'a dyn HookEnv) -> Self {
        Self { runner, env }
    }

    /// Environment of the running hook.
    pub fn env(&self) -> &dyn HookEnv {
        self.env
    }

    fn exec(&mut self, line: CommandLine) -> Result<Vec<u8>, ClientError> {
        let (command, args) = line.into_parts();
        Ok(self.runner.run(command.name(), &args)?)
    }

    fn call(&mut self, line: CommandLine) -> Result<(), ClientError> {
        self.exec(line).map(drop)
    }

    fn query<T: DeserializeOwned>(&mut self, line: CommandLine) -> Result<T, ClientError> {
        let command = line.command();
        let out = self.exec(line.json())?;
        output::decode_json(&out).map_err(|source| ClientError::Decode { command, source })
    }

    // Status and identity

    /// Unit status.
    pub fn status_get(&mut self) -> Result<StatusReport, ClientError> {
        self.query(CommandLine::new(HookCommand::StatusGet).flag("include-data"))
    }

    /// Application status with unit statuses. Leader only.
    pub fn app_status_get(&mut self) -> Result<AppStatusReport, ClientError> {
        let status: ApplicationStatus = self.query(
            CommandLine::new(HookCommand::StatusGet).flag("include-data").flag("application"),
        )?;
        Ok(status.application_status)
    }

    /// Set the unit status.
    pub fn status_set(&mut self, status: StatusName, message: &str) -> Result<(), ClientError> {
        self.call(CommandLine::new(HookCommand::StatusSet).arg(status.as_str()).text(message))
    }

    /// Set the application status. Leader only.
    pub fn app_status_set(&mut self, status: StatusName, message: &str) -> Result<(), ClientError> {
        self.call(
            CommandLine::new(HookCommand::StatusSet)
                .flag("application")
                .arg(status.as_str())
                .text(message),
        )
    }

    /// Whole charm configuration.
    pub fn config(&mut self) -> Result<BTreeMap<String, Value>, ClientError> {
        self.query(CommandLine::new(HookCommand::ConfigGet))
    }

    /// One configuration value, `None` when unset.
    pub fn config_get<T: DeserializeOwned>(&mut self, key: &str) -> Result<Option<T>, ClientError> {
        self.query(CommandLine::new(HookCommand::ConfigGet).arg(key))
    }

    /// Whether this unit leads its application.
    pub fn is_leader(&mut self) -> Result<bool, ClientError> {
        self.query(CommandLine::new(HookCommand::IsLeader))
    }

    /// Report the workload version.
    pub fn set_application_version(&mut self, version: &str) -> Result<(), ClientError> {
        self.call(CommandLine::new(HookCommand::ApplicationVersionSet).arg(version))
    }

    /// Goal state of the unit and its relations.
    pub fn goal_state(&mut self) -> Result<Value, ClientError> {
        self.query(CommandLine::new(HookCommand::GoalState))
    }

    /// Path of an attached resource.
    pub fn resource_get(&mut self, name: &str) -> Result<String, ClientError> {
        self.query(CommandLine::new(HookCommand::ResourceGet).arg(name))
    }

    // Relations

    /// Ids of the relations on `endpoint`.
    pub fn relation_ids(&mut self, endpoint: &str) -> Result<Vec<String>, ClientError> {
        self.query(CommandLine::new(HookCommand::RelationIds).arg(endpoint))
    }

    /// Unit bag of `unit` in a relation.
    pub fn relation_get(&mut self, relation_id: &str, unit: &str) -> Result<DataBag, ClientError> {
        self.query(
            CommandLine::new(HookCommand::RelationGet).option("relation", relation_id).arg("-").arg(unit),
        )
    }

    /// One key of the unit bag of `unit`.
    pub fn relation_get_key(
        &mut self,
        relation_id: &str,
        unit: &str,
        key: &str,
    ) -> Result<Option<String>, ClientError> {
        self.query(
            CommandLine::new(HookCommand::RelationGet).option("relation", relation_id).arg(key).arg(unit),
        )
    }

    /// Application bag of `app` in a relation.
    pub fn relation_get_app(&mut self, relation_id: &str, app: &str) -> Result<DataBag, ClientError> {
        self.query(
            CommandLine::new(HookCommand::RelationGet)
                .option("relation", relation_id)
                .flag("app")
                .arg("-")
                .arg(app),
        )
    }

    /// Remote units of a relation, sorted.
    pub fn relation_list(&mut self, relation_id: &str) -> Result<Vec<String>, ClientError> {
        self.query(CommandLine::new(HookCommand::RelationList).option("relation", relation_id))
    }

    /// Remote application of a relation.
    pub fn relation_remote_app(&mut self, relation_id: &str) -> Result<String, ClientError> {
        self.query(
            CommandLine::new(HookCommand::RelationList).option("relation", relation_id).flag("app"),
        )
    }

    /// Merge `data` into the local unit bag. Empty values delete keys.
    pub fn relation_set(&mut self, relation_id: &str, data: &DataBag) -> Result<(), ClientError> {
        self.call(CommandLine::new(HookCommand::RelationSet).option("relation", relation_id).pairs(data))
    }

    /// Merge `data` into the local application bag. Leader only.
    pub fn relation_set_app(&mut self, relation_id: &str, data: &DataBag) -> Result<(), ClientError> {
        self.call(
            CommandLine::new(HookCommand::RelationSet)
                .option("relation", relation_id)
                .flag("app")
                .pairs(data),
        )
    }

    /// Model the remote side of a relation lives in.
    pub fn relation_model_uuid(&mut self, relation_id: &str) -> Result<String, ClientError> {
        let binding: ModelBinding = self
            .query(CommandLine::new(HookCommand::RelationModelGet).option("relation", relation_id))?;
        Ok(binding.uuid)
    }

    // Secrets

    /// Create a secret, returning its id.
    pub fn secret_add(
        &mut self,
        content: &BTreeMap<String, String>,
        options: AddSecretOptions,
    ) -> Result<String, ClientError> {
        self.query(
            CommandLine::new(HookCommand::SecretAdd)
                .pairs(content)
                .option_opt("owner", options.owner.map(SecretOwner::as_str))
                .option_opt("label", options.label)
                .option_opt("description", options.description)
                .option_opt("rotate", options.rotate.map(RotatePolicy::as_str))
                .option_opt("expire", options.expire),
        )
    }

    /// Content of a secret, by id.
    pub fn secret_get(&mut self, id: &str) -> Result<BTreeMap<String, String>, ClientError> {
        self.query(CommandLine::new(HookCommand::SecretGet).arg(id))
    }

    /// Content of a secret, by label.
    pub fn secret_get_by_label(
        &mut self,
        label: &str,
    ) -> Result<BTreeMap<String, String>, ClientError> {
        self.query(CommandLine::new(HookCommand::SecretGet).option("label", label))
    }

    /// Visible secret ids. `None` when no secret exists at all.
    pub fn secret_ids(&mut self) -> Result<Option<Vec<String>>, ClientError> {
        self.query(CommandLine::new(HookCommand::SecretIds))
    }

    /// Metadata of a secret, by id.
    pub fn secret_info(&mut self, id: &str) -> Result<SecretInfo, ClientError> {
        self.secret_info_query(CommandLine::new(HookCommand::SecretInfoGet).arg(id))
    }

    /// Metadata of a secret, by label.
    pub fn secret_info_by_label(&mut self, label: &str) -> Result<SecretInfo, ClientError> {
        self.secret_info_query(CommandLine::new(HookCommand::SecretInfoGet).option("label", label))
    }

    fn secret_info_query(&mut self, line: CommandLine) -> Result<SecretInfo, ClientError> {
        let command = line.command();
        let infos: BTreeMap<String, SecretInfo> = self.query(line)?;
        infos.into_values().next().ok_or_else(|| ClientError::Decode {
            command,
            source: serde::de::Error::custom("empty secret info"),
        })
    }

    /// Update a secret. Leader only; a no-op for other units.
    pub fn secret_set(&mut self, id: &str, update: SecretUpdate) -> Result<(), ClientError> {
        self.call(
            CommandLine::new(HookCommand::SecretSet)
                .arg(id)
                .pairs(&update.content)
                .option_opt("owner", update.owner.map(SecretOwner::as_str))
                .option_opt("label", update.label)
                .option_opt("description", update.description)
                .option_opt("rotate", update.rotate.map(RotatePolicy::as_str))
                .option_opt("expire", update.expire),
        )
    }

    /// Grant a relation, or one unit of it, access to a secret.
    pub fn secret_grant(
        &mut self,
        id: &str,
        relation_id: &str,
        unit: Option<&str>,
    ) -> Result<(), ClientError> {
        self.call(
            CommandLine::new(HookCommand::SecretGrant)
                .arg(id)
                .option("relation", relation_id)
                .option_opt("unit", unit),
        )
    }

    /// Revoke a grant.
    pub fn secret_revoke(&mut self, id: &str, relation_id: &str) -> Result<(), ClientError> {
        self.call(CommandLine::new(HookCommand::SecretRevoke).arg(id).option("relation", relation_id))
    }

    /// Remove a secret, by id.
    pub fn secret_remove(&mut self, id: &str) -> Result<(), ClientError> {
        self.call(CommandLine::new(HookCommand::SecretRemove).arg(id))
    }

    /// Remove the first secret whose label contains `fragment`.
    pub fn secret_remove_by_label(&mut self, fragment: &str) -> Result<(), ClientError> {
        self.call(CommandLine::new(HookCommand::SecretRemove).option("label", fragment))
    }

    // Stored state

    /// Stored value of `key`.
    pub fn state_get(&mut self, key: &str) -> Result<String, ClientError> {
        self.query(CommandLine::new(HookCommand::StateGet).arg(key))
    }

    /// All stored state.
    pub fn state_get_all(&mut self) -> Result<BTreeMap<String, String>, ClientError> {
        self.query(CommandLine::new(HookCommand::StateGet))
    }

    /// Store `value` under `key`.
    pub fn state_set(&mut self, key: &str, value: &str) -> Result<(), ClientError> {
        self.call(CommandLine::new(HookCommand::StateSet).pair(key, value))
    }

    /// Forget `key`.
    pub fn state_delete(&mut self, key: &str) -> Result<(), ClientError> {
        self.call(CommandLine::new(HookCommand::StateDelete).arg(key))
    }

    // Ports

    /// Open one port.
    pub fn open_port(&mut self, port: Port) -> Result<(), ClientError> {
        self.call(CommandLine::new(HookCommand::OpenPort).arg(port.key()))
    }

    /// Close one port.
    pub fn close_port(&mut self, port: Port) -> Result<(), ClientError> {
        self.call(CommandLine::new(HookCommand::ClosePort).arg(port.key()))
    }

    /// Ports currently open.
    pub fn opened_ports(&mut self) -> Result<BTreeSet<Port>, ClientError> {
        let tokens: Vec<String> = self.query(CommandLine::new(HookCommand::OpenedPorts))?;
        Ok(tokens.iter().map(|token| token.parse::<Port>()).collect::<Result<BTreeSet<_>, _>>()?)
    }

    /// Make the open ports exactly `desired`.
    ///
    /// Opens what is missing and closes what is extra, each through the
    /// single-port tools. Calling it twice with the same set is a no-op the
    /// second time.
    pub fn set_ports(&mut self, desired: impl IntoIterator<Item = Port>) -> Result<(), ClientError> {
        let desired: BTreeSet<Port> = desired.into_iter().collect();
        let current = self.opened_ports()?;
        let plan = reconcile(&desired, &current);
        debug!(open = plan.open.len(), close = plan.close.len(), "reconciling ports");

        for port in plan.open {
            self.open_port(port)?;
        }
        for port in plan.close {
            self.close_port(port)?;
        }
        Ok(())
    }

    // Actions

    /// All action parameters.
    pub fn action_params(&mut self) -> Result<BTreeMap<String, Value>, ClientError> {
        self.query(CommandLine::new(HookCommand::ActionGet))
    }

    /// One action parameter, dotted keys reaching into nested values.
    pub fn action_get<T: DeserializeOwned>(&mut self, key: &str) -> Result<Option<T>, ClientError> {
        self.query(CommandLine::new(HookCommand::ActionGet).arg(key))
    }

    /// Record action results.
    pub fn action_set(&mut self, results: &BTreeMap<String, String>) -> Result<(), ClientError> {
        self.call(CommandLine::new(HookCommand::ActionSet).pairs(results))
    }

    /// Report progress of the running action.
    pub fn action_log(&mut self, message: &str) -> Result<(), ClientError> {
        self.call(CommandLine::new(HookCommand::ActionLog).text(message))
    }

    /// Mark the running action as failed.
    pub fn action_fail(&mut self, message: &str) -> Result<(), ClientError> {
        self.call(CommandLine::new(HookCommand::ActionFail).text(message))
    }

    // Logging

    /// Write to the unit log.
    pub fn log(&mut self, level: LogLevel, message: &str) -> Result<(), ClientError> {
        self.call(CommandLine::new(HookCommand::JujuLog).option("log-level", level.as_str()).text(message))
    }
}
