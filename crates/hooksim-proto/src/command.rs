//! Hook tool command registry.
//!
//! The platform exposes a fixed set of tools. Each one is a variant of
//! [`HookCommand`]; the dispatcher matches on it exhaustively, so a new variant
//! does not compile until it has a handler.
//!
//! # Invariants
//!
//! - Name Uniqueness: every variant maps to exactly one tool name, and
//!   [`HookCommand::from_str`] is the inverse of [`HookCommand::name`].

use std::{fmt, str::FromStr};

use crate::errors::ProtocolError;

/// Every hook tool the simulator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HookCommand {
    // Status and identity
    /// `status-get`
    StatusGet,
    /// `status-set`
    StatusSet,
    /// `config-get`
    ConfigGet,
    /// `is-leader`
    IsLeader,
    /// `application-version-set`
    ApplicationVersionSet,
    /// `goal-state`
    GoalState,
    /// `resource-get`
    ResourceGet,

    // Relations
    /// `relation-ids`
    RelationIds,
    /// `relation-get`
    RelationGet,
    /// `relation-list`
    RelationList,
    /// `relation-set`
    RelationSet,
    /// `relation-model-get`
    RelationModelGet,

    // Secrets
    /// `secret-add`
    SecretAdd,
    /// `secret-get`
    SecretGet,
    /// `secret-set`
    SecretSet,
    /// `secret-grant`
    SecretGrant,
    /// `secret-remove`
    SecretRemove,
    /// `secret-revoke`
    SecretRevoke,
    /// `secret-ids`
    SecretIds,
    /// `secret-info-get`
    SecretInfoGet,

    // Stored state
    /// `state-get`
    StateGet,
    /// `state-set`
    StateSet,
    /// `state-delete`
    StateDelete,

    // Ports
    /// `open-port`
    OpenPort,
    /// `close-port`
    ClosePort,
    /// `opened-ports`
    OpenedPorts,

    // Actions
    /// `action-get`
    ActionGet,
    /// `action-set`
    ActionSet,
    /// `action-log`
    ActionLog,
    /// `action-fail`
    ActionFail,

    // Logging
    /// `juju-log`
    JujuLog,
}

impl HookCommand {
    /// All commands, in registry order.
    pub const ALL: [Self; 31] = [
        Self::StatusGet,
        Self::StatusSet,
        Self::ConfigGet,
        Self::IsLeader,
        Self::ApplicationVersionSet,
        Self::GoalState,
        Self::ResourceGet,
        Self::RelationIds,
        Self::RelationGet,
        Self::RelationList,
        Self::RelationSet,
        Self::RelationModelGet,
        Self::SecretAdd,
        Self::SecretGet,
        Self::SecretSet,
        Self::SecretGrant,
        Self::SecretRemove,
        Self::SecretRevoke,
        Self::SecretIds,
        Self::SecretInfoGet,
        Self::StateGet,
        Self::StateSet,
        Self::StateDelete,
        Self::OpenPort,
        Self::ClosePort,
        Self::OpenedPorts,
        Self::ActionGet,
        Self::ActionSet,
        Self::ActionLog,
        Self::ActionFail,
        Self::JujuLog,
    ];

    /// Tool name as invoked on the platform.
    pub fn name(self) -> &'static str {
        match self {
            Self::StatusGet => "status-get",
            Self::StatusSet => "status-set",
            Self::ConfigGet => "config-get",
            Self::IsLeader => "is-leader",
            Self::ApplicationVersionSet => "application-version-set",
            Self::GoalState => "goal-state",
            Self::ResourceGet => "resource-get",
            Self::RelationIds => "relation-ids",
            Self::RelationGet => "relation-get",
            Self::RelationList => "relation-list",
            Self::RelationSet => "relation-set",
            Self::RelationModelGet => "relation-model-get",
            Self::SecretAdd => "secret-add",
            Self::SecretGet => "secret-get",
            Self::SecretSet => "secret-set",
            Self::SecretGrant => "secret-grant",
            Self::SecretRemove => "secret-remove",
            Self::SecretRevoke => "secret-revoke",
            Self::SecretIds => "secret-ids",
            Self::SecretInfoGet => "secret-info-get",
            Self::StateGet => "state-get",
            Self::StateSet => "state-set",
            Self::StateDelete => "state-delete",
            Self::OpenPort => "open-port",
            Self::ClosePort => "close-port",
            Self::OpenedPorts => "opened-ports",
            Self::ActionGet => "action-get",
            Self::ActionSet => "action-set",
            Self::ActionLog => "action-log",
            Self::ActionFail => "action-fail",
            Self::JujuLog => "juju-log",
        }
    }

    /// Whether the tool is only available while an action is running.
    pub fn requires_action(self) -> bool {
        matches!(self, Self::ActionGet | Self::ActionSet | Self::ActionLog | Self::ActionFail)
    }
}

impl fmt::Display for HookCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HookCommand {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|command| command.name() == s)
            .ok_or_else(|| ProtocolError::UnknownCommand(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn names_round_trip() {
        for command in HookCommand::ALL {
            assert_eq!(command.name().parse::<HookCommand>(), Ok(command));
        }
    }

    #[test]
    fn names_are_unique() {
        let names: HashSet<_> = HookCommand::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(names.len(), HookCommand::ALL.len());
    }

    #[test]
    fn unknown_name_is_rejected() {
        assert_eq!(
            "pebble-ready".parse::<HookCommand>(),
            Err(ProtocolError::UnknownCommand("pebble-ready".to_string()))
        );
    }

    #[test]
    fn only_action_tools_require_action() {
        let gated: Vec<_> =
            HookCommand::ALL.iter().copied().filter(|c| c.requires_action()).collect();
        assert_eq!(gated, vec![
            HookCommand::ActionGet,
            HookCommand::ActionSet,
            HookCommand::ActionLog,
            HookCommand::ActionFail,
        ]);
    }
}
