//! Simulated world of one unit.
//!
//! A [`Snapshot`] is everything a charm can observe or change through hook
//! tools during one invocation. Tests build one, hand it to the harness, and
//! assert on the one that comes back; feeding a returned snapshot into the
//! next run chains hooks.
//!
//! Only command handlers mutate a snapshot while an invocation is in flight.
//!
//! # Invariants
//!
//! - Relation ids are unique across `relations` and `peer_relations`
//! - Secret ids are unique
//! - `ports` never holds two entries with the same `(port, protocol)`
//!
//! [`Snapshot::validate`] checks the first two; the third holds by
//! construction.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use hooksim_proto::{Port, StatusName};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{error::SnapshotError, secret::normalize_id};

/// Key/value data bag of a relation.
pub type DataBag = BTreeMap<String, String>;

/// Workload status with its message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// Status name.
    pub name: StatusName,
    /// Free-form message shown next to the status.
    #[serde(default)]
    pub message: String,
}

impl Status {
    /// Status with a message.
    pub fn new(name: StatusName, message: impl Into<String>) -> Self {
        Self { name, message: message.into() }
    }

    /// `active` status.
    pub fn active(message: impl Into<String>) -> Self {
        Self::new(StatusName::Active, message)
    }

    /// `blocked` status.
    pub fn blocked(message: impl Into<String>) -> Self {
        Self::new(StatusName::Blocked, message)
    }

    /// `maintenance` status.
    pub fn maintenance(message: impl Into<String>) -> Self {
        Self::new(StatusName::Maintenance, message)
    }

    /// `waiting` status.
    pub fn waiting(message: impl Into<String>) -> Self {
        Self::new(StatusName::Waiting, message)
    }
}

/// Scope that owns a secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretOwner {
    /// Owned by this unit only.
    Unit,
    /// Owned by the application; managed by the leader.
    #[default]
    Application,
}

impl SecretOwner {
    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unit => "unit",
            Self::Application => "application",
        }
    }

    /// Parse a `--owner=` value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "unit" => Some(Self::Unit),
            "application" => Some(Self::Application),
            _ => None,
        }
    }
}

/// Rotation schedule of a secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotatePolicy {
    /// Never rotate.
    Never,
    /// Rotate every hour.
    Hourly,
    /// Rotate every day.
    Daily,
    /// Rotate every week.
    Weekly,
    /// Rotate every month.
    Monthly,
    /// Rotate every quarter.
    Quarterly,
    /// Rotate every year.
    Yearly,
}

impl RotatePolicy {
    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Never => "never",
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
        }
    }

    /// Parse a `--rotate=` value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "never" => Some(Self::Never),
            "hourly" => Some(Self::Hourly),
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            "quarterly" => Some(Self::Quarterly),
            "yearly" => Some(Self::Yearly),
            _ => None,
        }
    }
}

/// A secret visible to this unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Secret {
    /// Secret id, `secret:<xid>`.
    pub id: String,
    /// Optional label; not necessarily unique.
    pub label: Option<String>,
    /// Owning scope.
    pub owner: SecretOwner,
    /// Human-readable description.
    pub description: Option<String>,
    /// Rotation schedule.
    pub rotate: Option<RotatePolicy>,
    /// Expiry timestamp, as given to `--expire=`.
    pub expire: Option<String>,
    /// Secret content.
    pub content: BTreeMap<String, String>,
}

impl Secret {
    /// Application-owned secret with no content.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), ..Self::default() }
    }

    /// Set the label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the owner.
    pub fn with_owner(mut self, owner: SecretOwner) -> Self {
        self.owner = owner;
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the rotation schedule.
    pub fn with_rotate(mut self, rotate: RotatePolicy) -> Self {
        self.rotate = Some(rotate);
        self
    }

    /// Add content entries.
    pub fn with_content<K, V>(mut self, content: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.content.extend(content.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }
}

/// Integration between this application and a remote one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Relation {
    /// Relation id, `<endpoint>:<n>`.
    pub id: String,
    /// Local endpoint name.
    pub endpoint: String,
    /// Interface name.
    pub interface: String,
    /// Remote application name.
    pub remote_app_name: String,
    /// Model of the remote application, when it lives in another model.
    pub remote_model_uuid: Option<String>,
    /// Local application bag. `None` until first written.
    pub local_app_data: Option<DataBag>,
    /// Local unit bag. `None` until first written.
    pub local_unit_data: Option<DataBag>,
    /// Remote application bag.
    pub remote_app_data: DataBag,
    /// Remote unit bags, by unit id.
    pub remote_units_data: BTreeMap<String, DataBag>,
}

impl Relation {
    /// Relation on `endpoint` with the given id.
    pub fn new(endpoint: impl Into<String>, id: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into(), id: id.into(), ..Self::default() }
    }

    /// Set the interface name.
    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interface = interface.into();
        self
    }

    /// Set the remote application name.
    pub fn with_remote_app(mut self, name: impl Into<String>) -> Self {
        self.remote_app_name = name.into();
        self
    }

    /// Set the remote model.
    pub fn with_remote_model(mut self, uuid: impl Into<String>) -> Self {
        self.remote_model_uuid = Some(uuid.into());
        self
    }

    /// Add a remote unit with its bag.
    pub fn with_remote_unit(mut self, unit: impl Into<String>, data: DataBag) -> Self {
        self.remote_units_data.insert(unit.into(), data);
        self
    }

    /// Set the remote application bag.
    pub fn with_remote_app_data(mut self, data: DataBag) -> Self {
        self.remote_app_data = data;
        self
    }

    /// Set the local unit bag.
    pub fn with_local_unit_data(mut self, data: DataBag) -> Self {
        self.local_unit_data = Some(data);
        self
    }

    /// Set the local application bag.
    pub fn with_local_app_data(mut self, data: DataBag) -> Self {
        self.local_app_data = Some(data);
        self
    }
}

/// Relation among units of this application.
///
/// Every participant, the local unit included, is a peer. The application
/// bag is shared by all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeerRelation {
    /// Relation id, `<endpoint>:<n>`.
    pub id: String,
    /// Peer endpoint name.
    pub endpoint: String,
    /// Interface name.
    pub interface: String,
    /// Shared application bag. `None` until first written.
    pub local_app_data: Option<DataBag>,
    /// Local unit bag. `None` until first written.
    pub local_unit_data: Option<DataBag>,
    /// Bags of the other peers, by unit id.
    pub peers_data: BTreeMap<String, DataBag>,
}

impl PeerRelation {
    /// Peer relation on `endpoint` with the given id.
    pub fn new(endpoint: impl Into<String>, id: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into(), id: id.into(), ..Self::default() }
    }

    /// Set the interface name.
    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interface = interface.into();
        self
    }

    /// Add a peer unit with its bag.
    pub fn with_peer(mut self, unit: impl Into<String>, data: DataBag) -> Self {
        self.peers_data.insert(unit.into(), data);
        self
    }

    /// Set the local unit bag.
    pub fn with_local_unit_data(mut self, data: DataBag) -> Self {
        self.local_unit_data = Some(data);
        self
    }

    /// Set the shared application bag.
    pub fn with_local_app_data(mut self, data: DataBag) -> Self {
        self.local_app_data = Some(data);
        self
    }
}

/// Severity of a `juju-log` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// TRACE
    Trace,
    /// DEBUG
    Debug,
    /// INFO
    #[default]
    Info,
    /// WARNING
    Warning,
    /// ERROR
    Error,
    /// CRITICAL
    Critical,
}

impl LogLevel {
    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }

    /// Parse a `--log-level=` value, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "TRACE" => Some(Self::Trace),
            "DEBUG" => Some(Self::Debug),
            "INFO" => Some(Self::Info),
            "WARNING" | "WARN" => Some(Self::Warning),
            "ERROR" => Some(Self::Error),
            "CRITICAL" => Some(Self::Critical),
            _ => None,
        }
    }
}

/// One captured `juju-log` line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    /// Severity.
    pub level: LogLevel,
    /// Message text.
    pub message: String,
}

impl LogLine {
    /// Log line at `level`.
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self { level, message: message.into() }
    }
}

/// Simulated world of one unit for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    /// Whether this unit is the application leader.
    pub leader: bool,
    /// Unit workload status.
    pub unit_status: Status,
    /// Application status.
    pub app_status: Status,
    /// Charm configuration.
    pub config: BTreeMap<String, Value>,
    /// Secrets, in creation order.
    pub secrets: Vec<Secret>,
    /// Regular relations.
    pub relations: Vec<Relation>,
    /// Peer relations.
    pub peer_relations: Vec<PeerRelation>,
    /// Opened ports.
    pub ports: BTreeSet<Port>,
    /// Unit key/value state persisted across hooks.
    pub stored_state: BTreeMap<String, String>,
    /// Workload version reported by `application-version-set`.
    pub application_version: String,
    /// Application name.
    pub app_name: String,
    /// Unit id, `<app>/<n>`.
    pub unit_id: String,
    /// Captured `juju-log` lines.
    pub log_lines: Vec<LogLine>,
    /// Resource paths returned by `resource-get`, by resource name.
    pub resources: BTreeMap<String, String>,
    /// Action parameters. Only meaningful during an action.
    pub action_parameters: BTreeMap<String, Value>,
    /// Results recorded by `action-set`. Only meaningful during an action.
    pub action_results: BTreeMap<String, String>,
    /// Failure message recorded by `action-fail`.
    pub action_error: Option<String>,
    /// Messages recorded by `action-log`.
    pub action_logs: Vec<String>,
}

impl Snapshot {
    /// Check the data model invariants of a seed.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        let mut relation_ids = HashSet::new();
        let ids = self
            .relations
            .iter()
            .map(|r| r.id.as_str())
            .chain(self.peer_relations.iter().map(|r| r.id.as_str()));
        for id in ids {
            if !relation_ids.insert(id) {
                return Err(SnapshotError::DuplicateRelationId(id.to_string()));
            }
        }

        for relation in &self.relations {
            if relation.remote_units_data.keys().any(String::is_empty) {
                return Err(SnapshotError::EmptyUnitId(relation.id.clone()));
            }
        }
        for relation in &self.peer_relations {
            if relation.peers_data.keys().any(String::is_empty) {
                return Err(SnapshotError::EmptyUnitId(relation.id.clone()));
            }
        }

        let mut secret_ids = HashSet::new();
        for secret in &self.secrets {
            if !secret_ids.insert(normalize_id(&secret.id)) {
                return Err(SnapshotError::DuplicateSecretId(secret.id.clone()));
            }
        }

        Ok(())
    }

    /// Clear everything an action writes.
    ///
    /// Parameters survive only when `keep_parameters` is set, i.e. when the
    /// next invocation is itself an action.
    pub fn reset_action_fields(&mut self, keep_parameters: bool) {
        if !keep_parameters {
            self.action_parameters.clear();
        }
        self.action_results.clear();
        self.action_error = None;
        self.action_logs.clear();
    }
}

/// Build a [`DataBag`] from pairs.
pub fn bag<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> DataBag
where
    K: Into<String>,
    V: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}
