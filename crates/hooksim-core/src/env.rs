//! Environment view of a running hook.
//!
//! The platform tells a charm who and where it is through environment
//! variables and files in the charm directory. Handlers never read the
//! process environment; they go through [`HookEnv`], so a simulation supplies
//! an in-memory view and tests stay hermetic.
//!
//! Empty values are treated as unset, which is how the platform itself
//! reports "no relation" or "no action".

use std::{collections::BTreeMap, path::PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// `JUJU_HOOK_NAME`
pub const HOOK_NAME: &str = "JUJU_HOOK_NAME";
/// `JUJU_ACTION_NAME`
pub const ACTION_NAME: &str = "JUJU_ACTION_NAME";
/// `JUJU_MODEL_NAME`
pub const MODEL_NAME: &str = "JUJU_MODEL_NAME";
/// `JUJU_MODEL_UUID`
pub const MODEL_UUID: &str = "JUJU_MODEL_UUID";
/// `JUJU_UNIT_NAME`
pub const UNIT_NAME: &str = "JUJU_UNIT_NAME";
/// `JUJU_VERSION`
pub const VERSION: &str = "JUJU_VERSION";
/// `JUJU_CHARM_DIR`
pub const CHARM_DIR: &str = "JUJU_CHARM_DIR";
/// `JUJU_DISPATCH_PATH`
pub const DISPATCH_PATH: &str = "JUJU_DISPATCH_PATH";
/// `JUJU_RELATION_ID`
pub const RELATION_ID: &str = "JUJU_RELATION_ID";
/// `JUJU_REMOTE_UNIT`
pub const REMOTE_UNIT: &str = "JUJU_REMOTE_UNIT";
/// `JUJU_REMOTE_APP`
pub const REMOTE_APP: &str = "JUJU_REMOTE_APP";

/// Name of the charm descriptor inside the charm directory.
pub const METADATA_FILE: &str = "metadata.yaml";

/// Failure reading the environment view.
#[derive(Error, Debug)]
pub enum EnvError {
    /// Required variable is unset or empty
    #[error("environment variable {0} is not set")]
    Missing(&'static str),

    /// File could not be read
    #[error("cannot read {path}: {source}")]
    Io {
        /// File that was read
        path: PathBuf,
        /// Underlying failure
        source: std::io::Error,
    },

    /// Charm descriptor is not valid YAML for [`CharmMetadata`]
    #[error("invalid charm metadata: {0}")]
    Metadata(#[from] serde_yaml::Error),
}

/// Read-only view of the hook environment.
///
/// Implementors supply [`HookEnv::var`] and [`HookEnv::read_file`]; the typed
/// getters are derived from them.
pub trait HookEnv {
    /// Raw variable lookup.
    fn var(&self, name: &str) -> Option<String>;

    /// Read a file, e.g. the charm descriptor.
    fn read_file(&self, path: &std::path::Path) -> Result<Vec<u8>, EnvError>;

    /// Variable value, `None` when unset or empty.
    fn non_empty(&self, name: &str) -> Option<String> {
        self.var(name).filter(|value| !value.is_empty())
    }

    /// Hook being run, e.g. `config-changed`.
    fn hook_name(&self) -> Option<String> {
        self.non_empty(HOOK_NAME)
    }

    /// Action being run. `None` outside actions.
    fn action_name(&self) -> Option<String> {
        self.non_empty(ACTION_NAME)
    }

    /// Model name.
    fn model_name(&self) -> Option<String> {
        self.non_empty(MODEL_NAME)
    }

    /// Model UUID.
    fn model_uuid(&self) -> Option<String> {
        self.non_empty(MODEL_UUID)
    }

    /// Unit id, `<app>/<n>`.
    fn unit_name(&self) -> Option<String> {
        self.non_empty(UNIT_NAME)
    }

    /// Platform version.
    fn juju_version(&self) -> Option<String> {
        self.non_empty(VERSION)
    }

    /// Dispatch path, `hooks/<hook>` or `actions/<action>`.
    fn dispatch_path(&self) -> Option<String> {
        self.non_empty(DISPATCH_PATH)
    }

    /// Relation of a relation hook.
    fn relation_id(&self) -> Option<String> {
        self.non_empty(RELATION_ID)
    }

    /// Remote unit of a relation hook.
    fn remote_unit(&self) -> Option<String> {
        self.non_empty(REMOTE_UNIT)
    }

    /// Remote application of a relation hook.
    fn remote_app(&self) -> Option<String> {
        self.non_empty(REMOTE_APP)
    }

    /// Charm directory.
    fn charm_dir(&self) -> Result<PathBuf, EnvError> {
        self.non_empty(CHARM_DIR).map(PathBuf::from).ok_or(EnvError::Missing(CHARM_DIR))
    }

    /// Parse `<charm dir>/metadata.yaml`.
    fn metadata(&self) -> Result<CharmMetadata, EnvError> {
        let bytes = self.read_file(&self.charm_dir()?.join(METADATA_FILE))?;
        CharmMetadata::from_yaml(&bytes)
    }
}

impl<T: HookEnv + ?Sized> HookEnv for &T {
    fn var(&self, name: &str) -> Option<String> {
        (**self).var(name)
    }

    fn read_file(&self, path: &std::path::Path) -> Result<Vec<u8>, EnvError> {
        (**self).read_file(path)
    }
}

/// Workload container declared by the charm.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerMeta {
    /// OCI image resource backing the container.
    pub resource: Option<String>,
}

/// Resource declared by the charm.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceMeta {
    /// `file` or `oci-image`.
    #[serde(rename = "type")]
    pub kind: String,
    /// File name for `file` resources.
    pub filename: Option<String>,
    /// Human-readable description.
    pub description: Option<String>,
}

/// Endpoint declared under `provides`, `requires` or `peers`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrationMeta {
    /// Interface name.
    pub interface: String,
    /// Maximum number of relations on this endpoint.
    pub limit: Option<u32>,
}

/// Subset of `metadata.yaml` the simulator consults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharmMetadata {
    /// Charm name.
    pub name: String,
    /// Workload containers, by name.
    pub containers: BTreeMap<String, ContainerMeta>,
    /// Resources, by name.
    pub resources: BTreeMap<String, ResourceMeta>,
    /// Provided endpoints.
    pub provides: BTreeMap<String, IntegrationMeta>,
    /// Required endpoints.
    pub requires: BTreeMap<String, IntegrationMeta>,
    /// Peer endpoints.
    pub peers: BTreeMap<String, IntegrationMeta>,
}

impl CharmMetadata {
    /// Parse a descriptor. Unknown keys are ignored.
    pub fn from_yaml(bytes: &[u8]) -> Result<Self, EnvError> {
        Ok(serde_yaml::from_slice(bytes)?)
    }

    /// Render as YAML, for writing into a simulated charm directory.
    pub fn to_yaml(&self) -> Result<String, EnvError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Whether `name` is a declared resource.
    pub fn declares_resource(&self, name: &str) -> bool {
        self.resources.contains_key(name)
    }
}
