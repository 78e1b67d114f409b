//! Simulation configuration.

use std::path::PathBuf;

/// Identity of the simulated model and platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimConfig {
    /// `JUJU_MODEL_NAME`
    pub model_name: String,
    /// `JUJU_MODEL_UUID`
    pub model_uuid: String,
    /// `JUJU_VERSION`
    pub juju_version: String,
    /// `JUJU_CHARM_DIR`; `metadata.yaml` is placed here.
    pub charm_dir: PathBuf,
    /// Seed for generated secret ids.
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            model_name: "test-model".to_string(),
            model_uuid: "00000000-0000-4000-8000-000000000000".to_string(),
            juju_version: "3.6.0".to_string(),
            charm_dir: PathBuf::from("/charm"),
            seed: 0,
        }
    }
}
