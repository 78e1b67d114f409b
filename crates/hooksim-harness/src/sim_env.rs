//! In-memory environment view.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use hooksim_core::{EnvError, HookEnv};

/// Environment variables and files of a simulated hook, held in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimEnv {
    vars: BTreeMap<String, String>,
    files: BTreeMap<PathBuf, Vec<u8>>,
}

impl SimEnv {
    /// Empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable.
    pub fn set_var(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    /// Set a variable, builder style.
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_var(name, value);
        self
    }

    /// Place a file.
    pub fn write_file(&mut self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), contents.into());
    }

    /// All variables, sorted by name.
    pub fn vars(&self) -> &BTreeMap<String, String> {
        &self.vars
    }
}

impl HookEnv for SimEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>, EnvError> {
        self.files.get(path).cloned().ok_or_else(|| EnvError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        })
    }
}
