//! In-memory environment for unit tests.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use crate::env::{EnvError, HookEnv};

#[derive(Debug, Clone, Default)]
pub(crate) struct MapEnv {
    vars: BTreeMap<String, String>,
    files: BTreeMap<PathBuf, Vec<u8>>,
}

impl MapEnv {
    pub(crate) fn new<K: Into<String>, V: Into<String>>(
        vars: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        Self {
            vars: vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            files: BTreeMap::new(),
        }
    }

    pub(crate) fn with_file(mut self, path: &str, contents: &str) -> Self {
        self.files.insert(PathBuf::from(path), contents.as_bytes().to_vec());
        self
    }
}

impl HookEnv for MapEnv {
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
