//! On-disk project state: the registered units and the file-id table.
//! Nothing semantic is persisted; restoring replays `submit` for each unit.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::Unit;
use crate::error::{IndexError, Result};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectState {
    pub schema_version: u32,
    #[serde(default)]
    pub files: Vec<(u32, PathBuf)>,
    #[serde(default)]
    pub units: Vec<Unit>,
}

impl ProjectState {
    pub fn new(
        files: Vec<(u32, PathBuf)>,
        units: Vec<Unit>,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            files,
            units,
        }
    }

    pub fn is_current(&self) -> bool {
        self.schema_version == SCHEMA_VERSION
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn write_to(
        &self,
        path: &Path,
    ) -> Result<()> {
        let io_error = |source| IndexError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        std::fs::write(path, self.to_json()?).map_err(io_error)?;
        debug!("saved {} units to {}", self.units.len(), path.display());
        Ok(())
    }

    pub fn read_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| IndexError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }
}

#[cfg(test)]
#[path = "../tests/src/persist_tests.rs"]
mod tests;
