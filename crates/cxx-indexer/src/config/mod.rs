//! Engine settings.
//!
//! Settings are split into one file per category. [`EngineSettings`]
//! aggregates them and applies partial updates from a JSON payload or from a
//! `cxx-indexer.toml` project file. Every source goes through the same
//! private `*Patch` structs, then `normalize()` clamps the result.

pub(crate) mod front_end;
pub(crate) mod indexing;
pub(crate) mod logging;
pub(crate) mod persistence;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use front_end::FrontEndSettingsPatch;
pub use front_end::FrontEndSettings;
use indexing::IndexingSettingsPatch;
pub use indexing::{
    IndexingSettings, MAX_DEFINE_CACHE_CAPACITY, MAX_MAX_FILE_SIZE_KB, MAX_PROGRESS_EVERY, MIN_DEFINE_CACHE_CAPACITY,
    MIN_MAX_FILE_SIZE_KB, MIN_PROGRESS_EVERY,
};
use logging::LoggingSettingsPatch;
pub use logging::{LogLevel, LoggingSettings};
use persistence::PersistenceSettingsPatch;
pub use persistence::PersistenceSettings;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{IndexError, Result};

pub const SETTINGS_SECTION_KEY: &str = "cxx-indexer";
pub const PROJECT_CONFIG_FILENAME: &str = "cxx-indexer.toml";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EngineSettings {
    pub indexing: IndexingSettings,
    pub front_end: FrontEndSettings,
    pub logging: LoggingSettings,
    pub persistence: PersistenceSettings,
}

impl EngineSettings {
    pub fn from_json_payload(payload: Option<&Value>) -> Self {
        let mut settings = Self::default();
        if let Some(payload) = payload {
            settings = settings.merged_with_payload(payload);
        }
        settings
    }

    pub fn merged_with_payload(
        &self,
        payload: &Value,
    ) -> Self {
        let mut merged = self.clone();

        for candidate in payload_candidates(payload) {
            if let Ok(patch) = serde_json::from_value::<EngineSettingsPatch>(candidate.clone()) {
                merged.apply_patch(patch);
            }
        }

        merged.normalize();
        merged
    }

    /// Settings from TOML text, layered over the defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let payload: Value = toml::from_str(content).map_err(|err| IndexError::Config(err.to_string()))?;
        Ok(Self::from_json_payload(Some(&payload)))
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| IndexError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    fn apply_patch(
        &mut self,
        patch: EngineSettingsPatch,
    ) {
        if let Some(p) = patch.indexing {
            self.indexing.apply_patch(p);
        }
        if let Some(p) = patch.front_end {
            self.front_end.apply_patch(p);
        }
        if let Some(p) = patch.logging {
            self.logging.apply_patch(p);
        }
        if let Some(p) = patch.persistence {
            self.persistence.apply_patch(p);
        }
    }

    fn normalize(&mut self) {
        self.indexing.normalize();
        self.front_end.normalize();
        self.persistence.normalize();
    }
}

/// Walks parent directories from `start` looking for `cxx-indexer.toml`.
pub fn find_project_config(start: &Path) -> Option<PathBuf> {
    let mut dir = if start.is_file() {
        start.parent()?
    } else {
        start
    };
    loop {
        let candidate = dir.join(PROJECT_CONFIG_FILENAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        dir = dir.parent()?;
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct EngineSettingsPatch {
    indexing: Option<IndexingSettingsPatch>,
    front_end: Option<FrontEndSettingsPatch>,
    logging: Option<LoggingSettingsPatch>,
    persistence: Option<PersistenceSettingsPatch>,
    #[serde(flatten)]
    _extra: HashMap<String, Value>,
}

fn payload_candidates(payload: &Value) -> Vec<Value> {
    let mut candidates = Vec::new();
    candidates.push(payload.clone());
    if let Some(scoped) = payload.get(SETTINGS_SECTION_KEY) {
        candidates.push(scoped.clone());
    }
    candidates
}

#[cfg(test)]
#[path = "../../tests/src/config/settings_tests.rs"]
mod tests;
