use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PersistenceSettings {
    /// Used by `save` / `restore` when no file is given.
    pub state_file: Option<PathBuf>,
}

impl PersistenceSettings {
    pub(crate) fn apply_patch(
        &mut self,
        patch: PersistenceSettingsPatch,
    ) {
        if let Some(v) = patch.state_file {
            self.state_file = Some(PathBuf::from(v));
        }
    }

    pub(crate) fn normalize(&mut self) {
        if self.state_file.as_ref().is_some_and(|path| path.as_os_str().is_empty()) {
            self.state_file = None;
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct PersistenceSettingsPatch {
    pub(crate) state_file: Option<String>,
    #[serde(flatten)]
    pub(crate) _extra: HashMap<String, Value>,
}
