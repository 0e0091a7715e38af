use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct FrontEndSettings {
    pub system_include_paths: Vec<String>,
    pub global_defines: Vec<String>,
    pub source_extensions: Vec<String>,
    pub header_extensions: Vec<String>,
}

impl Default for FrontEndSettings {
    fn default() -> Self {
        Self {
            system_include_paths: Vec::new(),
            global_defines: vec!["__GNUC__=4".to_string()],
            source_extensions: ["c", "cc", "cpp", "cxx", "m", "mm"].map(String::from).to_vec(),
            header_extensions: ["h", "hh", "hpp", "hxx"].map(String::from).to_vec(),
        }
    }
}

impl FrontEndSettings {
    pub(crate) fn apply_patch(
        &mut self,
        patch: FrontEndSettingsPatch,
    ) {
        if let Some(v) = patch.system_include_paths {
            self.system_include_paths = v;
        }
        if let Some(v) = patch.global_defines {
            self.global_defines = v;
        }
        if let Some(v) = patch.source_extensions {
            self.source_extensions = v;
        }
        if let Some(v) = patch.header_extensions {
            self.header_extensions = v;
        }
    }

    pub(crate) fn normalize(&mut self) {
        self.system_include_paths = dedup_trimmed(&self.system_include_paths);
        self.global_defines = dedup_trimmed(&self.global_defines);
        self.source_extensions = dedup_extensions(&self.source_extensions);
        self.header_extensions = dedup_extensions(&self.header_extensions);
    }

    pub fn system_include_dirs(&self) -> Vec<PathBuf> {
        self.system_include_paths.iter().map(PathBuf::from).collect()
    }

    pub fn is_source(
        &self,
        path: &Path,
    ) -> bool {
        has_extension(path, &self.source_extensions)
    }

    pub fn is_header(
        &self,
        path: &Path,
    ) -> bool {
        has_extension(path, &self.header_extensions)
    }
}

fn has_extension(
    path: &Path,
    extensions: &[String],
) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|known| known.eq_ignore_ascii_case(ext)))
}

fn dedup_trimmed(values: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

fn dedup_extensions(values: &[String]) -> Vec<String> {
    let trimmed: Vec<String> = values.iter().map(|v| v.trim().trim_start_matches('.').to_string()).collect();
    dedup_trimmed(&trimmed)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct FrontEndSettingsPatch {
    pub(crate) system_include_paths: Option<Vec<String>>,
    pub(crate) global_defines: Option<Vec<String>>,
    pub(crate) source_extensions: Option<Vec<String>>,
    pub(crate) header_extensions: Option<Vec<String>>,
    #[serde(flatten)]
    pub(crate) _extra: HashMap<String, Value>,
}
