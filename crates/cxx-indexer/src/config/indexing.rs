use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

pub const MIN_MAX_FILE_SIZE_KB: u64 = 16;
pub const MAX_MAX_FILE_SIZE_KB: u64 = 1024 * 64;
pub const MIN_DEFINE_CACHE_CAPACITY: usize = 1;
pub const MAX_DEFINE_CACHE_CAPACITY: usize = 4096;
pub const MIN_PROGRESS_EVERY: usize = 1;
pub const MAX_PROGRESS_EVERY: usize = 10_000;

#[derive(Debug, Clone, PartialEq)]
pub struct IndexingSettings {
    pub max_file_size_kb: u64,
    pub define_cache_capacity: usize,
    pub progress_every: usize,
}

impl Default for IndexingSettings {
    fn default() -> Self {
        Self {
            max_file_size_kb: 2048,
            define_cache_capacity: 64,
            progress_every: 1,
        }
    }
}

impl IndexingSettings {
    pub(crate) fn apply_patch(
        &mut self,
        patch: IndexingSettingsPatch,
    ) {
        if let Some(v) = patch.max_file_size_kb {
            self.max_file_size_kb = v;
        }
        if let Some(v) = patch.define_cache_capacity {
            self.define_cache_capacity = v;
        }
        if let Some(v) = patch.progress_every {
            self.progress_every = v;
        }
    }

    pub(crate) fn normalize(&mut self) {
        self.max_file_size_kb = self.max_file_size_kb.clamp(MIN_MAX_FILE_SIZE_KB, MAX_MAX_FILE_SIZE_KB);
        self.define_cache_capacity =
            self.define_cache_capacity.clamp(MIN_DEFINE_CACHE_CAPACITY, MAX_DEFINE_CACHE_CAPACITY);
        self.progress_every = self.progress_every.clamp(MIN_PROGRESS_EVERY, MAX_PROGRESS_EVERY);
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_kb.saturating_mul(1024)
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct IndexingSettingsPatch {
    pub(crate) max_file_size_kb: Option<u64>,
    pub(crate) define_cache_capacity: Option<usize>,
    pub(crate) progress_every: Option<usize>,
    #[serde(flatten)]
    pub(crate) _extra: HashMap<String, Value>,
}
