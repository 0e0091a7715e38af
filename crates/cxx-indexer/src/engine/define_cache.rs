//! Macro environments shared between units built with the same defines.

use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lru::LruCache;
use tracing::debug;

use crate::frontend::{BuildConfig, MacroEnv};

#[derive(Debug)]
struct CachedEnv {
    env: Arc<MacroEnv>,
    users: HashSet<PathBuf>,
}

/// Bounded, least-recently-used cache of [`MacroEnv`]s keyed by the
/// `:`-joined define list of a configuration.
#[derive(Debug)]
pub struct DefineCache {
    global_defines: Vec<String>,
    entries: LruCache<String, CachedEnv>,
}

impl DefineCache {
    pub fn new(
        capacity: usize,
        global_defines: Vec<String>,
    ) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            global_defines,
            entries: LruCache::new(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(
        &self,
        key: &str,
    ) -> bool {
        self.entries.contains(key)
    }

    pub fn key_for(
        &self,
        config: &BuildConfig,
    ) -> String {
        config.define_key(&self.global_defines)
    }

    /// The environment for `config`, recording `unit` as a user of it.
    pub fn get_or_insert(
        &mut self,
        config: &BuildConfig,
        unit: &Path,
    ) -> Arc<MacroEnv> {
        let key = self.key_for(config);
        if let Some(cached) = self.entries.get_mut(&key) {
            cached.users.insert(unit.to_path_buf());
            return cached.env.clone();
        }

        let defines: Vec<&str> = config.defines.iter().chain(&self.global_defines).map(String::as_str).collect();
        let env = Arc::new(MacroEnv::from_defines(&defines));
        debug!("define cache miss for `{key}` ({} macros)", env.len());
        let cached = CachedEnv {
            env: env.clone(),
            users: HashSet::from([unit.to_path_buf()]),
        };
        if let Some((evicted, _)) = self.entries.push(key, cached) {
            debug!("define cache evicting `{evicted}`");
        }
        env
    }

    /// Forgets `unit` and drops environments nothing else uses.
    pub fn release_unit(
        &mut self,
        unit: &Path,
    ) {
        let unused: Vec<String> = self
            .entries
            .iter_mut()
            .filter_map(|(key, cached)| {
                cached.users.remove(unit);
                cached.users.is_empty().then(|| key.clone())
            })
            .collect();
        for key in unused {
            self.entries.pop(&key);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/src/engine/define_cache_tests.rs"]
mod tests;
