//! Qualified-name index over every indexed document.
//!
//! Each symbol is filed under its fully qualified name and every right-hand
//! suffix of it, so `baz`, `Bar::baz` and `Foo::Bar::baz` all find
//! `Foo::Bar::baz`. Entries remember which path contributed which spelling,
//! which keeps re-indexing one file from disturbing what others contributed.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use crate::frontend::Document;
use crate::vfs::file_name;

/// Paths defining a key, and the full names that map to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameEntry {
    contributions: BTreeMap<PathBuf, BTreeSet<String>>,
}

impl NameEntry {
    pub fn new(
        path: PathBuf,
        name: String,
    ) -> Self {
        let mut entry = Self::default();
        entry.insert(path, name);
        entry
    }

    pub fn insert(
        &mut self,
        path: PathBuf,
        name: String,
    ) {
        self.contributions.entry(path).or_default().insert(name);
    }

    /// Set union with `other`.
    pub fn merge(
        &mut self,
        other: &NameEntry,
    ) {
        for (path, names) in &other.contributions {
            self.contributions
                .entry(path.clone())
                .or_default()
                .extend(names.iter().cloned());
        }
    }

    pub fn remove_path(
        &mut self,
        path: &Path,
    ) {
        self.contributions.remove(path);
    }

    pub fn is_empty(&self) -> bool {
        self.contributions.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.contributions.keys()
    }

    pub fn contains_path(
        &self,
        path: &Path,
    ) -> bool {
        self.contributions.contains_key(path)
    }

    pub fn names(&self) -> BTreeSet<String> {
        self.contributions.values().flatten().cloned().collect()
    }

    fn matches_filter(
        &self,
        filter: &HashSet<PathBuf>,
    ) -> bool {
        filter.is_empty() || self.paths().any(|path| filter.contains(path))
    }
}

/// `Foo::Bar::baz` -> `[Foo::Bar::baz, Bar::baz, baz]`.
pub fn name_keys(qualified_name: &str) -> Vec<String> {
    let mut keys = vec![qualified_name.to_string()];
    let mut rest = qualified_name;
    while let Some(idx) = rest.find("::") {
        rest = &rest[idx + 2..];
        if rest.is_empty() {
            break;
        }
        keys.push(rest.to_string());
    }
    keys
}

#[derive(Debug, Clone, Default)]
pub struct NameIndex {
    entries: BTreeMap<String, NameEntry>,
}

impl NameIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(
        &self,
        key: &str,
    ) -> Option<&NameEntry> {
        self.entries.get(key)
    }

    pub fn merge(
        &mut self,
        key: &str,
        entry: &NameEntry,
    ) {
        match self.entries.get_mut(key) {
            Some(existing) => existing.merge(entry),
            None => {
                self.entries.insert(key.to_string(), entry.clone());
            },
        }
    }

    pub fn insert(
        &mut self,
        key: &str,
        path: &Path,
        name: &str,
    ) {
        self.entries
            .entry(key.to_string())
            .or_default()
            .insert(path.to_path_buf(), name.to_string());
    }

    /// Forgets everything `paths` contributed and drops entries left
    /// without any defining path.
    pub fn invalidate(
        &mut self,
        paths: &HashSet<PathBuf>,
    ) {
        if paths.is_empty() {
            return;
        }
        self.entries.retain(|_, entry| {
            for path in paths {
                entry.remove_path(path);
            }
            !entry.is_empty()
        });
    }

    /// Files every named symbol of `document` under its qualified name and
    /// suffixes, plus the bare file name under itself.
    pub fn add_document(
        &mut self,
        document: &Document,
    ) {
        let path = document.path();
        for symbol in document.symbols() {
            if symbol.qualified_name.is_empty() {
                continue;
            }
            for key in name_keys(&symbol.qualified_name) {
                self.insert(&key, path, &symbol.qualified_name);
            }
        }
        if let Some(name) = file_name(path) {
            self.insert(&name, path, &name);
        }
    }

    /// Next generation of the index after re-indexing `batch`.
    pub fn rebuild<'d>(
        &self,
        batch: &HashSet<PathBuf>,
        documents: impl IntoIterator<Item = &'d Document>,
    ) -> NameIndex {
        let mut next = self.clone();
        next.invalidate(batch);
        for document in documents {
            next.add_document(document);
        }
        next
    }

    /// Full names of every key starting with `prefix`.
    pub fn lookup_prefix(
        &self,
        prefix: &str,
        filter: &HashSet<PathBuf>,
    ) -> BTreeSet<String> {
        self.entries
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .filter(|(_, entry)| entry.matches_filter(filter))
            .flat_map(|(_, entry)| entry.names())
            .collect()
    }

    /// Paths defining exactly `key`, restricted to `filter` when non-empty.
    pub fn lookup_exact(
        &self,
        key: &str,
        filter: &HashSet<PathBuf>,
    ) -> BTreeSet<PathBuf> {
        let Some(entry) = self.entries.get(key) else {
            return BTreeSet::new();
        };
        entry
            .paths()
            .filter(|path| filter.is_empty() || filter.contains(*path))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
#[path = "../tests/src/names_tests.rs"]
mod tests;
