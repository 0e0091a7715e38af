use std::{
    path::{Path, PathBuf},
    sync::RwLock,
};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// Interned file identifier. `0` is reserved for "no file".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileId(u32);

impl FileId {
    pub const NONE: FileId = FileId(0);

    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for FileId {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A point in a file: interned file, 1-based line, 1-based byte column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    pub file: FileId,
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn new(
        file: FileId,
        line: u32,
        column: u32,
    ) -> Self {
        Self {
            file,
            line,
            column,
        }
    }

    pub fn is_null(&self) -> bool {
        self.file.is_none()
    }
}

/// Path interner shared by the engine, its resolvers and the persistence layer.
///
/// Ids are handed out on first sight of a path and never reused, so a
/// [`Location`] stays meaningful for the lifetime of the engine (and across
/// restarts once the table has been persisted and restored).
#[derive(Debug)]
pub struct FileIds {
    ids: DashMap<PathBuf, FileId>,
    paths: RwLock<Vec<Option<PathBuf>>>,
}

impl Default for FileIds {
    fn default() -> Self {
        Self::new()
    }
}

impl FileIds {
    pub fn new() -> Self {
        Self {
            ids: DashMap::new(),
            // slot 0 is FileId::NONE
            paths: RwLock::new(vec![None]),
        }
    }

    /// Intern `path` (normalized first) and return its id.
    pub fn insert(
        &self,
        path: &Path,
    ) -> FileId {
        let path = normalized_path(path);
        if let Some(id) = self.ids.get(&path) {
            return *id;
        }
        *self.ids.entry(path.clone()).or_insert_with(|| {
            let mut paths = self.paths.write().unwrap_or_else(|poisoned| poisoned.into_inner());
            paths.push(Some(path));
            FileId((paths.len() - 1) as u32)
        })
    }

    /// Look up an already interned path without assigning a new id.
    pub fn id(
        &self,
        path: &Path,
    ) -> Option<FileId> {
        self.ids.get(&normalized_path(path)).map(|id| *id)
    }

    pub fn path(
        &self,
        id: FileId,
    ) -> Option<PathBuf> {
        let paths = self.paths.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        paths.get(id.0 as usize).and_then(|p| p.clone())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Every `(id, path)` pair in id order.
    pub fn entries(&self) -> Vec<(u32, PathBuf)> {
        let paths = self.paths.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        paths.iter().enumerate().filter_map(|(id, path)| path.clone().map(|p| (id as u32, p))).collect()
    }

    /// Re-register a persisted table. Existing ids win on conflict.
    pub fn load(
        &self,
        entries: &[(u32, PathBuf)],
    ) -> bool {
        let mut paths = self.paths.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut consistent = true;
        for (id, path) in entries {
            if *id == 0 {
                consistent = false;
                continue;
            }
            let slot = *id as usize;
            if paths.len() <= slot {
                paths.resize(slot + 1, None);
            }
            match &paths[slot] {
                Some(existing) if existing != path => consistent = false,
                Some(_) => {},
                None => {
                    if self.ids.contains_key(path) {
                        consistent = false;
                        continue;
                    }
                    paths[slot] = Some(path.clone());
                    self.ids.insert(path.clone(), FileId(*id));
                },
            }
        }
        consistent
    }

    /// Render a location as `path:line:column`.
    pub fn format(
        &self,
        location: &Location,
    ) -> String {
        match self.path(location.file) {
            Some(path) => format!("{}:{}:{}", path.display(), location.line, location.column),
            None => format!("{}:{}:{}", location.file, location.line, location.column),
        }
    }
}

pub fn normalized_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// The final path component, used for "find by file name" queries.
pub fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|name| name.to_string_lossy().into_owned())
}

#[cfg(test)]
#[path = "../../tests/src/vfs_tests.rs"]
mod tests;
