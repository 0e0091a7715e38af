use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Maps each included file to the file that most recently included it.
///
/// Only one includer is kept per header. Queries on a header are resolved
/// in the context of that one representative includer.
#[derive(Debug, Clone, Default)]
pub struct IncludeGraph {
    includers: HashMap<PathBuf, PathBuf>,
}

impl IncludeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `includer` includes `included`, replacing any earlier
    /// includer of `included`.
    pub fn record(
        &mut self,
        included: PathBuf,
        includer: PathBuf,
    ) {
        if included == includer {
            return;
        }
        self.includers.insert(included, includer);
    }

    pub fn includer_of(
        &self,
        header: &Path,
    ) -> Option<&Path> {
        self.includers.get(header).map(PathBuf::as_path)
    }

    /// Drops edges into and out of `path`.
    pub fn remove(
        &mut self,
        path: &Path,
    ) {
        self.includers.remove(path);
        self.includers.retain(|_, includer| includer != path);
    }

    pub fn headers(&self) -> impl Iterator<Item = &PathBuf> {
        self.includers.keys()
    }

    pub fn len(&self) -> usize {
        self.includers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.includers.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/src/engine/include_graph_tests.rs"]
mod tests;
