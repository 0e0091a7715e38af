use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use crate::frontend::Snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyMode {
    /// Files that include the path, directly or transitively.
    WhatDependsOnThis,
    /// Files the path includes, directly or transitively.
    WhatThisDependsOn,
}

/// Include relationships of a whole snapshot, in both directions.
///
/// Built on demand for each query; it is not kept in sync with indexing.
#[derive(Debug, Default)]
pub struct DependencyTable {
    includes: HashMap<PathBuf, HashSet<PathBuf>>,
    included_by: HashMap<PathBuf, HashSet<PathBuf>>,
}

impl DependencyTable {
    pub fn build(snapshot: &Snapshot) -> Self {
        let mut table = Self::default();
        for document in snapshot.documents() {
            for include in document.includes() {
                if let Some(resolved) = &include.resolved {
                    table.add_edge(document.path(), resolved);
                }
            }
        }
        table
    }

    pub fn add_edge(
        &mut self,
        owner: &Path,
        included: &Path,
    ) {
        self.includes.entry(owner.to_path_buf()).or_default().insert(included.to_path_buf());
        self.included_by.entry(included.to_path_buf()).or_default().insert(owner.to_path_buf());
    }

    pub fn query(
        &self,
        path: &Path,
        mode: DependencyMode,
    ) -> BTreeSet<PathBuf> {
        let edges = match mode {
            DependencyMode::WhatDependsOnThis => &self.included_by,
            DependencyMode::WhatThisDependsOn => &self.includes,
        };
        let mut result = BTreeSet::new();
        let mut queue = VecDeque::from([path.to_path_buf()]);
        while let Some(current) = queue.pop_front() {
            let Some(next) = edges.get(&current) else {
                continue;
            };
            for neighbour in next {
                if neighbour != path && result.insert(neighbour.clone()) {
                    queue.push_back(neighbour.clone());
                }
            }
        }
        result
    }
}
