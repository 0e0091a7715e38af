//! The language front-end: turns a file plus its build configuration into
//! bound [`Document`]s and answers lookups against a [`Snapshot`] of them.

pub mod binder;
pub mod document;
pub mod lookup;
pub mod preprocess;
pub mod syntax;
pub mod usages;

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub use document::{Diagnostic, Document, Include, Scope, ScopeId, ScopeKind, Symbol, SymbolId, SymbolKind};
pub use lookup::{LookupContext, SymbolRef};
pub use preprocess::MacroEnv;
pub use usages::Usage;

use crate::error::{IndexError, Result};
use crate::vfs::normalized_path;

const MAX_INCLUDE_DEPTH: usize = 64;

/// One way of compiling a unit: its include search path and defines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildConfig {
    pub include_paths: Vec<PathBuf>,
    pub defines: Vec<String>,
}

impl BuildConfig {
    pub fn new(
        include_paths: Vec<PathBuf>,
        defines: Vec<String>,
    ) -> Self {
        Self {
            include_paths,
            defines,
        }
    }

    /// Key identifying the macro environment of this configuration.
    pub fn define_key(
        &self,
        global_defines: &[String],
    ) -> String {
        self.defines
            .iter()
            .chain(global_defines)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(":")
    }
}

/// Documents produced by one `parse_or_update` call.
#[derive(Debug, Default)]
pub struct ParseOutcome {
    /// Included files first, the parsed unit last.
    pub documents: Vec<Arc<Document>>,
    /// `(included, includer)` for every resolved include.
    pub includes: Vec<(PathBuf, PathBuf)>,
}

impl ParseOutcome {
    pub fn unit(&self) -> Option<&Arc<Document>> {
        self.documents.last()
    }
}

/// Seam between the indexing engine and the code that parses and binds.
///
/// `parse_or_update` runs on the worker thread only; `snapshot` and
/// `document` may be called from any thread while a parse is in flight.
pub trait FrontEnd: Send + Sync {
    /// Re-parses `path` (and the files it includes) with `config`, replacing
    /// their documents. On failure the previous documents stay in place.
    fn parse_or_update(
        &self,
        path: &Path,
        config: &BuildConfig,
        macros: &MacroEnv,
    ) -> Result<ParseOutcome>;

    fn document(
        &self,
        path: &Path,
    ) -> Option<Arc<Document>>;

    fn snapshot(&self) -> Snapshot;

    /// Drops the document for `path`; `false` if there was none.
    fn remove(
        &self,
        path: &Path,
    ) -> bool;
}

/// Immutable view of every document at one point in time.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    documents: BTreeMap<PathBuf, Arc<Document>>,
}

impl Snapshot {
    pub fn get(
        &self,
        path: &Path,
    ) -> Option<&Arc<Document>> {
        self.documents.get(path)
    }

    pub fn contains(
        &self,
        path: &Path,
    ) -> bool {
        self.documents.contains_key(path)
    }

    pub fn documents(&self) -> impl Iterator<Item = &Arc<Document>> {
        self.documents.values()
    }

    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.documents.keys()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn lookup_context(
        &self,
        document: &Arc<Document>,
    ) -> LookupContext<'_> {
        LookupContext::new(document, self)
    }

    pub fn find_usages(
        &self,
        symbol: &SymbolRef,
    ) -> Vec<Usage> {
        usages::find_usages(symbol, self)
    }

    pub fn find_matching_definition(
        &self,
        symbol: &SymbolRef,
        strict: bool,
    ) -> Option<SymbolRef> {
        lookup::find_matching_definition(symbol, self, strict)
    }

    pub fn find_matching_declarations(
        &self,
        symbol: &SymbolRef,
    ) -> Vec<SymbolRef> {
        lookup::find_matching_declarations(symbol, self)
    }

    pub fn find_matching_class(
        &self,
        symbol: &SymbolRef,
    ) -> Option<SymbolRef> {
        lookup::find_matching_class(symbol, self)
    }
}

impl FromIterator<Arc<Document>> for Snapshot {
    fn from_iter<I: IntoIterator<Item = Arc<Document>>>(iter: I) -> Self {
        Self {
            documents: iter.into_iter().map(|doc| (doc.path().to_path_buf(), doc)).collect(),
        }
    }
}

/// Thread-safe store of the latest document per path.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: DashMap<PathBuf, Arc<Document>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &self,
        document: Arc<Document>,
    ) {
        self.documents.insert(document.path().to_path_buf(), document);
    }

    pub fn get(
        &self,
        path: &Path,
    ) -> Option<Arc<Document>> {
        self.documents.get(path).map(|entry| entry.value().clone())
    }

    pub fn remove(
        &self,
        path: &Path,
    ) -> bool {
        self.documents.remove(path).is_some()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.documents.iter().map(|entry| entry.value().clone()).collect()
    }
}

/// Built-in C/C++ front-end: preprocess, parse, bind.
#[derive(Debug)]
pub struct CxxFrontEnd {
    store: DocumentStore,
    system_include_paths: Vec<PathBuf>,
    max_file_size: u64,
    revision: AtomicU64,
}

impl CxxFrontEnd {
    pub fn new(
        system_include_paths: Vec<PathBuf>,
        max_file_size: u64,
    ) -> Self {
        Self {
            store: DocumentStore::new(),
            system_include_paths,
            max_file_size,
            revision: AtomicU64::new(1),
        }
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    fn read_source(
        &self,
        path: &Path,
    ) -> Result<String> {
        let io_error = |source| IndexError::Io {
            path: path.to_path_buf(),
            source,
        };
        let size = std::fs::metadata(path).map_err(io_error)?.len();
        if size > self.max_file_size {
            return Err(IndexError::TooLarge {
                path: path.to_path_buf(),
                size,
            });
        }
        let bytes = std::fs::read(path).map_err(io_error)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn parse_file(
        &self,
        path: &Path,
        config: &BuildConfig,
        macros: &mut MacroEnv,
        visited: &mut HashSet<PathBuf>,
        outcome: &mut ParseOutcome,
        depth: usize,
    ) -> Result<Arc<Document>> {
        let source = self.read_source(path)?;
        let mut includes = Vec::new();
        let preprocessed = preprocess::preprocess(&source, macros, &mut |directive, macros| {
            let resolved = resolve_include(path, &directive.spelled, directive.angled, config, &self.system_include_paths);
            if let Some(resolved) = &resolved {
                outcome.includes.push((resolved.clone(), path.to_path_buf()));
                if depth < MAX_INCLUDE_DEPTH && visited.insert(resolved.clone()) {
                    if let Err(err) = self.parse_file(resolved, config, macros, visited, outcome, depth + 1) {
                        warn!("{}:{}: {err}", path.display(), directive.line);
                    }
                }
            } else {
                debug!("{}:{}: unresolved include `{}`", path.display(), directive.line, directive.spelled);
            }
            includes.push(Include {
                line: directive.line,
                spelled: directive.spelled.clone(),
                angled: directive.angled,
                resolved,
            });
        });

        let revision = self.revision.fetch_add(1, Ordering::Relaxed);
        let document = Arc::new(Document::new(
            path.to_path_buf(),
            revision,
            source,
            &preprocessed.text,
            includes,
            preprocessed.diagnostics,
        ));
        for diagnostic in document.diagnostics() {
            let error = IndexError::ParseDiagnostic {
                path: path.to_path_buf(),
                line: diagnostic.line,
                column: diagnostic.column,
                message: diagnostic.message.clone(),
            };
            warn!("{error}");
        }
        self.store.insert(document.clone());
        outcome.documents.push(document.clone());
        Ok(document)
    }
}

impl FrontEnd for CxxFrontEnd {
    fn parse_or_update(
        &self,
        path: &Path,
        config: &BuildConfig,
        macros: &MacroEnv,
    ) -> Result<ParseOutcome> {
        let path = normalized_path(path);
        let mut macros = macros.clone();
        let mut visited = HashSet::from([path.clone()]);
        let mut outcome = ParseOutcome::default();
        self.parse_file(&path, config, &mut macros, &mut visited, &mut outcome, 0)?;
        debug!(
            "parsed {} ({} documents, {} includes)",
            path.display(),
            outcome.documents.len(),
            outcome.includes.len()
        );
        Ok(outcome)
    }

    fn document(
        &self,
        path: &Path,
    ) -> Option<Arc<Document>> {
        self.store.get(path)
    }

    fn snapshot(&self) -> Snapshot {
        self.store.snapshot()
    }

    fn remove(
        &self,
        path: &Path,
    ) -> bool {
        self.store.remove(path)
    }
}

/// Quoted includes search the includer's directory first, then every
/// configured include path, then the system include paths.
pub fn resolve_include(
    owner: &Path,
    spelled: &str,
    angled: bool,
    config: &BuildConfig,
    system_include_paths: &[PathBuf],
) -> Option<PathBuf> {
    let include = Path::new(spelled);
    if include.is_absolute() {
        return include.is_file().then(|| normalized_path(include));
    }

    if !angled
        && let Some(parent) = owner.parent()
    {
        let candidate = parent.join(include);
        if candidate.is_file() {
            return Some(normalized_path(&candidate));
        }
    }

    config
        .include_paths
        .iter()
        .chain(system_include_paths)
        .map(|dir| dir.join(include))
        .find(|candidate| candidate.is_file())
        .map(|candidate| normalized_path(&candidate))
}

#[cfg(test)]
#[path = "../../tests/src/frontend/frontend_tests.rs"]
mod tests;
