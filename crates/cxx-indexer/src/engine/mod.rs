//! The indexing engine: one writer thread feeding a shared snapshot, and
//! query entry points that wait for the phase they need before reading it.
//!
//! A single mutex guards the job queue, the state machine, the include
//! graph, the define cache and the current name index. Documents live in the
//! front-end's own store and are read from a [`Snapshot`] after the lock is
//! released, so a long query never holds up the worker.

pub mod define_cache;
pub mod include_graph;
pub mod queue;
pub mod state;
mod worker;

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::JoinHandle;

use tracing::{debug, error, info};

pub use define_cache::DefineCache;
pub use include_graph::IncludeGraph;
pub use queue::{IndexJob, JobQueue, Unit};
pub use state::{EngineState, StateMachine, WaitMode};

use crate::config::EngineSettings;
use crate::cursor::{Cursor, CursorKind, CursorResolver, FindMode};
use crate::dependencies::{DependencyMode, DependencyTable};
use crate::error::{IndexError, Result};
use crate::frontend::syntax::dump_tree;
use crate::frontend::{BuildConfig, CxxFrontEnd, Document, FrontEnd, Snapshot, SymbolRef};
use crate::names::{NameIndex, name_keys};
use crate::persist::ProjectState;
use crate::references::{Reference, ReferenceFlags, ReferenceResolver};
use crate::vfs::{FileIds, Location, normalized_path};

const WORKER_STACK_SIZE: usize = 16 * 1024 * 1024;

pub(crate) struct Inner {
    pub(crate) machine: StateMachine,
    pub(crate) queue: JobQueue,
    pub(crate) units: BTreeMap<PathBuf, Unit>,
    pub(crate) include_graph: IncludeGraph,
    pub(crate) names: Arc<NameIndex>,
    pub(crate) define_cache: DefineCache,
    pub(crate) shutdown: bool,
}

pub(crate) struct Shared {
    pub(crate) inner: Mutex<Inner>,
    pub(crate) state_changed: Condvar,
    pub(crate) jobs_available: Condvar,
    pub(crate) front_end: Arc<dyn FrontEnd>,
    pub(crate) files: FileIds,
    pub(crate) progress_every: usize,
}

impl Shared {
    pub(crate) fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Must be called with the lock held; wakes every waiter on a change.
    pub(crate) fn set_state(
        &self,
        inner: &mut Inner,
        next: EngineState,
    ) {
        if inner.machine.transition(next) {
            self.state_changed.notify_all();
        }
    }

    fn wait<'a>(
        &self,
        guard: MutexGuard<'a, Inner>,
        mode: WaitMode,
        target: EngineState,
    ) -> MutexGuard<'a, Inner> {
        state::wait_for_state(&self.state_changed, guard, machine_of, mode, target)
    }
}

fn machine_of(inner: &Inner) -> &StateMachine {
    &inner.machine
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineStatus {
    pub state: EngineState,
    pub queued_jobs: usize,
    pub units: usize,
    pub names: usize,
    pub documents: usize,
}

impl EngineStatus {
    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("state: {}", self.state),
            format!("queued jobs: {}", self.queued_jobs),
            format!("units: {}", self.units),
            format!("documents: {}", self.documents),
            format!("names: {}", self.names),
        ]
    }
}

/// Everything a query needs once the lock is released.
struct QueryView {
    snapshot: Snapshot,
    names: Arc<NameIndex>,
    includer: Option<PathBuf>,
}

pub struct Engine {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl Engine {
    /// Engine backed by the built-in C/C++ front-end.
    pub fn new(settings: &EngineSettings) -> Result<Self> {
        let front_end = CxxFrontEnd::new(
            settings.front_end.system_include_dirs(),
            settings.indexing.max_file_size_bytes(),
        );
        Self::with_front_end(settings, Arc::new(front_end))
    }

    pub fn with_front_end(
        settings: &EngineSettings,
        front_end: Arc<dyn FrontEnd>,
    ) -> Result<Self> {
        let shared = Arc::new(Shared {
            inner: Mutex::new(Inner {
                machine: StateMachine::new(),
                queue: JobQueue::new(),
                units: BTreeMap::new(),
                include_graph: IncludeGraph::new(),
                names: Arc::new(NameIndex::new()),
                define_cache: DefineCache::new(
                    settings.indexing.define_cache_capacity,
                    settings.front_end.global_defines.clone(),
                ),
                shutdown: false,
            }),
            state_changed: Condvar::new(),
            jobs_available: Condvar::new(),
            front_end,
            files: FileIds::new(),
            progress_every: settings.indexing.progress_every,
        });

        let worker_shared = shared.clone();
        let worker = std::thread::Builder::new()
            .name("cxx-indexer-worker".to_string())
            .stack_size(WORKER_STACK_SIZE)
            .spawn(move || worker::run(worker_shared))
            .map_err(|source| IndexError::Io {
                path: PathBuf::from("<worker thread>"),
                source,
            })?;

        Ok(Self {
            shared,
            worker: Some(worker),
        })
    }

    pub fn file_ids(&self) -> &FileIds {
        &self.shared.files
    }

    /// Interns `path` and returns the location `line:column` in it.
    pub fn location(
        &self,
        path: &Path,
        line: u32,
        column: u32,
    ) -> Location {
        Location::new(self.shared.files.insert(path), line, column)
    }

    pub fn state(&self) -> EngineState {
        self.shared.lock().machine.state()
    }

    pub fn is_indexing(&self) -> bool {
        self.state() == EngineState::Indexing
    }

    pub fn wait_for(
        &self,
        mode: WaitMode,
        target: EngineState,
    ) {
        let guard = self.shared.lock();
        drop(self.shared.wait(guard, mode, target));
    }

    /// Queues `path` for (re)indexing with `builds`. Never blocks on the
    /// worker.
    pub fn submit(
        &self,
        path: &Path,
        builds: Vec<BuildConfig>,
    ) {
        let path = normalized_path(path);
        self.shared.files.insert(&path);
        let mut inner = self.shared.lock();
        inner.units.insert(path.clone(), Unit::new(path.clone(), builds.clone()));
        inner.queue.push(IndexJob::new(path.clone(), builds));
        if matches!(inner.machine.state(), EngineState::Idle | EngineState::Starting) {
            self.shared.set_state(&mut inner, EngineState::Indexing);
        }
        debug!("queued {} ({} pending)", path.display(), inner.queue.len());
        self.shared.jobs_available.notify_one();
    }

    /// Drops a unit and its document once indexing has settled.
    pub fn remove(
        &self,
        path: &Path,
    ) -> bool {
        let path = normalized_path(path);
        let guard = self.shared.lock();
        let mut inner = self.shared.wait(guard, WaitMode::AtLeast, EngineState::Idle);
        let was_unit = inner.units.remove(&path).is_some();
        let had_document = self.shared.front_end.remove(&path);
        inner.include_graph.remove(&path);
        inner.define_cache.release_unit(&path);
        let mut names = NameIndex::clone(&inner.names);
        names.invalidate(&HashSet::from([path.clone()]));
        inner.names = Arc::new(names);
        info!("removed {}", path.display());
        was_unit || had_document
    }

    fn view(
        &self,
        target: EngineState,
        path: Option<&Path>,
    ) -> QueryView {
        let guard = self.shared.lock();
        let inner = self.shared.wait(guard, WaitMode::AtLeast, target);
        let names = inner.names.clone();
        let includer = path.and_then(|path| inner.include_graph.includer_of(path)).map(Path::to_path_buf);
        drop(inner);
        QueryView {
            snapshot: self.shared.front_end.snapshot(),
            names,
            includer,
        }
    }

    fn located(
        &self,
        location: &Location,
    ) -> Option<PathBuf> {
        let path = self.shared.files.path(location.file);
        if path.is_none() {
            error!("unknown file id {}", location.file);
        }
        path
    }

    fn document(
        view: &QueryView,
        path: &Path,
    ) -> Option<Arc<Document>> {
        let document = view.snapshot.get(path).cloned();
        if document.is_none() {
            debug!("{}", IndexError::NotIndexed(path.to_path_buf()));
        }
        document
    }

    /// Cursor at `location`, swapping between declaration and definition.
    pub fn cursor(
        &self,
        location: &Location,
    ) -> Option<Cursor> {
        self.resolve(location, FindMode::Swap)
    }

    pub fn resolve(
        &self,
        location: &Location,
        mode: FindMode,
    ) -> Option<Cursor> {
        let path = self.located(location)?;
        let view = self.view(EngineState::CollectingNames, Some(&path));
        let document = Self::document(&view, &path)?;
        let context = view.includer.as_deref().and_then(|includer| view.snapshot.get(includer));
        let cursor = CursorResolver::new(&view.snapshot, &self.shared.files).cursor(
            &document,
            context,
            location.line,
            location.column,
            mode,
        );
        if cursor.is_none() {
            debug!("{}", IndexError::UnresolvedSymbol(self.shared.files.format(location)));
        }
        cursor
    }

    pub fn references(
        &self,
        location: &Location,
        flags: ReferenceFlags,
        path_filter: &[PathBuf],
    ) -> Vec<Reference> {
        let Some(path) = self.located(location) else {
            return Vec::new();
        };
        let view = self.view(EngineState::CollectingNames, Some(&path));
        let Some(document) = Self::document(&view, &path) else {
            return Vec::new();
        };
        let context = view.includer.as_deref().and_then(|includer| view.snapshot.get(includer));
        let filter = normalized_filter(path_filter);
        ReferenceResolver::new(&view.snapshot, &self.shared.files).references(
            &document,
            context,
            location.line,
            location.column,
            flags,
            &filter,
        )
    }

    /// Every full name with a key starting with `prefix`.
    pub fn list_symbols(
        &self,
        prefix: &str,
        path_filter: &[PathBuf],
    ) -> BTreeSet<String> {
        let view = self.view(EngineState::Idle, None);
        view.names.lookup_prefix(prefix, &normalized_filter(path_filter))
    }

    /// Symbols whose qualified name, or a `::` suffix of it, is `name`,
    /// plus a file cursor for every candidate path ending in `name`.
    pub fn find_cursors(
        &self,
        name: &str,
        path_filter: &[PathBuf],
    ) -> BTreeSet<Cursor> {
        let view = self.view(EngineState::Idle, None);
        let candidates = view.names.lookup_exact(name, &normalized_filter(path_filter));
        let resolver = CursorResolver::new(&view.snapshot, &self.shared.files);

        let mut cursors = BTreeSet::new();
        for path in candidates {
            let Some(document) = view.snapshot.get(&path) else {
                error!("no document for {} in find_cursors", path.display());
                continue;
            };
            for id in document.symbol_ids() {
                let symbol = document.symbol(id);
                if !symbol.qualified_name.is_empty() && name_keys(&symbol.qualified_name).iter().any(|key| key == name)
                {
                    cursors.insert(resolver.make_cursor(&SymbolRef::new(document.clone(), id)));
                }
            }
            if path.to_string_lossy().ends_with(name) {
                let location = Location::new(self.shared.files.insert(&path), 1, 1);
                cursors.insert(Cursor {
                    location,
                    target: location,
                    kind: CursorKind::File,
                    symbol_name: path.display().to_string(),
                });
            }
        }
        cursors
    }

    /// A cursor for every symbol declared in `path`.
    pub fn cursors(
        &self,
        path: &Path,
    ) -> BTreeSet<Cursor> {
        let path = normalized_path(path);
        let view = self.view(EngineState::CollectingNames, None);
        let Some(document) = Self::document(&view, &path) else {
            return BTreeSet::new();
        };
        let resolver = CursorResolver::new(&view.snapshot, &self.shared.files);
        document
            .symbol_ids()
            .filter(|id| document.symbol(*id).line > 0)
            .map(|id| resolver.make_cursor(&SymbolRef::new(document.clone(), id)))
            .collect()
    }

    /// Parsed units and/or every resolved include.
    pub fn files(
        &self,
        want_headers: bool,
        want_sources: bool,
    ) -> BTreeSet<PathBuf> {
        let guard = self.shared.lock();
        let inner = self.shared.wait(guard, WaitMode::AtLeast, EngineState::CollectingNames);
        let units: Vec<PathBuf> = inner.units.keys().cloned().collect();
        drop(inner);
        let snapshot = self.shared.front_end.snapshot();

        let mut result = BTreeSet::new();
        if want_sources {
            result.extend(units.into_iter().filter(|path| snapshot.contains(path)));
        }
        if want_headers {
            for document in snapshot.documents() {
                result.extend(document.includes().iter().filter_map(|include| include.resolved.clone()));
            }
        }
        result
    }

    pub fn dependencies(
        &self,
        path: &Path,
        mode: DependencyMode,
    ) -> BTreeSet<PathBuf> {
        let path = normalized_path(path);
        let view = self.view(EngineState::CollectingNames, None);
        DependencyTable::build(&view.snapshot).query(&path, mode)
    }

    pub fn dump(
        &self,
        path: &Path,
    ) -> Vec<String> {
        let path = normalized_path(path);
        match self.shared.front_end.document(&path) {
            Some(document) => dump_tree(&document.root()),
            None => vec![format!("Don't seem to have {} indexed", path.display())],
        }
    }

    /// Number of symbols in the global scope of `path`.
    pub fn symbol_count(
        &self,
        path: &Path,
    ) -> Option<usize> {
        let path = normalized_path(path);
        self.shared.front_end.document(&path).map(|document| document.global_symbol_count())
    }

    pub fn status(&self) -> EngineStatus {
        let inner = self.shared.lock();
        let status = EngineStatus {
            state: inner.machine.state(),
            queued_jobs: inner.queue.len(),
            units: inner.units.len(),
            names: inner.names.len(),
            documents: 0,
        };
        drop(inner);
        EngineStatus {
            documents: self.shared.front_end.snapshot().len(),
            ..status
        }
    }

    pub fn units(&self) -> Vec<Unit> {
        self.shared.lock().units.values().cloned().collect()
    }

    pub fn project_state(&self) -> ProjectState {
        ProjectState::new(self.shared.files.entries(), self.units())
    }

    pub fn save(
        &self,
        path: &Path,
    ) -> Result<()> {
        self.project_state().write_to(path)
    }

    /// Re-registers the persisted file ids and resubmits every unit.
    /// `Ok(false)` when the state was written by an incompatible version or
    /// its file ids clash with ones already handed out.
    pub fn restore(
        &self,
        path: &Path,
    ) -> Result<bool> {
        let state = ProjectState::read_from(path)?;
        Ok(self.restore_state(state))
    }

    pub fn restore_state(
        &self,
        state: ProjectState,
    ) -> bool {
        if !state.is_current() {
            error!("rejecting project state with schema version {}", state.schema_version);
            return false;
        }
        if !self.shared.files.load(&state.files) {
            error!("persisted file ids conflict with the current table");
            return false;
        }
        info!("restoring {} units", state.units.len());
        for unit in state.units {
            self.submit(&unit.path, unit.builds);
        }
        true
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        {
            let mut inner = self.shared.lock();
            inner.shutdown = true;
        }
        self.shared.jobs_available.notify_all();
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            error!("indexer worker panicked");
        }
    }
}

fn normalized_filter(paths: &[PathBuf]) -> HashSet<PathBuf> {
    paths.iter().map(|path| normalized_path(path)).collect()
}

#[cfg(test)]
#[path = "../../tests/src/engine/engine_tests.rs"]
mod tests;
