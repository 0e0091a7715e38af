use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use super::*;
use crate::frontend::{MacroEnv, ParseOutcome};
use crate::test_support::TempDir;

const FOO_H: &str = "class Foo {\npublic:\n    void bar();\n};\n";
const FOO_CPP: &str = "#include \"foo.h\"\nvoid Foo::bar() {}\n";
const MAIN_CPP: &str = "#include \"foo.h\"\nvoid run() {\n    Foo foo;\n    foo.bar();\n}\n";

struct Project {
    dir: TempDir,
    engine: Engine,
}

impl Project {
    fn new(label: &str) -> Self {
        let dir = TempDir::new(label);
        dir.write("foo.h", FOO_H);
        dir.write("foo.cpp", FOO_CPP);
        dir.write("main.cpp", MAIN_CPP);
        let engine = Engine::new(&EngineSettings::default()).unwrap();
        Self {
            dir,
            engine,
        }
    }

    fn path(
        &self,
        name: &str,
    ) -> PathBuf {
        self.dir.path().join(name)
    }

    fn index(
        &self,
        names: &[&str],
    ) {
        for name in names {
            self.engine.submit(&self.path(name), Vec::new());
        }
        self.engine.wait_for(WaitMode::AtLeast, EngineState::Idle);
    }

    fn cursor_at(
        &self,
        name: &str,
        line: u32,
        column: u32,
    ) -> Option<String> {
        let location = self.engine.location(&self.path(name), line, column);
        self.engine.cursor(&location).map(|cursor| cursor.format(self.engine.file_ids()))
    }

    fn display(
        &self,
        name: &str,
    ) -> String {
        self.path(name).display().to_string()
    }
}

#[test]
fn fresh_engine_settles_idle() {
    let engine = Engine::new(&EngineSettings::default()).unwrap();
    engine.wait_for(WaitMode::AtLeast, EngineState::Idle);
    assert_eq!(engine.state(), EngineState::Idle);
    assert!(!engine.is_indexing());
    assert!(engine.list_symbols("", &[]).is_empty());
}

#[test]
fn declaration_and_definition_swap() {
    let project = Project::new("engine-swap");
    project.index(&["main.cpp", "foo.cpp"]);

    let definition = format!("r\t{}:2:11", project.display("foo.cpp"));
    let declaration = format!("r\t{}:3:10", project.display("foo.h"));
    assert_eq!(project.cursor_at("foo.h", 3, 10), Some(definition.clone()));
    assert_eq!(project.cursor_at("foo.cpp", 2, 11), Some(declaration));
    assert_eq!(project.cursor_at("main.cpp", 4, 9), Some(definition));
    assert_eq!(project.cursor_at("main.cpp", 1, 2), Some(format!("f\t{}:1:1", project.display("foo.h"))));
    assert_eq!(project.cursor_at("unindexed.cpp", 1, 1), None);
}

#[test]
fn names_and_cursors_by_name() {
    let project = Project::new("engine-names");
    project.index(&["main.cpp", "foo.cpp"]);

    let names = project.engine.list_symbols("Foo", &[]);
    assert!(names.contains("Foo"));
    assert!(names.contains("Foo::bar"));
    assert!(!names.contains("run"));

    let found: BTreeSet<String> = project
        .engine
        .find_cursors("bar", &[])
        .iter()
        .map(|cursor| cursor.format(project.engine.file_ids()))
        .collect();
    let expected: BTreeSet<String> = [
        format!("m\t{}:3:10", project.display("foo.h")),
        format!("m\t{}:2:11", project.display("foo.cpp")),
    ]
    .into_iter()
    .collect();
    assert_eq!(found, expected);

    let filtered = project.engine.find_cursors("bar", &[project.path("foo.h")]);
    assert_eq!(filtered.len(), 1);

    let files = project.engine.find_cursors("main.cpp", &[]);
    assert_eq!(files.iter().map(|cursor| cursor.kind).collect::<Vec<_>>(), vec![CursorKind::File]);
}

#[test]
fn references_through_the_engine() {
    let project = Project::new("engine-refs");
    project.index(&["main.cpp", "foo.cpp"]);

    let location = project.engine.location(&project.path("foo.h"), 3, 10);
    let references = project.engine.references(&location, ReferenceFlags::all(), &[]);
    let sites: Vec<(PathBuf, u32, u32, CursorKind)> = references
        .into_iter()
        .map(|reference| (reference.path, reference.line, reference.column, reference.kind))
        .collect();
    assert_eq!(
        sites,
        vec![
            (project.path("foo.cpp"), 2, 11, CursorKind::MemberFunction),
            (project.path("main.cpp"), 4, 9, CursorKind::Reference),
        ]
    );
}

#[test]
fn files_and_dependencies() {
    let project = Project::new("engine-files");
    project.index(&["main.cpp", "foo.cpp"]);

    let sources: Vec<PathBuf> = project.engine.files(false, true).into_iter().collect();
    assert_eq!(sources, vec![project.path("foo.cpp"), project.path("main.cpp")]);
    let headers: Vec<PathBuf> = project.engine.files(true, false).into_iter().collect();
    assert_eq!(headers, vec![project.path("foo.h")]);
    assert_eq!(project.engine.files(true, true).len(), 3);

    let dependents: Vec<PathBuf> =
        project.engine.dependencies(&project.path("foo.h"), DependencyMode::WhatDependsOnThis).into_iter().collect();
    assert_eq!(dependents, vec![project.path("foo.cpp"), project.path("main.cpp")]);
    let includes: Vec<PathBuf> =
        project.engine.dependencies(&project.path("main.cpp"), DependencyMode::WhatThisDependsOn).into_iter().collect();
    assert_eq!(includes, vec![project.path("foo.h")]);
}

#[test]
fn header_queries_use_the_includer() {
    let dir = TempDir::new("engine-includer");
    dir.write("types.h", "struct Vec { int x; };\n");
    dir.write("shape.h", "struct Shape { Vec origin; int area() { return origin.x; } };\n");
    let main = dir.write("main.cpp", "#include \"types.h\"\n#include \"shape.h\"\n");
    let engine = Engine::new(&EngineSettings::default()).unwrap();
    engine.submit(&main, Vec::new());

    let location = engine.location(&dir.path().join("shape.h"), 1, 55);
    let cursor = engine.cursor(&location).unwrap();
    assert_eq!(cursor.symbol_name, "Vec::x");
    assert_eq!(
        cursor.format(engine.file_ids()),
        format!("r\t{}:1:18", dir.path().join("types.h").display())
    );
}

#[test]
fn removing_a_unit_forgets_it() {
    let project = Project::new("engine-remove");
    project.index(&["main.cpp", "foo.cpp"]);

    assert!(project.engine.remove(&project.path("main.cpp")));
    assert!(!project.engine.remove(&project.path("main.cpp")));
    assert!(project.engine.list_symbols("run", &[]).is_empty());
    assert!(project.engine.list_symbols("Foo::bar", &[]).contains("Foo::bar"));
    assert_eq!(project.engine.files(false, true).into_iter().collect::<Vec<_>>(), vec![project.path("foo.cpp")]);
    assert_eq!(project.cursor_at("main.cpp", 4, 9), None);
}

#[test]
fn reindexing_replaces_names() {
    let project = Project::new("engine-reindex");
    project.index(&["main.cpp"]);
    assert!(project.engine.list_symbols("run", &[]).contains("run"));

    project.dir.write("main.cpp", "void walk() {}\n");
    project.index(&["main.cpp"]);
    assert!(project.engine.list_symbols("run", &[]).is_empty());
    assert!(project.engine.list_symbols("walk", &[]).contains("walk"));
    assert_eq!(project.engine.units().len(), 1);
}

#[test]
fn status_dump_and_counts() {
    let project = Project::new("engine-status");
    project.index(&["main.cpp"]);

    let status = project.engine.status();
    assert_eq!(status.state, EngineState::Idle);
    assert_eq!(status.queued_jobs, 0);
    assert_eq!(status.units, 1);
    assert_eq!(status.documents, 2);
    assert_eq!(status.lines()[0], "state: idle");

    assert_eq!(project.engine.symbol_count(&project.path("main.cpp")), Some(1));
    assert!(project.engine.dump(&project.path("main.cpp"))[0].starts_with("Root"));
    let missing = project.path("nope.cpp");
    assert_eq!(
        project.engine.dump(&missing),
        vec![format!("Don't seem to have {} indexed", missing.display())]
    );
}

#[test]
fn saved_state_restores_units() {
    let project = Project::new("engine-save");
    project.index(&["main.cpp", "foo.cpp"]);
    let state_file = project.path("state/project.json");
    project.engine.save(&state_file).unwrap();

    let restored = Engine::new(&EngineSettings::default()).unwrap();
    assert!(restored.restore(&state_file).unwrap());
    restored.wait_for(WaitMode::AtLeast, EngineState::Idle);
    assert_eq!(restored.units(), project.engine.units());
    assert!(restored.list_symbols("Foo::bar", &[]).contains("Foo::bar"));
    assert_eq!(
        restored.file_ids().id(&project.path("main.cpp")),
        project.engine.file_ids().id(&project.path("main.cpp"))
    );
}

#[test]
fn incompatible_state_is_rejected() {
    let engine = Engine::new(&EngineSettings::default()).unwrap();
    let mut state = ProjectState::new(Vec::new(), Vec::new());
    state.schema_version = 99;
    assert!(!engine.restore_state(state));

    engine.location(Path::new("/p/already.cpp"), 1, 1);
    let clash = ProjectState::new(vec![(1, PathBuf::from("/p/other.cpp"))], Vec::new());
    assert!(!engine.restore_state(clash));
}

#[test]
fn huge_columns_find_nothing() {
    let project = Project::new("engine-huge-column");
    project.index(&["main.cpp", "foo.cpp"]);

    assert_eq!(project.cursor_at("main.cpp", 2, u32::MAX), None);
    assert_eq!(project.cursor_at("foo.h", 3, u32::MAX), None);
    let location = project.engine.location(&project.path("main.cpp"), 4, u32::MAX);
    assert!(project.engine.references(&location, ReferenceFlags::all(), &[]).is_empty());
}

/// Built-in front-end whose next parse and/or snapshot parks until the
/// test sends a release.
struct GatedFrontEnd {
    inner: CxxFrontEnd,
    hold_parse: AtomicBool,
    hold_snapshot: AtomicBool,
    parked: Mutex<Sender<&'static str>>,
    release: Mutex<Receiver<()>>,
}

/// `release` is dropped before `engine` so a parked worker always wakes.
struct Gate {
    release: Sender<()>,
    parked: Receiver<&'static str>,
    engine: Engine,
}

impl GatedFrontEnd {
    fn park(
        &self,
        what: &'static str,
    ) {
        let _ = self.parked.lock().unwrap().send(what);
        let _ = self.release.lock().unwrap().recv();
    }
}

impl FrontEnd for GatedFrontEnd {
    fn parse_or_update(
        &self,
        path: &Path,
        config: &BuildConfig,
        macros: &MacroEnv,
    ) -> Result<ParseOutcome> {
        if self.hold_parse.swap(false, Ordering::SeqCst) {
            self.park("parse");
        }
        self.inner.parse_or_update(path, config, macros)
    }

    fn document(
        &self,
        path: &Path,
    ) -> Option<Arc<Document>> {
        self.inner.document(path)
    }

    fn snapshot(&self) -> Snapshot {
        if self.hold_snapshot.swap(false, Ordering::SeqCst) {
            self.park("snapshot");
        }
        self.inner.snapshot()
    }

    fn remove(
        &self,
        path: &Path,
    ) -> bool {
        self.inner.remove(path)
    }
}

fn gated(
    hold_parse: bool,
    hold_snapshot: bool,
) -> Gate {
    let settings = EngineSettings::default();
    let (parked_tx, parked) = mpsc::channel();
    let (release, release_rx) = mpsc::channel();
    let front_end = GatedFrontEnd {
        inner: CxxFrontEnd::new(settings.front_end.system_include_dirs(), settings.indexing.max_file_size_bytes()),
        hold_parse: AtomicBool::new(hold_parse),
        hold_snapshot: AtomicBool::new(hold_snapshot),
        parked: Mutex::new(parked_tx),
        release: Mutex::new(release_rx),
    };
    let engine = Engine::with_front_end(&settings, Arc::new(front_end)).unwrap();
    Gate {
        release,
        parked,
        engine,
    }
}

fn project_dir(label: &str) -> TempDir {
    let dir = TempDir::new(label);
    dir.write("foo.h", FOO_H);
    dir.write("foo.cpp", FOO_CPP);
    dir.write("main.cpp", MAIN_CPP);
    dir
}

#[test]
fn engine_stays_responsive_while_a_parse_is_running() {
    let dir = project_dir("engine-parse-gate");
    let gate = gated(true, false);
    let engine = &gate.engine;
    let main = dir.path().join("main.cpp");

    engine.submit(&main, Vec::new());
    assert_eq!(gate.parked.recv().unwrap(), "parse");

    let status = engine.status();
    assert_eq!(status.state, EngineState::Indexing);
    assert_eq!(status.queued_jobs, 0);
    assert_eq!(status.units, 1);
    assert_eq!(engine.symbol_count(&main), None);

    engine.submit(&dir.path().join("foo.cpp"), Vec::new());
    assert_eq!(engine.status().queued_jobs, 1);

    std::thread::scope(|scope| {
        let (done_tx, done) = mpsc::channel();
        scope.spawn(move || {
            let _ = done_tx.send(engine.files(false, true));
        });
        assert_eq!(done.recv_timeout(Duration::from_millis(100)), Err(RecvTimeoutError::Timeout));

        gate.release.send(()).unwrap();
        let sources = done.recv().unwrap();
        assert!(sources.contains(&main));
    });

    engine.wait_for(WaitMode::AtLeast, EngineState::Idle);
    assert!(engine.list_symbols("Foo::bar", &[]).contains("Foo::bar"));
}

#[test]
fn submitting_while_collecting_names_skips_idle() {
    let dir = project_dir("engine-collect-gate");
    let gate = gated(false, true);
    let engine = &gate.engine;

    engine.submit(&dir.path().join("main.cpp"), Vec::new());
    assert_eq!(gate.parked.recv().unwrap(), "snapshot");
    assert_eq!(engine.state(), EngineState::CollectingNames);
    let (idle_before, indexing_before) = {
        let inner = engine.shared.lock();
        (inner.machine.entries(EngineState::Idle), inner.machine.entries(EngineState::Indexing))
    };

    engine.submit(&dir.path().join("foo.cpp"), Vec::new());
    assert_eq!(engine.state(), EngineState::CollectingNames);

    gate.release.send(()).unwrap();
    engine.wait_for(WaitMode::AtLeast, EngineState::Idle);

    let inner = engine.shared.lock();
    assert_eq!(inner.machine.entries(EngineState::Idle), idle_before + 1);
    assert_eq!(inner.machine.entries(EngineState::Indexing), indexing_before + 1);
    drop(inner);
    let names = engine.list_symbols("", &[]);
    assert!(names.contains("run"));
    assert!(names.contains("Foo::bar"));
}

#[test]
fn readers_never_see_a_batch_go_backwards() {
    let dir = project_dir("engine-monotonic");
    let gate = gated(true, false);
    let engine = &gate.engine;

    engine.submit(&dir.path().join("main.cpp"), Vec::new());
    assert_eq!(gate.parked.recv().unwrap(), "parse");
    engine.submit(&dir.path().join("foo.cpp"), Vec::new());
    engine.submit(&dir.path().join("foo.h"), Vec::new());

    let observed = std::thread::scope(|scope| {
        let observer = scope.spawn(move || {
            let mut seen: Vec<EngineState> = Vec::new();
            loop {
                let state = engine.state();
                if seen.last() != Some(&state) {
                    seen.push(state);
                }
                if state == EngineState::Idle {
                    return seen;
                }
                std::thread::yield_now();
            }
        });
        gate.release.send(()).unwrap();
        observer.join().unwrap()
    });

    assert_eq!(observed.first(), Some(&EngineState::Indexing));
    assert_eq!(observed.last(), Some(&EngineState::Idle));
    assert!(observed.windows(2).all(|pair| pair[0] < pair[1]), "states went backwards: {observed:?}");
}
