use std::collections::BTreeSet;

use super::*;
use crate::test_support::TempDir;

fn shell() -> Shell {
    let settings = EngineSettings::default();
    let engine = Engine::new(&settings).unwrap();
    Shell::new(Arc::new(engine), settings)
}

fn project() -> TempDir {
    let dir = TempDir::new("shell");
    dir.write("foo.h", "class Foo {\npublic:\n    void bar();\n};\n");
    dir.write("foo.cpp", "#include \"foo.h\"\nvoid Foo::bar() {}\n");
    dir.write("main.cpp", "#include \"foo.h\"\nvoid run() {\n    Foo foo;\n    foo.bar();\n}\n");
    dir
}

async fn run(
    shell: &Shell,
    line: &str,
) -> Vec<String> {
    shell.execute(line).await.unwrap()
}

#[test]
fn parses_locations() {
    assert_eq!(parse_location("/p/a.cpp:3:7").unwrap(), (PathBuf::from("/p/a.cpp"), 3, 7));
    assert_eq!(parse_location(" /p/a.cpp:3:7: ").unwrap(), (PathBuf::from("/p/a.cpp"), 3, 7));
    assert_eq!(parse_location("/p/odd:name.cpp:1:2").unwrap().0, PathBuf::from("/p/odd:name.cpp"));
    assert!(matches!(parse_location("/p/a.cpp:0:1"), Err(IndexError::InvalidLocation(_))));
    assert!(parse_location("/p/a.cpp:3").is_err());
    assert!(parse_location("nonsense").is_err());
}

#[tokio::test]
async fn blank_lines_get_no_response() {
    let shell = shell();
    assert_eq!(shell.execute("   ").await, None);
}

#[tokio::test]
async fn bad_commands_still_end_with_the_sentinel() {
    let shell = shell();
    let response = run(&shell, "frobnicate now").await;
    assert!(response.len() > 1);
    assert!(response[0].contains("frobnicate"));
    assert_eq!(response.last().map(String::as_str), Some(SENTINEL));

    let response = run(&shell, "cursor nowhere").await;
    assert_eq!(response, vec!["invalid location `nowhere`, expected path:line:column", SENTINEL]);
}

fn without_sentinel(mut lines: Vec<String>) -> BTreeSet<String> {
    assert_eq!(lines.pop().as_deref(), Some(SENTINEL));
    lines.into_iter().collect()
}

#[tokio::test]
async fn index_and_query_a_directory() {
    let dir = project();
    let shell = shell();
    let root = dir.path().display().to_string();

    assert_eq!(run(&shell, &format!("index-dir {root}")).await, vec!["queued 2 files", SENTINEL]);
    assert_eq!(run(&shell, "wait").await, vec!["state: idle", SENTINEL]);

    assert_eq!(
        run(&shell, &format!("cursor {root}/main.cpp:4:9")).await,
        vec![format!("r\t{root}/foo.cpp:2:11"), SENTINEL.to_string()]
    );
    assert_eq!(run(&shell, "list Foo::").await, vec!["Foo::bar", SENTINEL]);

    let found = without_sentinel(run(&shell, "find bar").await);
    let expected: BTreeSet<String> =
        [format!("m\t{root}/foo.cpp:2:11\tFoo::bar"), format!("m\t{root}/foo.h:3:10\tFoo::bar")].into_iter().collect();
    assert_eq!(found, expected);

    assert_eq!(
        run(&shell, &format!("references {root}/foo.h:3:10 --all --no-context")).await,
        vec![format!("{root}/foo.cpp:2:11"), format!("{root}/main.cpp:4:9"), SENTINEL.to_string()]
    );
    assert_eq!(run(&shell, "files --headers").await, vec![format!("{root}/foo.h"), SENTINEL.to_string()]);
    assert_eq!(without_sentinel(run(&shell, "files").await).len(), 3);
    assert_eq!(
        run(&shell, &format!("deps {root}/foo.h --reverse")).await,
        vec![format!("{root}/foo.cpp"), format!("{root}/main.cpp"), SENTINEL.to_string()]
    );
    assert_eq!(run(&shell, &format!("deps {root}/main.cpp")).await, vec![format!("{root}/foo.h"), SENTINEL.to_string()]);

    let cursors = without_sentinel(run(&shell, &format!("cursors {root}/foo.h")).await);
    assert!(cursors.contains(&format!("m\t{root}/foo.h:3:10\tFoo::bar")));
    assert!(cursors.contains(&format!("c\t{root}/foo.h:1:7\tFoo")));

    let status = run(&shell, "status").await;
    assert_eq!(status[0], "state: idle");
    assert_eq!(status[2], "units: 2");
}

#[tokio::test]
async fn remove_and_persistence_commands() {
    let dir = project();
    let shell = shell();
    let root = dir.path().display().to_string();

    assert_eq!(run(&shell, &format!("index {root}/main.cpp -I {root} -D DEBUG=1")).await, vec![SENTINEL]);
    run(&shell, "wait").await;
    assert_eq!(run(&shell, "save").await, vec!["no state file given or configured", SENTINEL]);
    assert_eq!(run(&shell, &format!("save {root}/state.json")).await, vec![SENTINEL]);
    assert!(dir.path().join("state.json").is_file());

    let units = shell.engine().units();
    assert_eq!(units[0].builds[0].defines, vec!["DEBUG=1"]);
    assert_eq!(units[0].builds[0].include_paths, vec![dir.path().to_path_buf()]);

    assert_eq!(run(&shell, &format!("remove {root}/main.cpp")).await, vec![SENTINEL]);
    assert_eq!(run(&shell, &format!("remove {root}/main.cpp")).await, vec!["not indexed", SENTINEL]);
    assert_eq!(run(&shell, "list run").await, vec![SENTINEL]);

    assert_eq!(run(&shell, &format!("restore {root}/state.json")).await, vec![SENTINEL]);
    run(&shell, "wait").await;
    assert_eq!(run(&shell, "list run").await, vec!["run", SENTINEL]);
    assert_eq!(
        run(&shell, &format!("restore {root}/missing.json")).await[0],
        format!("failed to read {root}/missing.json: No such file or directory (os error 2)")
    );
}

#[tokio::test]
async fn dump_reports_unknown_files() {
    let shell = shell();
    assert_eq!(
        run(&shell, "dump /nowhere/x.cpp").await,
        vec!["Don't seem to have /nowhere/x.cpp indexed", SENTINEL]
    );
}
