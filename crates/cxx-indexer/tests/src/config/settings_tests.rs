use serde_json::json;

use super::*;
use crate::test_support::TempDir;

#[test]
fn parses_namespaced_payload() {
    let payload = json!({
        "cxx-indexer": {
            "indexing": {
                "maxFileSizeKb": 256,
                "defineCacheCapacity": 8,
                "progressEvery": 10
            },
            "frontEnd": {
                "systemIncludePaths": ["/usr/include", " /usr/local/include "],
                "globalDefines": ["NDEBUG"],
                "sourceExtensions": [".cpp", "cc"]
            },
            "logging": {
                "level": "debug"
            },
            "persistence": {
                "stateFile": "/tmp/state.json"
            }
        }
    });

    let settings = EngineSettings::from_json_payload(Some(&payload));
    assert_eq!(settings.indexing.max_file_size_kb, 256);
    assert_eq!(settings.indexing.max_file_size_bytes(), 256 * 1024);
    assert_eq!(settings.indexing.define_cache_capacity, 8);
    assert_eq!(settings.indexing.progress_every, 10);
    assert_eq!(
        settings.front_end.system_include_paths,
        vec!["/usr/include".to_string(), "/usr/local/include".to_string()]
    );
    assert_eq!(settings.front_end.global_defines, vec!["NDEBUG"]);
    assert_eq!(settings.front_end.source_extensions, vec!["cpp", "cc"]);
    assert_eq!(settings.logging.level, LogLevel::Debug);
    assert_eq!(settings.persistence.state_file, Some(PathBuf::from("/tmp/state.json")));
}

#[test]
fn defaults_cover_common_extensions() {
    let settings = EngineSettings::default();
    assert!(settings.front_end.is_source(Path::new("/p/main.cpp")));
    assert!(settings.front_end.is_source(Path::new("/p/legacy.C")));
    assert!(settings.front_end.is_header(Path::new("/p/foo.hpp")));
    assert!(!settings.front_end.is_source(Path::new("/p/foo.h")));
    assert!(!settings.front_end.is_source(Path::new("/p/Makefile")));
    assert_eq!(settings.front_end.global_defines, vec!["__GNUC__=4"]);
    assert_eq!(settings.logging.level.as_filter(), "info");
    assert_eq!(settings.persistence.state_file, None);
}

#[test]
fn clamps_numeric_values() {
    let payload = json!({
        "indexing": { "maxFileSizeKb": 1, "defineCacheCapacity": 0, "progressEvery": 1_000_000 }
    });

    let settings = EngineSettings::from_json_payload(Some(&payload));
    assert_eq!(settings.indexing.max_file_size_kb, MIN_MAX_FILE_SIZE_KB);
    assert_eq!(settings.indexing.define_cache_capacity, MIN_DEFINE_CACHE_CAPACITY);
    assert_eq!(settings.indexing.progress_every, MAX_PROGRESS_EVERY);
}

#[test]
fn invalid_candidates_are_skipped() {
    let payload = json!({
        "indexing": { "maxFileSizeKb": "huge" },
        "unknownSection": { "enable": true },
        "cxx-indexer": {
            "logging": { "level": "debug" }
        }
    });

    let settings = EngineSettings::from_json_payload(Some(&payload));
    assert_eq!(settings.indexing, IndexingSettings::default());
    assert_eq!(settings.logging.level, LogLevel::Debug);
}

#[test]
fn merging_keeps_earlier_values() {
    let base = EngineSettings::from_json_payload(Some(&json!({ "logging": { "level": "warn" } })));
    let merged = base.merged_with_payload(&json!({ "indexing": { "progressEvery": 5 } }));
    assert_eq!(merged.logging.level, LogLevel::Warn);
    assert_eq!(merged.indexing.progress_every, 5);
}

#[test]
fn empty_state_file_means_none() {
    let settings = EngineSettings::from_json_payload(Some(&json!({ "persistence": { "stateFile": "" } })));
    assert_eq!(settings.persistence.state_file, None);
}

#[test]
fn parses_project_toml() {
    let settings = EngineSettings::from_toml_str(
        r#"
[frontEnd]
globalDefines = ["A=1", "A=1", "B"]
headerExtensions = ["h", ".inl"]

[logging]
level = "trace"
"#,
    )
    .unwrap();
    assert_eq!(settings.front_end.global_defines, vec!["A=1", "B"]);
    assert!(settings.front_end.is_header(Path::new("/p/impl.inl")));
    assert_eq!(settings.logging.level, LogLevel::Trace);

    assert!(matches!(EngineSettings::from_toml_str("[logging"), Err(IndexError::Config(_))));
}

#[test]
fn finds_the_nearest_project_config() {
    let dir = TempDir::new("config");
    let config = dir.write(PROJECT_CONFIG_FILENAME, "[logging]\nlevel = \"error\"\n");
    let source = dir.write("src/deep/main.cpp", "");

    assert_eq!(find_project_config(&source), Some(config.clone()));
    assert_eq!(find_project_config(&dir.path().join("src")), Some(config.clone()));
    assert_eq!(EngineSettings::from_toml_file(&config).unwrap().logging.level, LogLevel::Error);
    assert!(matches!(
        EngineSettings::from_toml_file(&dir.path().join("missing.toml")),
        Err(IndexError::Io { .. })
    ));
}
