use super::*;
use crate::frontend::BuildConfig;
use crate::test_support::TempDir;

fn sample() -> ProjectState {
    ProjectState::new(
        vec![(1, PathBuf::from("/p/main.cpp")), (2, PathBuf::from("/p/foo.h"))],
        vec![Unit::new(
            PathBuf::from("/p/main.cpp"),
            vec![BuildConfig::new(vec![PathBuf::from("/p/include")], vec!["DEBUG=1".to_string()])],
        )],
    )
}

#[test]
fn json_uses_camel_case_keys() {
    let json = sample().to_json().unwrap();
    assert!(json.contains("\"schemaVersion\": 1"));
    assert!(json.contains("\"includePaths\""));
    assert!(json.contains("\"defines\""));
}

#[test]
fn state_survives_a_trip_through_disk() {
    let dir = TempDir::new("persist");
    let path = dir.path().join("nested/state.json");
    sample().write_to(&path).unwrap();

    let restored = ProjectState::read_from(&path).unwrap();
    assert_eq!(restored, sample());
    assert!(restored.is_current());
}

#[test]
fn missing_sections_default_to_empty() {
    let state = ProjectState::from_json(r#"{"schemaVersion": 1}"#).unwrap();
    assert!(state.files.is_empty());
    assert!(state.units.is_empty());

    let unit = ProjectState::from_json(r#"{"schemaVersion": 1, "units": [{"path": "/p/a.cpp"}]}"#).unwrap();
    assert!(unit.units[0].builds.is_empty());
}

#[test]
fn other_schema_versions_are_not_current() {
    let state = ProjectState::from_json(r#"{"schemaVersion": 7, "files": [], "units": []}"#).unwrap();
    assert!(!state.is_current());
}

#[test]
fn unreadable_state_reports_the_cause() {
    let dir = TempDir::new("persist-errors");
    let missing = dir.path().join("missing.json");
    assert!(matches!(ProjectState::read_from(&missing), Err(IndexError::Io { .. })));

    let garbage = dir.write("garbage.json", "not json");
    assert!(matches!(ProjectState::read_from(&garbage), Err(IndexError::Persist(_))));
}
