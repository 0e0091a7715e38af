use super::*;

#[test]
fn latest_includer_wins() {
    let mut graph = IncludeGraph::new();
    graph.record(PathBuf::from("/p/foo.h"), PathBuf::from("/p/a.cpp"));
    graph.record(PathBuf::from("/p/foo.h"), PathBuf::from("/p/b.cpp"));

    assert_eq!(graph.includer_of(Path::new("/p/foo.h")), Some(Path::new("/p/b.cpp")));
    assert_eq!(graph.len(), 1);
    assert_eq!(graph.includer_of(Path::new("/p/a.cpp")), None);
}

#[test]
fn self_includes_are_ignored() {
    let mut graph = IncludeGraph::new();
    graph.record(PathBuf::from("/p/loop.h"), PathBuf::from("/p/loop.h"));
    assert!(graph.is_empty());
}

#[test]
fn removing_a_file_drops_edges_both_ways() {
    let mut graph = IncludeGraph::new();
    graph.record(PathBuf::from("/p/foo.h"), PathBuf::from("/p/a.cpp"));
    graph.record(PathBuf::from("/p/bar.h"), PathBuf::from("/p/a.cpp"));
    graph.record(PathBuf::from("/p/a.cpp"), PathBuf::from("/p/all.cpp"));
    graph.record(PathBuf::from("/p/baz.h"), PathBuf::from("/p/b.cpp"));

    graph.remove(Path::new("/p/a.cpp"));

    let headers: Vec<&PathBuf> = graph.headers().collect();
    assert_eq!(headers, vec![&PathBuf::from("/p/baz.h")]);
}
