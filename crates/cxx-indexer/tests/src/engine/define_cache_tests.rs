use super::*;

fn config(defines: &[&str]) -> BuildConfig {
    BuildConfig::new(Vec::new(), defines.iter().map(|define| define.to_string()).collect())
}

#[test]
fn same_defines_share_an_environment() {
    let mut cache = DefineCache::new(4, vec!["GLOBAL".to_string()]);
    let first = cache.get_or_insert(&config(&["A=1"]), Path::new("/p/a.cpp"));
    let second = cache.get_or_insert(&config(&["A=1"]), Path::new("/p/b.cpp"));

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cache.len(), 1);
    assert!(cache.contains("A=1:GLOBAL"));
    assert_eq!(first.value("A"), Some("1"));
    assert!(first.is_defined("GLOBAL"));
}

#[test]
fn least_recently_used_environment_is_evicted() {
    let mut cache = DefineCache::new(2, Vec::new());
    let unit = Path::new("/p/a.cpp");
    cache.get_or_insert(&config(&["A"]), unit);
    cache.get_or_insert(&config(&["B"]), unit);
    cache.get_or_insert(&config(&["A"]), unit);
    cache.get_or_insert(&config(&["C"]), unit);

    assert_eq!(cache.len(), 2);
    assert!(cache.contains("A"));
    assert!(!cache.contains("B"));
    assert!(cache.contains("C"));
}

#[test]
fn releasing_the_last_user_drops_the_environment() {
    let mut cache = DefineCache::new(4, Vec::new());
    cache.get_or_insert(&config(&["A"]), Path::new("/p/a.cpp"));
    cache.get_or_insert(&config(&["A"]), Path::new("/p/b.cpp"));
    cache.get_or_insert(&config(&["B"]), Path::new("/p/b.cpp"));

    cache.release_unit(Path::new("/p/b.cpp"));
    assert!(cache.contains("A"));
    assert!(!cache.contains("B"));

    cache.release_unit(Path::new("/p/a.cpp"));
    assert!(cache.is_empty());
}

#[test]
fn zero_capacity_still_holds_one_environment() {
    let mut cache = DefineCache::new(0, Vec::new());
    cache.get_or_insert(&config(&[]), Path::new("/p/a.cpp"));
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.key_for(&config(&[])), "");
}
