use std::path::PathBuf;

use rss_collector::ingest::registry::{load_registry, load_registry_from, FeedRegistry};
use rss_collector::CollectError;

fn repo_file(rel: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(rel)
}

#[test]
fn shipped_registry_matches_builtin_table() {
    let reg = load_registry_from(&repo_file("config/feeds.toml")).unwrap();
    assert_eq!(reg, FeedRegistry::builtin());
}

#[test]
fn explicit_path_must_exist() {
    let err = load_registry(Some(&repo_file("config/nope.toml"))).unwrap_err();
    assert!(err.to_string().contains("does not exist"), "{err:#}");
}

#[test]
fn json_file_without_extension_hint() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("feeds.conf");
    std::fs::write(&p, r#"{"yna_world": "https://example.test/yna"}"#).unwrap();
    let reg = load_registry(Some(&p)).unwrap();
    assert_eq!(reg.resolve("YNA_WORLD").unwrap().url, "https://example.test/yna");
}

#[test]
fn unknown_target_lists_known_ids() {
    let err = FeedRegistry::builtin().resolve("mk_econmy").unwrap_err();
    let msg = err.to_string();
    assert!(matches!(err, CollectError::UnknownTarget { .. }));
    assert!(msg.contains("hk_it, mk_economy"), "{msg}");
    assert!(msg.contains("did you mean 'mk_economy'?"), "{msg}");
}
