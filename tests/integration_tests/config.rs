use bookstore::{BookstoreConfig, ConfigError};
use std::collections::HashMap;
use std::io::Write;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |k| map.get(k).cloned()
}

fn toml_file(body: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(body.as_bytes()).unwrap();
    f
}

#[test]
fn explicit_path_wins_over_env_file() {
    let explicit = toml_file("collection = \"explicit\"\ndefault_page_size = 7\n");
    let from_env = toml_file("collection = \"from_env\"\n");
    let env_path = from_env.path().display().to_string();
    let cfg = BookstoreConfig::load_with(Some(explicit.path()), env(&[("BOOKSTORE_CONFIG", env_path.as_str())])).unwrap();
    assert_eq!(cfg.collection, "explicit");
    assert_eq!(cfg.default_page_size, 7);
    assert!(cfg.validate_on_write);
}

#[test]
fn env_named_file_then_env_overrides() {
    let file = toml_file("collection = \"shelf\"\nvalidate_on_write = true\n[logging]\nlevel = \"warn\"\n");
    let path = file.path().display().to_string();
    let cfg = BookstoreConfig::load_with(
        None,
        env(&[("BOOKSTORE_CONFIG", path.as_str()), ("BOOKSTORE_VALIDATE", "false"), ("BOOKSTORE_LOG_LEVEL", "trace")]),
    )
    .unwrap();
    assert_eq!(cfg.collection, "shelf");
    assert!(!cfg.validate_on_write);
    assert_eq!(cfg.logging.level.as_deref(), Some("trace"));
    assert!(!cfg.service().validate_on_write);
}

#[test]
fn defaults_without_any_source() {
    let cfg = BookstoreConfig::load_with(None, env(&[])).unwrap();
    assert_eq!(cfg, BookstoreConfig::default());
    assert_eq!(cfg.service().default_page_size, 5);
}

#[test]
fn missing_or_malformed_files_are_errors() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");
    assert!(matches!(BookstoreConfig::load_with(Some(missing.as_path()), env(&[])), Err(ConfigError::Io { .. })));
    let broken = toml_file("default_page_size = \"five\"\n");
    assert!(matches!(BookstoreConfig::load_with(Some(broken.path()), env(&[])), Err(ConfigError::Toml(_))));
}
