use std::path::Path;

use action_runner_registry::{Registry, RegistryConfig};

// ---------------------------------------------------------------------------
// Opening
// ---------------------------------------------------------------------------

#[test]
fn test_open_creates_missing_file_and_directory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("action-runner").join("config.json");

    let registry = Registry::open(&path).unwrap();
    assert!(path.is_file());
    assert!(registry.is_empty());
    assert_eq!(registry.locale(), "en-us");

    let on_disk = RegistryConfig::load(&path).unwrap();
    assert_eq!(&on_disk, registry.config());
}

#[test]
fn test_open_reads_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{ "actions": { "ops": "/srv/ops" }, "locale": "en-gb" }"#,
    )
    .unwrap();

    let registry = Registry::open(&path).unwrap();
    assert_eq!(registry.lookup("ops"), Some(Path::new("/srv/ops")));
    assert_eq!(registry.locale(), "en-gb");
    assert!(registry.exclusion_pattern().unwrap().is_match("index.yml"));
}

// ---------------------------------------------------------------------------
// Editing
// ---------------------------------------------------------------------------

#[test]
fn test_register_save_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");

    let mut registry = Registry::open(&path).unwrap();
    registry.register("web", "/srv/web").unwrap();
    registry.register("db", "/srv/db").unwrap();
    registry.save().unwrap();

    let reopened = Registry::open(&path).unwrap();
    let names: Vec<&str> = reopened.list().map(|(name, _)| name).collect();
    assert_eq!(names, ["db", "web"]);
    assert_eq!(reopened.lookup("web"), Some(Path::new("/srv/web")));
}

#[test]
fn test_register_replaces_existing_entry() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = Registry::open(dir.path().join("config.json")).unwrap();

    registry.register("web", "/srv/old").unwrap();
    registry.register("web", "/srv/new").unwrap();
    assert_eq!(registry.lookup("web"), Some(Path::new("/srv/new")));
    assert_eq!(registry.list().count(), 1);
}

#[test]
fn test_unregister_reports_presence() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");

    let mut registry = Registry::open(&path).unwrap();
    registry.register("web", "/srv/web").unwrap();
    assert!(registry.unregister("web"));
    assert!(!registry.unregister("web"));
    registry.save().unwrap();

    assert!(Registry::open(&path).unwrap().lookup("web").is_none());
}
