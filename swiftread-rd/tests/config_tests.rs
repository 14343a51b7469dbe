//! Library file resolution tests
//!
//! Environment-variable cases are serialized since the process
//! environment is shared across the test binary.

use std::path::{Path, PathBuf};

use serial_test::serial;
use swiftread_rd::config::{
    default_library_file, ensure_parent_dir, resolve_library_file, LIBRARY_FILE_ENV,
};
use tempfile::TempDir;

#[test]
#[serial]
fn cli_argument_wins_over_environment() {
    std::env::set_var(LIBRARY_FILE_ENV, "/env/library.json");
    let resolved = resolve_library_file(Some(Path::new("/cli/library.json")));
    std::env::remove_var(LIBRARY_FILE_ENV);

    assert_eq!(resolved, PathBuf::from("/cli/library.json"));
}

#[test]
#[serial]
fn environment_wins_over_defaults() {
    std::env::set_var(LIBRARY_FILE_ENV, "/env/library.json");
    let resolved = resolve_library_file(None);
    std::env::remove_var(LIBRARY_FILE_ENV);

    assert_eq!(resolved, PathBuf::from("/env/library.json"));
}

#[test]
#[serial]
fn empty_environment_variable_is_ignored() {
    std::env::set_var(LIBRARY_FILE_ENV, "");
    let resolved = resolve_library_file(None);
    std::env::remove_var(LIBRARY_FILE_ENV);

    // Falls through to the config file or the compiled default; either way
    // the result names a JSON file.
    assert!(resolved.to_string_lossy().ends_with(".json"));
}

#[test]
#[serial]
fn without_overrides_resolution_produces_a_usable_path() {
    std::env::remove_var(LIBRARY_FILE_ENV);
    let resolved = resolve_library_file(None);
    assert!(!resolved.as_os_str().is_empty());
}

#[test]
fn compiled_default_names_a_json_file() {
    let default = default_library_file();
    assert!(default.to_string_lossy().ends_with(".json"));
}

#[test]
fn ensure_parent_dir_creates_missing_directories() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("nested").join("deeper").join("library.json");

    ensure_parent_dir(&target);
    assert!(target.parent().unwrap().is_dir());
}

#[test]
fn ensure_parent_dir_tolerates_unwritable_locations() {
    // Must not panic; the store runs in-memory if this fails
    ensure_parent_dir(Path::new("/proc/definitely/not/writable/library.json"));
}
