//! Configuration and library file resolution
//!
//! Library file path resolution priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)

use std::path::{Path, PathBuf};
use tracing::warn;

/// Environment variable naming the library file
pub const LIBRARY_FILE_ENV: &str = "SWIFTREAD_LIBRARY_FILE";

/// Default file name, used when no data directory can be determined
const DEFAULT_FILE_NAME: &str = "swiftread_library.json";

/// Resolve the library file path following the priority order above.
pub fn resolve_library_file(cli_arg: Option<&Path>) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(LIBRARY_FILE_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = library_file_from_config() {
        return path;
    }

    // Priority 4: Compiled default
    default_library_file()
}

/// Read `library_file` from the user config file, if any.
fn library_file_from_config() -> Option<PathBuf> {
    let config_path = dirs::config_dir()?.join("swiftread").join("config.toml");
    let contents = std::fs::read_to_string(&config_path).ok()?;
    match toml::from_str::<toml::Value>(&contents) {
        Ok(config) => config
            .get("library_file")
            .and_then(|v| v.as_str())
            .map(PathBuf::from),
        Err(e) => {
            warn!("ignoring malformed config file {}: {}", config_path.display(), e);
            None
        }
    }
}

/// Platform default: a per-user data directory, or the working directory
/// when none exists.
pub fn default_library_file() -> PathBuf {
    match dirs::data_dir() {
        Some(dir) => dir.join("swiftread").join("library.json"),
        None => PathBuf::from(DEFAULT_FILE_NAME),
    }
}

/// Create the library file's parent directory when missing. Failure is
/// non-fatal; the store degrades to in-memory operation.
pub fn ensure_parent_dir(path: &Path) {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!("could not create {}: {}", parent.display(), e);
            }
        }
    }
}
