//! Data root and log directory resolution.
//!
//! Resolution order for the data root:
//! 1. `L2DATA` environment variable
//! 2. `~/l2data` (or `%APPDATA%\l2data` on Windows), with a one-time warning
//!
//! Bare log directory names resolve under `<root>/logs/`.

use l2_common::{Error, Result};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tracing::warn;

/// Environment variable naming the data root.
pub const L2DATA_ENV: &str = "L2DATA";

/// Directory name used under the platform default location.
const DEFAULT_ROOT_NAME: &str = "l2data";

/// Subdirectory of the data root holding scenario logs.
const LOGS_DIR_NAME: &str = "logs";

static DEFAULT_ROOT_WARNING: Once = Once::new();

/// Resolve (and create if needed) the data root directory.
pub fn data_root() -> Result<PathBuf> {
    let root = root_from(std::env::var_os(L2DATA_ENV))?;
    fs::create_dir_all(&root)?;
    Ok(root)
}

fn root_from(env_value: Option<OsString>) -> Result<PathBuf> {
    if let Some(value) = env_value.filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(value));
    }

    let base = default_base_dir().ok_or_else(|| {
        Error::InvalidConfiguration(format!(
            "{L2DATA_ENV} is not set and no user home directory could be determined"
        ))
    })?;
    let root = base.join(DEFAULT_ROOT_NAME);
    DEFAULT_ROOT_WARNING.call_once(|| {
        warn!(
            root = %root.display(),
            "{L2DATA_ENV} directory not specified; using default data root. \
             Set {L2DATA_ENV} to the top level folder under which all data is stored"
        );
    });
    Ok(root)
}

#[cfg(windows)]
fn default_base_dir() -> Option<PathBuf> {
    dirs::data_dir()
}

#[cfg(not(windows))]
fn default_base_dir() -> Option<PathBuf> {
    dirs::home_dir()
}

/// Resolve a caller-supplied log directory.
///
/// A bare name such as `my_scenario-1700000000-000001` is looked up under
/// `<data root>/logs/`. Any path with a parent component must already be a
/// directory.
pub fn resolve_log_dir(input: impl AsRef<Path>) -> Result<PathBuf> {
    let input = input.as_ref();
    if is_bare_name(input) {
        return Ok(data_root()?.join(LOGS_DIR_NAME).join(input));
    }
    if input.is_dir() {
        Ok(input.to_path_buf())
    } else {
        Err(Error::not_found(input))
    }
}

fn is_bare_name(path: &Path) -> bool {
    !path.is_absolute()
        && path
            .parent()
            .map(|p| p.as_os_str().is_empty())
            .unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_env_value_wins() {
        let root = root_from(Some(OsString::from("/data/l2"))).unwrap();
        assert_eq!(root, PathBuf::from("/data/l2"));
    }

    #[test]
    fn test_empty_env_value_falls_back() {
        let root = root_from(Some(OsString::new()));
        if let Ok(root) = root {
            assert!(root.ends_with(DEFAULT_ROOT_NAME));
        }
    }

    #[test]
    fn test_bare_name_detection() {
        assert!(is_bare_name(Path::new("scenario-1-000000")));
        assert!(!is_bare_name(Path::new("logs/scenario")));
        assert!(!is_bare_name(Path::new("/abs/scenario")));
        assert!(!is_bare_name(Path::new("./scenario")));
    }

    #[test]
    fn test_existing_directory_passes_through() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("scenario");
        fs::create_dir(&nested).unwrap();
        assert_eq!(resolve_log_dir(&nested).unwrap(), nested);
    }

    #[test]
    fn test_missing_directory_not_found() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("absent");
        assert!(matches!(resolve_log_dir(&missing), Err(Error::NotFound { .. })));
    }
}
