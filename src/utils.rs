//! Shared path helpers.
//!
//! These functions are reused across the CLI and TUI interfaces.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

const APP_DIR: &str = "evsearch";

/// Gets the cross-platform application data directory.
///
/// Returns `{data_dir}/evsearch` where `data_dir` is:
/// - Linux: `~/.local/share`
/// - macOS: `~/Library/Application Support`
/// - Windows: `C:\Users\<user>\AppData\Roaming`
///
/// # Errors
///
/// Returns an error if the data directory cannot be determined.
pub fn get_data_directory() -> Result<PathBuf> {
    let data_dir =
        dirs::data_dir().ok_or_else(|| anyhow::anyhow!("Failed to determine data directory"))?;

    Ok(data_dir.join(APP_DIR))
}

/// Default location of the vector index: `{data_dir}/evsearch/index.db`.
pub fn get_default_index_path() -> Result<PathBuf> {
    Ok(get_data_directory()?.join("index.db"))
}

/// Directory that receives the rolling log files: `{data_dir}/evsearch/logs`.
pub fn get_log_directory() -> Result<PathBuf> {
    Ok(get_data_directory()?.join("logs"))
}

/// Ensures the parent directory of `path` exists.
///
/// Creates the directory structure if it doesn't exist using `create_dir_all`.
///
/// # Errors
///
/// Returns an error if directory creation fails.
pub fn ensure_parent_directory(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_paths_live_under_app_directory() {
        let index = get_default_index_path().unwrap();
        assert!(index.ends_with("evsearch/index.db"));

        let logs = get_log_directory().unwrap();
        assert!(logs.ends_with("evsearch/logs"));
        assert_eq!(index.parent(), logs.parent());
    }

    #[test]
    fn ensure_parent_directory_creates_nested_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("index.db");

        ensure_parent_directory(&path).unwrap();
        assert!(path.parent().unwrap().is_dir());
        assert!(!path.exists());

        // second call is a no-op
        ensure_parent_directory(&path).unwrap();
    }

    #[test]
    fn ensure_parent_directory_accepts_bare_file_name() {
        assert!(ensure_parent_directory(Path::new("index.db")).is_ok());
    }
}
