//! File-based storage helpers
//!
//! Everything the application persists lives under one data directory
//! (`~/.bhai-ki-advice/` unless configured otherwise):
//! - `advices.json` - the shared advice feed (server side)
//! - `local_storage.json` - device-local key/value storage (client side)
//! - `config.toml` / `secrets.toml` - configuration

use fs2::FileExt;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

/// Common file operations result type
pub type FileResult<T> = Result<T, String>;

/// Name of the data directory in the user's home
pub const DATA_DIR_NAME: &str = ".bhai-ki-advice";

/// Get the global data directory in user home
pub fn get_global_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DATA_DIR_NAME)
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> FileResult<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .map_err(|e| format!("Failed to create directory {:?}: {}", path, e))?;
    }
    Ok(())
}

/// Write data to a file atomically (temp file + rename)
pub fn atomic_write(path: &Path, content: &str) -> FileResult<()> {
    let temp_path = path.with_extension("tmp");

    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }

    fs::write(&temp_path, content)
        .map_err(|e| format!("Failed to write temp file {:?}: {}", temp_path, e))?;

    fs::rename(&temp_path, path)
        .map_err(|e| format!("Failed to rename {:?} to {:?}: {}", temp_path, path, e))?;

    Ok(())
}

/// Read a JSON file and deserialize it
pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> FileResult<T> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read file {:?}: {}", path, e))?;

    serde_json::from_str(&content)
        .map_err(|e| format!("Failed to parse JSON from {:?}: {}", path, e))
}

/// Write data as pretty-printed JSON atomically
pub fn write_json<T: serde::Serialize>(path: &Path, data: &T) -> FileResult<()> {
    let content = serde_json::to_string_pretty(data)
        .map_err(|e| format!("Failed to serialize to JSON: {}", e))?;

    atomic_write(path, &content)
}

/// Write JSON while holding an exclusive lock on `<path>.lock`
///
/// Fails immediately instead of waiting when another process (a second
/// server on the same data directory) holds the lock.
pub fn write_json_locked<T: serde::Serialize>(path: &Path, data: &T) -> FileResult<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }

    let lock_path = path.with_extension("lock");
    let lock_file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&lock_path)
        .map_err(|e| format!("Failed to open lock file {:?}: {}", lock_path, e))?;

    // Never block the caller: another process holding the lock is an error
    lock_file.try_lock_exclusive().map_err(|e| {
        if e.kind() == fs2::lock_contended_error().kind() {
            format!("{:?} is locked by another process", lock_path)
        } else {
            format!("Failed to lock {:?}: {}", lock_path, e)
        }
    })?;

    let result = write_json(path, data);

    if let Err(e) = FileExt::unlock(&lock_file) {
        log::warn!("Failed to release lock {:?}: {}", lock_path, e);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ensure_dir() {
        let temp_dir = TempDir::new().unwrap();
        let nested_path = temp_dir.path().join("a").join("b").join("c");

        assert!(!nested_path.exists());
        ensure_dir(&nested_path).unwrap();
        assert!(nested_path.exists());
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("feed.json");

        atomic_write(&file_path, "[]").unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "[]");
        assert!(!file_path.with_extension("tmp").exists());
    }

    #[test]
    fn test_read_write_json() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("nested").join("ids.json");

        let ids = vec!["a".to_string(), "b".to_string()];
        write_json_locked(&file_path, &ids).unwrap();
        let read_back: Vec<String> = read_json(&file_path).unwrap();

        assert_eq!(ids, read_back);
    }

    #[test]
    fn test_locked_write_fails_fast_when_contended() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("advices.json");
        write_json_locked(&file_path, &vec!["a"]).unwrap();

        let holder = OpenOptions::new()
            .write(true)
            .open(file_path.with_extension("lock"))
            .unwrap();
        holder.lock_exclusive().unwrap();

        let result = write_json_locked(&file_path, &vec!["b"]);
        assert!(result.unwrap_err().contains("locked by another process"));
        let unchanged: Vec<String> = read_json(&file_path).unwrap();
        assert_eq!(unchanged, vec!["a".to_string()]);

        FileExt::unlock(&holder).unwrap();
        write_json_locked(&file_path, &vec!["b"]).unwrap();
    }

    #[test]
    fn test_read_json_reports_parse_errors() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("broken.json");
        fs::write(&file_path, "{not json").unwrap();

        let result: FileResult<Vec<String>> = read_json(&file_path);
        assert!(result.unwrap_err().contains("Failed to parse JSON"));
    }
}
