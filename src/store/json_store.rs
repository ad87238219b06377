use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::store::{KeyValueBackend, StorageError};

/// Keeps each storage key in its own `<key>.json` file under `base_dir`.
pub struct FileBackend {
    base_dir: PathBuf,
}

fn io_error(path: &Path, source: std::io::Error) -> StorageError {
    StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl FileBackend {
    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_dir).map_err(|e| io_error(&base_dir, e))?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn file_path(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{}.json", Self::sanitize_key(key)))
    }

    fn sanitize_key(key: &str) -> String {
        key.chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}

impl KeyValueBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.file_path(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(&path, e)),
        }
    }

    /// Write through a temporary file and rename it into place so a crash
    /// mid-write never leaves a truncated value behind.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.file_path(key);
        let tmp_path = path.with_extension("json.tmp");

        let write = || -> std::io::Result<()> {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
            fs::rename(&tmp_path, &path)
        };
        write().map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            io_error(&path, e)
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.file_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_test_backend() -> (TempDir, FileBackend) {
        let dir = TempDir::new().unwrap();
        let backend = FileBackend::with_base_dir(dir.path().to_path_buf()).unwrap();
        (dir, backend)
    }

    #[test]
    fn missing_key_reads_as_none() {
        let (_dir, backend) = make_test_backend();
        assert_eq!(backend.get("science_sprouts_progress").unwrap(), None);
    }

    #[test]
    fn set_then_get() {
        let (dir, backend) = make_test_backend();
        backend.set("science_sprouts_progress", "{\"a\":1}").unwrap();
        assert_eq!(
            backend.get("science_sprouts_progress").unwrap().as_deref(),
            Some("{\"a\":1}")
        );
        assert!(dir.path().join("science_sprouts_progress.json").exists());
    }

    #[test]
    fn no_residual_tmp_files() {
        let (dir, backend) = make_test_backend();
        backend.set("k", "one").unwrap();
        backend.set("k", "two").unwrap();
        let tmp_files: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(tmp_files.is_empty(), "no residual .tmp files");
        assert_eq!(backend.get("k").unwrap().as_deref(), Some("two"));
    }

    #[test]
    fn keys_are_sanitized_into_file_names() {
        let (dir, backend) = make_test_backend();
        backend.set("../escape/key", "x").unwrap();
        assert!(dir.path().join(".._escape_key.json").exists());
    }

    #[test]
    fn remove_is_idempotent() {
        let (_dir, backend) = make_test_backend();
        backend.set("k", "v").unwrap();
        backend.remove("k").unwrap();
        backend.remove("k").unwrap();
        assert_eq!(backend.get("k").unwrap(), None);
    }

    #[test]
    fn write_into_missing_directory_fails() {
        let (dir, _backend) = make_test_backend();
        let backend = FileBackend {
            base_dir: dir.path().join("nonexistent_subdir"),
        };
        let err = backend.set("k", "v").unwrap_err();
        assert!(matches!(err, StorageError::Io { .. }));
    }
}
