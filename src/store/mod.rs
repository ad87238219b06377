pub mod json_store;
pub mod parent_settings;
pub mod progress;
pub mod schema;

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

pub use json_store::FileBackend;
pub use parent_settings::{ParentSettingsConfig, ParentSettingsStore};
pub use progress::{AnswerEvent, ProgressStore, ProgressStoreConfig};
pub use schema::{ParentSettings, ProgressRecord};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("stored value is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// String key/value persistence the stores sit on.
pub trait KeyValueBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<B: KeyValueBackend + ?Sized> KeyValueBackend for &B {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

impl<B: KeyValueBackend + ?Sized> KeyValueBackend for Rc<B> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

/// Process-local backend. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// Read `key` and overlay it onto `defaults`. Absent values, backend
/// failures and undecodable blobs all come back as `defaults`.
pub(crate) fn load_merged<B, T>(backend: &B, key: &str, defaults: T, what: &str) -> T
where
    B: KeyValueBackend + ?Sized,
    T: Serialize + DeserializeOwned,
{
    let saved = match backend.get(key) {
        Ok(Some(saved)) => saved,
        Ok(None) => return defaults,
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to load {what}");
            return defaults;
        }
    };

    let decoded = serde_json::from_str::<serde_json::Value>(&saved).and_then(|overlay| {
        let base = serde_json::to_value(&defaults)?;
        serde_json::from_value(schema::shallow_merge(base, overlay))
    });
    match decoded {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to load {what}");
            defaults
        }
    }
}

/// Serialize and write `value`; failures are logged and the write is lost.
pub(crate) fn save_logged<B, T>(backend: &B, key: &str, value: &T, what: &str)
where
    B: KeyValueBackend + ?Sized,
    T: Serialize,
{
    let result = serde_json::to_string(value)
        .map_err(StorageError::from)
        .and_then(|json| backend.set(key, &json));
    if let Err(e) = result {
        tracing::error!(key, error = %e, "failed to save {what}");
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Backend whose every call fails, for exercising the never-throw paths.
    pub struct BrokenBackend;

    impl KeyValueBackend for BrokenBackend {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("quota exceeded".into()))
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("quota exceeded".into()))
        }

        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("quota exceeded".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_backend_round_trip() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.get("k").unwrap(), None);
        backend.set("k", "v").unwrap();
        assert_eq!(backend.get("k").unwrap().as_deref(), Some("v"));
        backend.remove("k").unwrap();
        assert_eq!(backend.get("k").unwrap(), None);
    }

    #[test]
    fn shared_backend_through_rc() {
        let backend = Rc::new(MemoryBackend::new());
        let a = Rc::clone(&backend);
        a.set("k", "1").unwrap();
        assert_eq!(backend.get("k").unwrap().as_deref(), Some("1"));
    }
}
