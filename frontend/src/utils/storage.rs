use std::{
    cell::RefCell,
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    rc::Rc,
};

/// Slot holding the reset token between OTP verification and the password
/// reset call.
pub const RESET_TOKEN_KEY: &str = "token";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage is unavailable: {0}")]
    Unavailable(String),
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Durable string slots keyed by name.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl KeyValueStore for MemoryStorage {
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

/// JSON object on disk, rewritten on every change.
#[derive(Clone, Debug)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let storage = Self { path: path.into() };
        storage.load()?;
        Ok(storage)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<HashMap<String, String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(HashMap::new()),
            Ok(raw) => serde_json::from_str(&raw).map_err(|source| StorageError::Decode {
                path: self.path.clone(),
                source,
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(source) => Err(StorageError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn save(&self, entries: &HashMap<String, String>) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let raw = serde_json::to_string_pretty(entries).map_err(|source| StorageError::Decode {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, raw).map_err(io_err)
    }
}

impl KeyValueStore for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
pub use browser::{local_storage, window, BrowserStorage};

#[cfg(target_arch = "wasm32")]
mod browser {
    use super::{KeyValueStore, StorageError};
    use web_sys::{Storage, Window};

    pub fn window() -> Result<Window, String> {
        web_sys::window().ok_or_else(|| "No window object".to_string())
    }

    pub fn local_storage() -> Result<Storage, String> {
        window()?
            .local_storage()
            .map_err(|_| "No localStorage".to_string())?
            .ok_or_else(|| "No localStorage".to_string())
    }

    /// `window.localStorage`, resolved on each access.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct BrowserStorage;

    fn storage() -> Result<Storage, StorageError> {
        local_storage().map_err(StorageError::Unavailable)
    }

    impl KeyValueStore for BrowserStorage {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            storage()?
                .get_item(key)
                .map_err(|_| StorageError::Unavailable(format!("Failed to read {}", key)))
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            storage()?
                .set_item(key, value)
                .map_err(|_| StorageError::Unavailable(format!("Failed to write {}", key)))
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            storage()?
                .remove_item(key)
                .map_err(|_| StorageError::Unavailable(format!("Failed to remove {}", key)))
        }
    }

}

/// Durable store for the current target: `localStorage` in the browser,
/// process memory elsewhere.
pub fn default_store() -> Rc<dyn KeyValueStore> {
    #[cfg(target_arch = "wasm32")]
    {
        if browser::local_storage().is_ok() {
            return Rc::new(BrowserStorage);
        }
        log::warn!("localStorage unavailable; reset token kept in memory");
    }
    Rc::new(MemoryStorage::default())
}
