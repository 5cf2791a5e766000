use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use crate::{StorageError, STORE_PATH};

use super::KeyValueStore;

/// Keeps every key in a single JSON object on disk. The whole file is read on
/// every access and rewritten on every change.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Opens the store at `STORE_PATH` under the project root.
    pub fn open_default() -> Result<Self, StorageError> {
        let root = project_root::get_project_root()
            .map_err(|err| StorageError::Io(format!("Failed to locate project root: {err}")))?;
        Self::open(root.join(STORE_PATH))
    }

    /// Creates the parent directory if it doesn't exist. The file itself is
    /// only created on the first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();

        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            if !dir.exists() {
                std::fs::create_dir_all(dir)
                    .map_err(|err| StorageError::Io(format!("Failed to create data directory {:?}: {err}", dir)))?;
            }
        }

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_items(&self) -> Result<BTreeMap<String, String>, StorageError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let contents = std::fs::read_to_string(&self.path)
            .map_err(|err| StorageError::Io(format!("Failed to read {:?}: {err}", self.path)))?;

        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&contents)
            .map_err(|err| StorageError::Serialization(format!("Store file {:?} is not a string map: {err}", self.path)))
    }

    fn write_items(&self, items: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let contents = serde_json::to_string_pretty(items)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;

        // Write next to the target, then rename over it
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, contents)
            .map_err(|err| StorageError::Io(format!("Failed to write {:?}: {err}", tmp_path)))?;
        std::fs::rename(&tmp_path, &self.path)
            .map_err(|err| StorageError::Io(format!("Failed to replace {:?}: {err}", self.path)))
    }

    /// Writes start over from an empty map when the file can't be parsed, so
    /// the next change replaces a corrupt file instead of failing forever.
    fn items_for_write(&self) -> Result<(BTreeMap<String, String>, bool), StorageError> {
        match self.read_items() {
            Ok(items) => Ok((items, false)),
            Err(StorageError::Serialization(err)) => {
                tracing::warn!("Overwriting unreadable store file: {err}");
                Ok((BTreeMap::new(), true))
            }
            Err(err) => Err(err),
        }
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_items()?.remove(key))
    }

    fn set_item(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        let (mut items, _) = self.items_for_write()?;
        items.insert(key.to_string(), value);
        self.write_items(&items)
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        let (mut items, corrupt) = self.items_for_write()?;
        if items.remove(key).is_some() || corrupt {
            self.write_items(&items)?;
        }
        Ok(())
    }
}
