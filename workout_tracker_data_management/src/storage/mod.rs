use crate::StorageError;

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// A string-keyed store of string values, shaped after a browser's local storage.
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replaces any previous value under `key`.
    fn set_item(&mut self, key: &str, value: String) -> Result<(), StorageError>;

    /// Removing an absent key is not an error.
    fn remove_item(&mut self, key: &str) -> Result<(), StorageError>;
}
