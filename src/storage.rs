//! Typed key-value persistence.
//!
//! Every persisted value is addressed by a [`StorageKey`] and encoded as JSON.
//! Backends only deal in raw strings.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::error::StorageError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StorageKey {
    LikedVideos,
    FavoritedVideos,
    FollowedUsers,
    Comments(String),
    VirtualCommentCount(String),
    LikedComments(String),
    SearchHistory,
    Volume,
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageKey::LikedVideos => f.write_str("likedVideos"),
            StorageKey::FavoritedVideos => f.write_str("favoritedVideos"),
            StorageKey::FollowedUsers => f.write_str("followedUsers"),
            StorageKey::Comments(id) => write!(f, "video_comments_{id}"),
            StorageKey::VirtualCommentCount(id) => write!(f, "video_virtual_count_{id}"),
            StorageKey::LikedComments(id) => write!(f, "video_liked_comments_{id}"),
            StorageKey::SearchHistory => f.write_str("searchHistory"),
            StorageKey::Volume => f.write_str("videoVolume"),
        }
    }
}

pub trait KeyValueBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// One JSON file per key under a data directory.
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(key)))
    }
}

/// Escapes a key into a file name; distinct keys never share a file.
fn file_stem(key: &str) -> String {
    url::form_urlencoded::byte_serialize(key.as_bytes()).collect()
}

impl KeyValueBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match std::fs::read_to_string(path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, value)?;
        if let Err(error) = std::fs::rename(&tmp_path, &path) {
            let _ = std::fs::remove_file(&path);
            std::fs::rename(&tmp_path, &path).map_err(|_| error)?;
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory backend that also records how often each key was written.
#[derive(Default)]
pub struct MemoryBackend {
    values: Mutex<HashMap<String, String>>,
    writes: Mutex<HashMap<String, usize>>,
}

#[cfg(test)]
impl MemoryBackend {
    pub fn write_count(&self, key: &StorageKey) -> usize {
        self.writes
            .lock()
            .map(|w| w.get(&key.to_string()).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn raw(&self, key: &StorageKey) -> Option<String> {
        self.values
            .lock()
            .ok()
            .and_then(|v| v.get(&key.to_string()).cloned())
    }
}

impl KeyValueBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let values = self.values.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values
            .lock()
            .map_err(|_| StorageError::Poisoned)?
            .insert(key.to_string(), value.to_string());
        *self
            .writes
            .lock()
            .map_err(|_| StorageError::Poisoned)?
            .entry(key.to_string())
            .or_insert(0) += 1;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.values
            .lock()
            .map_err(|_| StorageError::Poisoned)?
            .remove(key);
        Ok(())
    }
}

/// Shared handle over a backend; cheap to clone into each store.
#[derive(Clone)]
pub struct Storage {
    backend: Arc<dyn KeyValueBackend>,
}

impl Storage {
    pub fn new(backend: Arc<dyn KeyValueBackend>) -> Self {
        Self { backend }
    }

    /// File storage under `dir`, or memory-only storage when there is none.
    pub fn on_disk(dir: Option<PathBuf>) -> Self {
        match dir {
            Some(dir) => Self::new(Arc::new(FileBackend::new(dir))),
            None => {
                log::warn!("no data directory available, state will not be saved");
                Self::new(Arc::new(MemoryBackend::default()))
            }
        }
    }

    pub fn load<T: DeserializeOwned>(&self, key: &StorageKey) -> Result<Option<T>, StorageError> {
        match self.backend.get(&key.to_string())? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Like [`Storage::load`], but logs failures and treats them as missing.
    pub fn load_or_default<T: DeserializeOwned + Default>(&self, key: &StorageKey) -> T {
        match self.load(key) {
            Ok(value) => value.unwrap_or_default(),
            Err(e) => {
                log::warn!("failed to read {key}: {e}");
                T::default()
            }
        }
    }

    pub fn save<T: Serialize + ?Sized>(
        &self,
        key: &StorageKey,
        value: &T,
    ) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)?;
        self.backend.set(&key.to_string(), &raw)
    }

    /// Like [`Storage::save`], but only logs failures.
    pub fn save_logged<T: Serialize + ?Sized>(&self, key: &StorageKey, value: &T) {
        if let Err(e) = self.save(key, value) {
            log::error!("failed to persist {key}: {e}");
        }
    }

    pub fn remove(&self, key: &StorageKey) -> Result<(), StorageError> {
        self.backend.remove(&key.to_string())
    }
}

#[cfg(test)]
pub(crate) fn memory_storage() -> (Storage, Arc<MemoryBackend>) {
    let backend = Arc::new(MemoryBackend::default());
    (Storage::new(backend.clone()), backend)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn keys_are_namespaced_per_entity() {
        assert_eq!(StorageKey::LikedVideos.to_string(), "likedVideos");
        assert_eq!(StorageKey::Comments("7".into()).to_string(), "video_comments_7");
        assert_eq!(
            StorageKey::VirtualCommentCount("7".into()).to_string(),
            "video_virtual_count_7"
        );
        assert_eq!(StorageKey::SearchHistory.to_string(), "searchHistory");
    }

    #[test]
    fn virtual_count_is_a_stringified_integer() {
        let (storage, backend) = memory_storage();
        let key = StorageKey::VirtualCommentCount("1".into());
        storage.save(&key, &446u64).expect("save");
        assert_eq!(backend.raw(&key).as_deref(), Some("446"));
        assert_eq!(storage.load::<u64>(&key).expect("load"), Some(446));
    }

    #[test]
    fn file_backend_round_trips_and_removes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = Storage::on_disk(Some(dir.path().to_path_buf()));
        let key = StorageKey::Comments("a/b".into());

        assert_eq!(storage.load::<Vec<String>>(&key).expect("load"), None);
        storage
            .save(&key, &vec!["x".to_string(), "y".to_string()])
            .expect("save");
        assert!(dir.path().join("video_comments_a_b.json").exists());
        assert_eq!(
            storage.load::<Vec<String>>(&key).expect("load"),
            Some(vec!["x".to_string(), "y".to_string()])
        );

        storage.remove(&key).expect("remove");
        assert_eq!(storage.load::<Vec<String>>(&key).expect("load"), None);
    }

    #[test]
    fn ids_with_separators_get_their_own_files() {
        assert_eq!(file_stem("video_comments_7"), "video_comments_7");
        assert_ne!(file_stem("video_comments_a/b"), file_stem("video_comments_a_b"));
        assert!(!file_stem("video_comments_../x").contains('/'));

        let dir = tempfile::tempdir().expect("tempdir");
        let storage = Storage::on_disk(Some(dir.path().to_path_buf()));
        let slash = StorageKey::VirtualCommentCount("a/b".into());
        let underscore = StorageKey::VirtualCommentCount("a_b".into());
        storage.save(&slash, &3u64).expect("save");
        storage.save(&underscore, &9u64).expect("save");

        assert_eq!(storage.load::<u64>(&slash).expect("load"), Some(3));
        assert_eq!(storage.load::<u64>(&underscore).expect("load"), Some(9));
    }

    #[test]
    fn without_data_dir_state_lives_in_memory() {
        let storage = Storage::on_disk(None);
        storage.save(&StorageKey::Volume, &0.5).expect("save");
        assert_eq!(storage.load::<f64>(&StorageKey::Volume).expect("load"), Some(0.5));
    }

    #[test]
    fn corrupt_values_fall_back_to_default() {
        let (storage, backend) = memory_storage();
        backend.set("searchHistory", "{not json").expect("set");
        let history: Vec<String> = storage.load_or_default(&StorageKey::SearchHistory);
        assert!(history.is_empty());
    }
}
