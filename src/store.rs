//! On-disk record store for encode metadata and keys.
//!
//! Each encode gets a random id; its artifacts live side by side:
//!
//! ```text
//! <dir>/<id>_metadata.txt   four-line metadata record
//! <dir>/<id>_key.bin        raw keystream bytes
//! ```

use crate::error::{Result, StegoError};
use crate::metadata::{EncodeMetadata, Key};
use log::debug;
use rand::RngCore;
use std::fs;
use std::path::{Path, PathBuf};

const ID_BYTES: usize = 16;

#[derive(Debug, Clone)]
pub struct RecordStore {
    dir: PathBuf,
}

impl RecordStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Fresh random record id (32 hex characters)
    pub fn new_id() -> String {
        let mut bytes = [0u8; ID_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    fn metadata_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}_metadata.txt", id))
    }

    fn key_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}_key.bin", id))
    }

    /// Persist a record under a new id and return the id
    pub fn save(&self, metadata: &EncodeMetadata, key: &Key) -> Result<String> {
        let id = Self::new_id();
        self.save_as(&id, metadata, key)?;
        Ok(id)
    }

    /// Persist a record under a caller-chosen id, replacing any existing one
    pub fn save_as(&self, id: &str, metadata: &EncodeMetadata, key: &Key) -> Result<()> {
        validate_id(id)?;
        fs::create_dir_all(&self.dir)?;
        fs::write(self.metadata_path(id), metadata.to_record())?;
        fs::write(self.key_path(id), key.as_bytes())?;
        debug!("stored record {} in {}", id, self.dir.display());
        Ok(())
    }

    /// Delete the files stored under `id`; missing files are not an error
    pub fn remove(&self, id: &str) -> Result<()> {
        validate_id(id)?;
        for path in [self.metadata_path(id), self.key_path(id)] {
            match fs::remove_file(&path) {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e.into()),
                _ => {}
            }
        }
        debug!("removed record {} from {}", id, self.dir.display());
        Ok(())
    }

    pub fn exists(&self, id: &str) -> bool {
        validate_id(id).is_ok() && self.metadata_path(id).is_file() && self.key_path(id).is_file()
    }

    /// Load the metadata and key stored under `id`
    pub fn load(&self, id: &str) -> Result<(EncodeMetadata, Key)> {
        validate_id(id)?;
        if !self.exists(id) {
            return Err(StegoError::RecordNotFound(id.to_string()));
        }
        let text = fs::read_to_string(self.metadata_path(id))?;
        let metadata = EncodeMetadata::from_record(&text)?;
        let key = Key::new(fs::read(self.key_path(id))?);

        let expected = metadata.message_bit_length / 8;
        if key.len() != expected {
            return Err(StegoError::InvalidKey(format!(
                "key has {} bytes, record describes {}",
                key.len(),
                expected
            )));
        }
        Ok((metadata, key))
    }
}

// Ids become file name prefixes
fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(StegoError::RecordNotFound(format!("invalid record id {:?}", id)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::lsb::Strategy;
    use crate::pipeline::segment::Segment;
    use tempfile::tempdir;

    fn sample_record() -> (EncodeMetadata, Key) {
        (
            EncodeMetadata::new(Segment::new(100, 500), 24, Strategy::Chaotic),
            Key::new(vec![1, 2, 3]),
        )
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("records"));
        let (meta, key) = sample_record();

        let id = store.save(&meta, &key).unwrap();
        assert_eq!(id.len(), 32);
        assert!(store.exists(&id));
        assert!(dir.path().join("records").join(format!("{}_key.bin", id)).is_file());

        let (loaded_meta, loaded_key) = store.load(&id).unwrap();
        assert_eq!(loaded_meta, meta);
        assert_eq!(loaded_key, key);
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(RecordStore::new_id(), RecordStore::new_id());
    }

    #[test]
    fn test_missing_record() {
        let dir = tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        assert!(matches!(store.load("abc123"), Err(StegoError::RecordNotFound(_))));
        assert!(matches!(store.load("../etc"), Err(StegoError::RecordNotFound(_))));
    }

    #[test]
    fn test_key_length_mismatch() {
        let dir = tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        let (meta, _) = sample_record();
        store.save_as("short", &meta, &Key::new(vec![9])).unwrap();
        assert!(matches!(store.load("short"), Err(StegoError::InvalidKey(_))));
    }

    #[test]
    fn test_remove_record() {
        let dir = tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        let (meta, key) = sample_record();
        let id = store.save(&meta, &key).unwrap();

        store.remove(&id).unwrap();
        assert!(!store.exists(&id));
        assert!(matches!(store.load(&id), Err(StegoError::RecordNotFound(_))));
        store.remove(&id).unwrap();
    }
}
