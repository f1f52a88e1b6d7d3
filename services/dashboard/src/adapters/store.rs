//! services/dashboard/src/adapters/store.rs
//!
//! This module contains the local storage adapter, the concrete implementation
//! of the `PersistenceStore` port. Each storage key is one JSON file inside the
//! data directory.

use async_trait::async_trait;
use flareonix_core::domain::{IdeaEvaluation, UserProfile};
use flareonix_core::persistence::{
    decode_history, decode_profile, encode_record, RecordError, HISTORY_KEY, PROFILE_KEY,
};
use flareonix_core::ports::{PersistenceStore, PortError, PortResult, StoredState};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A key-value store that keeps every record in `<dir>/<key>.json`.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Creates a new `JsonFileStore` rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Creates the data directory if it does not exist yet.
    pub async fn ensure_dir(&self) -> PortResult<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| storage_error(&self.dir, e))
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    async fn read_key(&self, key: &str) -> PortResult<Option<String>> {
        let path = self.path_for(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_error(&path, e)),
        }
    }

    /// Replaces a record in one step: write a sibling temp file, then rename it.
    async fn write_key(&self, key: &str, contents: String) -> PortResult<()> {
        self.ensure_dir().await?;
        let path = self.path_for(key);
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        tokio::fs::write(&tmp, contents)
            .await
            .map_err(|e| storage_error(&tmp, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| storage_error(&path, e))?;
        debug!("Wrote record {}", path.display());
        Ok(())
    }

    async fn remove_key(&self, key: &str) -> PortResult<()> {
        let path = self.path_for(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error(&path, e)),
        }
    }

    /// Reads and decodes one record, discarding it if it cannot be understood.
    async fn load_key<T>(
        &self,
        key: &str,
        decode: fn(&str) -> Result<T, RecordError>,
    ) -> PortResult<Option<T>> {
        let Some(raw) = self.read_key(key).await? else {
            return Ok(None);
        };
        match decode(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(
                    "Discarding unreadable record {}: {}",
                    self.path_for(key).display(),
                    e
                );
                Ok(None)
            }
        }
    }
}

fn storage_error(path: &Path, e: std::io::Error) -> PortError {
    PortError::Storage(format!("{}: {}", path.display(), e))
}

fn encode<T: serde::Serialize + ?Sized>(value: &T) -> PortResult<String> {
    encode_record(value).map_err(|e| PortError::Storage(e.to_string()))
}

//=========================================================================================
// `PersistenceStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl PersistenceStore for JsonFileStore {
    async fn load(&self) -> PortResult<StoredState> {
        let profile = self.load_key(PROFILE_KEY, decode_profile).await?;
        let history = self
            .load_key(HISTORY_KEY, decode_history)
            .await?
            .unwrap_or_default();
        info!(
            "Loaded local state: profile {}, {} evaluations.",
            if profile.is_some() { "present" } else { "absent" },
            history.len()
        );
        Ok(StoredState { profile, history })
    }

    async fn save_profile(&self, profile: &UserProfile) -> PortResult<()> {
        self.write_key(PROFILE_KEY, encode(profile)?).await
    }

    async fn remove_profile(&self) -> PortResult<()> {
        self.remove_key(PROFILE_KEY).await
    }

    async fn save_history(&self, history: &[IdeaEvaluation]) -> PortResult<()> {
        self.write_key(HISTORY_KEY, encode(history)?).await
    }

    async fn remove_history(&self) -> PortResult<()> {
        self.remove_key(HISTORY_KEY).await
    }
}
