//! Key-value storage implementation
//!
//! Layout, one string value per key:
//! - `resume_builder_data`: the legacy single document
//! - `resume_builder_profiles`: profile metadata list, in insertion order
//! - `resume_builder_profile_<id>`: one full serialized profile record

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use async_trait::async_trait;
use crate::document::ResumeDocument;
use crate::profile::{ProfileId, ProfileSummary, Template};
use crate::{Error, Result};
use super::clock::MonotonicClock;
use super::{BackendKind, StorageBackend, StoredProfile};

pub const LEGACY_KEY: &str = "resume_builder_data";
pub const PROFILES_KEY: &str = "resume_builder_profiles";
const PROFILE_KEY_PREFIX: &str = "resume_builder_profile_";

pub fn profile_key(id: ProfileId) -> String {
    format!("{}{}", PROFILE_KEY_PREFIX, id)
}

/// String-keyed string storage, the shape of a browser's local storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

/// In-process store; contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| Error::Backend("memory store lock poisoned".into()))
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries()?.remove(key);
        Ok(())
    }
}

/// One file per key under a directory. Writes go to a temporary file that
/// is renamed over the target, so a reader never sees a half-written value.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub async fn open(dir: &Path) -> Result<Self> {
        tokio::fs::create_dir_all(dir).await?;
        Ok(Self { dir: dir.to_path_buf() })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            return Err(Error::Backend(format!("invalid storage key '{}'", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)?).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        match tokio::fs::remove_file(self.path_for(key)?).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Profile storage over any [`KeyValueStore`]
pub struct KvBackend<S> {
    store: S,
    clock: MonotonicClock,
    // Serializes read-modify-write cycles on the metadata list.
    write_lock: tokio::sync::Mutex<()>,
}

impl<S: KeyValueStore> KvBackend<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            clock: MonotonicClock::new(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Metadata list in insertion order
    async fn load_index(&self) -> Result<Vec<ProfileSummary>> {
        let index: Vec<ProfileSummary> = match self.store.get(PROFILES_KEY).await? {
            Some(raw) => serde_json::from_str(&raw)?,
            None => Vec::new(),
        };
        for entry in &index {
            self.clock.observe(entry.updated_at);
        }
        Ok(index)
    }

    async fn write_index(&self, index: &[ProfileSummary]) -> Result<()> {
        self.store.set(PROFILES_KEY, &serde_json::to_string(index)?).await
    }

    async fn load_record(&self, id: ProfileId) -> Result<Option<StoredProfile>> {
        match self.store.get(&profile_key(id)).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn write_record(&self, record: &StoredProfile) -> Result<()> {
        self.store.set(&profile_key(record.id), &serde_json::to_string(record)?).await
    }

    /// Append a profile. Caller holds `write_lock`.
    async fn insert(
        &self,
        mut index: Vec<ProfileSummary>,
        name: &str,
        data: serde_json::Value,
        template: String,
    ) -> Result<ProfileId> {
        let id = index.iter().map(|p| p.id).max().map_or(1, |max| max + 1);
        let record = StoredProfile {
            id,
            name: name.to_string(),
            data,
            template,
            updated_at: self.clock.now()?,
        };
        self.write_record(&record).await?;
        index.push(ProfileSummary {
            id,
            name: record.name.clone(),
            updated_at: record.updated_at,
        });
        self.write_index(&index).await?;
        Ok(id)
    }
}

#[async_trait]
impl<S: KeyValueStore> StorageBackend for KvBackend<S> {
    fn kind(&self) -> BackendKind {
        BackendKind::KeyValue
    }

    async fn load_legacy_document(&self) -> Result<Option<serde_json::Value>> {
        match self.store.get(LEGACY_KEY).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn save_legacy_document(&self, document: &ResumeDocument) -> Result<()> {
        self.store.set(LEGACY_KEY, &serde_json::to_string(document)?).await
    }

    async fn clear_legacy_document(&self) -> Result<()> {
        self.store.remove(LEGACY_KEY).await
    }

    async fn list_profiles(&self) -> Result<Vec<ProfileSummary>> {
        let mut index = self.load_index().await?;
        // stable: equal timestamps keep insertion order
        index.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(index)
    }

    async fn get_profile(&self, id: ProfileId) -> Result<Option<StoredProfile>> {
        self.load_record(id).await
    }

    async fn create_profile(
        &self,
        name: &str,
        document: &ResumeDocument,
        template: Template,
    ) -> Result<ProfileId> {
        let _guard = self.write_lock.lock().await;
        let index = self.load_index().await?;
        self.insert(index, name, serde_json::to_value(document)?, template.as_str().to_string())
            .await
    }

    async fn save_profile(
        &self,
        id: ProfileId,
        name: &str,
        document: &ResumeDocument,
        template: Template,
    ) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut index = self.load_index().await?;
        let Some(entry) = index.iter_mut().find(|p| p.id == id) else {
            return Ok(false);
        };

        let record = StoredProfile {
            id,
            name: name.to_string(),
            data: serde_json::to_value(document)?,
            template: template.as_str().to_string(),
            updated_at: self.clock.now()?,
        };
        entry.name = record.name.clone();
        entry.updated_at = record.updated_at;

        self.write_record(&record).await?;
        self.write_index(&index).await?;
        Ok(true)
    }

    async fn delete_profile(&self, id: ProfileId) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut index = self.load_index().await?;
        if index.len() <= 1 {
            return Err(Error::LastProfile);
        }
        let before = index.len();
        index.retain(|p| p.id != id);
        if index.len() == before {
            return Ok(false);
        }

        self.write_index(&index).await?;
        self.store.remove(&profile_key(id)).await?;
        Ok(true)
    }

    async fn duplicate_profile(&self, id: ProfileId, new_name: &str) -> Result<Option<ProfileId>> {
        let _guard = self.write_lock.lock().await;
        let Some(source) = self.load_record(id).await? else {
            return Ok(None);
        };
        let index = self.load_index().await?;
        self.insert(index, new_name, source.data, source.template).await.map(Some)
    }
}
