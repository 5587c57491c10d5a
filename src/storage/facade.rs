//! Storage facade
//!
//! Chooses a backend once, when it is opened, and keeps it for its lifetime.
//! Every read path runs the backfill rules, and every failure comes back as
//! a typed [`Error`](crate::Error) rather than escaping as a panic.

use std::path::PathBuf;
use std::sync::Arc;
use crate::document::ResumeDocument;
use crate::profile::{DEFAULT_PROFILE_NAME, Profile, ProfileId, ProfileName, ProfileSummary, Template};
use crate::{ErrorKind, Result};
use super::kv::{FileStore, KvBackend, MemoryStore};
use super::migrate::{self, Backfill};
use super::sqlite::SqliteBackend;
use super::{BackendKind, BackendPreference, StorageBackend};

/// Where the backends keep their data
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: BackendPreference,
    pub database: PathBuf,
    pub kv_dir: PathBuf,
}

pub struct Storage {
    backend: Arc<dyn StorageBackend>,
    rules: Vec<Backfill>,
}

impl Storage {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            rules: migrate::default_rules(),
        }
    }

    /// Key-value backend over process memory
    pub fn in_memory() -> Self {
        Self::new(Arc::new(KvBackend::new(MemoryStore::new())))
    }

    /// Open the configured backend. With [`BackendPreference::Auto`] SQLite
    /// is tried first and the file-backed key-value store is used when the
    /// database cannot be opened.
    pub async fn open(config: &StorageConfig) -> Result<Self> {
        let backend: Arc<dyn StorageBackend> = match config.backend {
            BackendPreference::Sqlite => Arc::new(SqliteBackend::open(&config.database)?),
            BackendPreference::KeyValue => Self::open_kv(config).await?,
            BackendPreference::Auto => match SqliteBackend::open(&config.database) {
                Ok(sqlite) => Arc::new(sqlite),
                Err(e) => {
                    tracing::warn!(
                        "SQLite unavailable at {} ({}), falling back to key-value store",
                        config.database.display(),
                        e
                    );
                    Self::open_kv(config).await?
                }
            },
        };
        tracing::info!("Using {} storage backend", backend.kind());
        Ok(Self::new(backend))
    }

    async fn open_kv(config: &StorageConfig) -> Result<Arc<dyn StorageBackend>> {
        let store = FileStore::open(&config.kv_dir).await?;
        Ok(Arc::new(KvBackend::new(store)))
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Backfill and type a raw document, as every read path does
    pub fn normalize_document(&self, raw: serde_json::Value) -> Result<ResumeDocument> {
        migrate::normalize(&self.rules, raw)
    }

    // ========== Legacy Document ==========

    pub async fn load_legacy_document(&self) -> Result<Option<ResumeDocument>> {
        let raw = logged("load legacy document", self.backend.load_legacy_document().await)?;
        raw.map(|value| self.normalize_document(value)).transpose()
    }

    pub async fn has_legacy_document(&self) -> Result<bool> {
        let raw = logged("load legacy document", self.backend.load_legacy_document().await)?;
        Ok(raw.is_some())
    }

    pub async fn save_legacy_document(&self, document: &ResumeDocument) -> Result<()> {
        logged("save legacy document", self.backend.save_legacy_document(document).await)
    }

    pub async fn clear_legacy_document(&self) -> Result<()> {
        logged("clear legacy document", self.backend.clear_legacy_document().await)
    }

    // ========== Profiles ==========

    pub async fn list_profiles(&self) -> Result<Vec<ProfileSummary>> {
        logged("list profiles", self.backend.list_profiles().await)
    }

    pub async fn get_profile(&self, id: ProfileId) -> Result<Option<Profile>> {
        let Some(stored) = logged("get profile", self.backend.get_profile(id).await)? else {
            return Ok(None);
        };
        Ok(Some(Profile {
            id: stored.id,
            name: stored.name,
            data: self.normalize_document(stored.data)?,
            template: Template::from_stored(&stored.template),
            updated_at: stored.updated_at,
        }))
    }

    pub async fn create_profile(
        &self,
        name: &str,
        document: &ResumeDocument,
        template: Template,
    ) -> Result<ProfileId> {
        let name = ProfileName::parse(name)?;
        let id = logged(
            "create profile",
            self.backend.create_profile(name.as_str(), document, template).await,
        )?;
        tracing::info!("Created profile {} ({})", id, name);
        Ok(id)
    }

    pub async fn save_profile(
        &self,
        id: ProfileId,
        name: &str,
        document: &ResumeDocument,
        template: Template,
    ) -> Result<bool> {
        let name = ProfileName::parse(name)?;
        logged(
            "save profile",
            self.backend.save_profile(id, name.as_str(), document, template).await,
        )
    }

    pub async fn delete_profile(&self, id: ProfileId) -> Result<bool> {
        let deleted = logged("delete profile", self.backend.delete_profile(id).await)?;
        if deleted {
            tracing::info!("Deleted profile {}", id);
        }
        Ok(deleted)
    }

    pub async fn duplicate_profile(&self, id: ProfileId, new_name: &str) -> Result<Option<ProfileId>> {
        let name = ProfileName::parse(new_name)?;
        let copy = logged(
            "duplicate profile",
            self.backend.duplicate_profile(id, name.as_str()).await,
        )?;
        if let Some(copy) = copy {
            tracing::info!("Duplicated profile {} as {} ({})", id, copy, name);
        }
        Ok(copy)
    }

    /// First-run seeding for a store with no profiles: the legacy document
    /// (if any) or a blank one becomes "Default Profile". Returns the new id,
    /// or `None` when profiles already exist.
    pub async fn ensure_default_profile(&self) -> Result<Option<ProfileId>> {
        if !self.list_profiles().await?.is_empty() {
            return Ok(None);
        }
        let document = self.load_legacy_document().await?.unwrap_or_default();
        self.create_profile(DEFAULT_PROFILE_NAME, &document, Template::Modern)
            .await
            .map(Some)
    }
}

/// Log backend failures where they cross into the facade
fn logged<T>(op: &str, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        if e.kind() == ErrorKind::Backend {
            tracing::error!("Error during {}: {}", op, e);
        }
    }
    result
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("backend", &self.backend.kind())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentPatch, PersonalDetails, SectionVisibility};
    use crate::storage::kv::{KeyValueStore, LEGACY_KEY, PROFILES_KEY, profile_key};
    use crate::storage::StoredProfile;
    use chrono::Utc;

    fn document(summary: &str) -> ResumeDocument {
        DocumentPatch::summary(summary).merged(&ResumeDocument::default())
    }

    const OLD_DOC: &str = r#"{"personalInfo":{"fullName":"Grace","email":"","phone":""},"summary":"old","workExperience":[],"education":[],"skills":[]}"#;

    #[tokio::test]
    async fn test_legacy_load_backfills_missing_fields() {
        let backend = Arc::new(KvBackend::new(MemoryStore::new()));
        backend.store().set(LEGACY_KEY, OLD_DOC).await.unwrap();
        let storage = Storage::new(backend);

        let doc = storage.load_legacy_document().await.unwrap().unwrap();
        assert_eq!(doc.personal_info.full_name, "Grace");
        assert_eq!(doc.personal_details, PersonalDetails::default());
        assert_eq!(doc.section_visibility, SectionVisibility::default());

        // loading again yields the same document
        let again = storage.load_legacy_document().await.unwrap().unwrap();
        assert_eq!(again, doc);
    }

    #[tokio::test]
    async fn test_get_profile_backfills_stored_record() {
        let backend = Arc::new(KvBackend::new(MemoryStore::new()));
        let record = StoredProfile {
            id: 1,
            name: "Imported".into(),
            data: serde_json::from_str(OLD_DOC).unwrap(),
            template: "retro".into(),
            updated_at: Utc::now(),
        };
        let index = vec![ProfileSummary {
            id: record.id,
            name: record.name.clone(),
            updated_at: record.updated_at,
        }];
        backend.store().set(&profile_key(1), &serde_json::to_string(&record).unwrap()).await.unwrap();
        backend.store().set(PROFILES_KEY, &serde_json::to_string(&index).unwrap()).await.unwrap();
        let storage = Storage::new(backend);

        let profile = storage.get_profile(1).await.unwrap().unwrap();
        assert_eq!(profile.data.summary, "old");
        assert!(profile.data.section_visibility.personal_details);
        assert_eq!(profile.template, Template::Modern);
    }

    #[tokio::test]
    async fn test_creating_n_profiles_lists_n_most_recent_first() {
        let storage = Storage::in_memory();
        for i in 0..5 {
            storage
                .create_profile(&format!("Profile {}", i), &document("x"), Template::Modern)
                .await
                .unwrap();
        }

        let profiles = storage.list_profiles().await.unwrap();
        assert_eq!(profiles.len(), 5);
        assert!(profiles.windows(2).all(|w| w[0].updated_at > w[1].updated_at));
        assert_eq!(profiles[0].name, "Profile 4");
    }

    #[tokio::test]
    async fn test_round_trip_save_then_get() {
        let storage = Storage::in_memory();
        let id = storage.create_profile("Main", &document("a"), Template::Modern).await.unwrap();

        let mut doc = document("updated");
        doc.personal_info.full_name = "Jane Doe".into();
        doc.section_visibility.education = false;
        assert!(storage.save_profile(id, "Renamed", &doc, Template::Creative).await.unwrap());

        let profile = storage.get_profile(id).await.unwrap().unwrap();
        assert_eq!(profile.name, "Renamed");
        assert_eq!(profile.template, Template::Creative);
        assert_eq!(profile.data, doc);
    }

    #[tokio::test]
    async fn test_duplicate_is_deep_copy() {
        let storage = Storage::in_memory();
        let src = storage.create_profile("Source", &document("original"), Template::Classic).await.unwrap();

        let copy = storage.duplicate_profile(src, "Copy").await.unwrap().unwrap();
        assert_ne!(copy, src);

        storage.save_profile(src, "Source", &document("changed"), Template::Classic).await.unwrap();
        let duplicate = storage.get_profile(copy).await.unwrap().unwrap();
        assert_eq!(duplicate.name, "Copy");
        assert_eq!(duplicate.data, document("original"));
        assert_eq!(duplicate.template, Template::Classic);
    }

    #[tokio::test]
    async fn test_name_validated_before_storage() {
        let storage = Storage::in_memory();
        let err = storage.create_profile(" ", &document("x"), Template::Modern).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(storage.list_profiles().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_only_profile_fails() {
        let storage = Storage::in_memory();
        let id = storage.create_profile("Only", &document("x"), Template::Modern).await.unwrap();

        let err = storage.delete_profile(id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invariant);
        assert_eq!(err.to_string(), "Cannot delete the last profile");
        assert_eq!(storage.list_profiles().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_ensure_default_profile_migrates_legacy() {
        let backend = Arc::new(KvBackend::new(MemoryStore::new()));
        backend.store().set(LEGACY_KEY, OLD_DOC).await.unwrap();
        let storage = Storage::new(backend);

        let id = storage.ensure_default_profile().await.unwrap().unwrap();
        let profile = storage.get_profile(id).await.unwrap().unwrap();
        assert_eq!(profile.name, DEFAULT_PROFILE_NAME);
        assert_eq!(profile.data.personal_info.full_name, "Grace");
        assert_eq!(profile.template, Template::Modern);

        assert!(storage.ensure_default_profile().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_backends_store_identical_data_json() {
        let mut doc = document("same bytes");
        doc.personal_info.location = Some("Berlin".into());

        let sqlite = Arc::new(SqliteBackend::open_in_memory().unwrap());
        let kv = Arc::new(KvBackend::new(MemoryStore::new()));
        let sqlite_id = Storage::new(sqlite.clone())
            .create_profile("Same", &doc, Template::Modern)
            .await
            .unwrap();
        let kv_id = Storage::new(kv.clone())
            .create_profile("Same", &doc, Template::Modern)
            .await
            .unwrap();

        let sqlite_data = sqlite.raw_profile_data(sqlite_id).unwrap().unwrap();
        let kv_record: StoredProfile =
            serde_json::from_str(&kv.store().get(&profile_key(kv_id)).await.unwrap().unwrap()).unwrap();
        assert_eq!(serde_json::to_string(&kv_record.data).unwrap(), sqlite_data);
    }

    #[tokio::test]
    async fn test_auto_falls_back_to_kv() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            backend: BackendPreference::Auto,
            // a directory cannot be opened as a database file
            database: dir.path().to_path_buf(),
            kv_dir: dir.path().join("kv"),
        };
        let storage = Storage::open(&config).await.unwrap();
        assert_eq!(storage.backend_kind(), BackendKind::KeyValue);

        let config = StorageConfig {
            backend: BackendPreference::Auto,
            database: dir.path().join("resume.db"),
            kv_dir: dir.path().join("kv"),
        };
        let storage = Storage::open(&config).await.unwrap();
        assert_eq!(storage.backend_kind(), BackendKind::Sqlite);
        assert_eq!(storage.list_profiles().await.unwrap().len(), 1);
    }
}
