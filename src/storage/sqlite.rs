//! SQLite storage implementation

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, params};
use crate::document::ResumeDocument;
use crate::profile::{DEFAULT_PROFILE_NAME, ProfileId, ProfileSummary, Template};
use crate::{Error, Result};
use super::clock::{MonotonicClock, format_timestamp, parse_timestamp};
use super::{BackendKind, StorageBackend, StoredProfile, schema};

/// SQLite-backed profile storage
pub struct SqliteBackend {
    conn: Mutex<Connection>,
    clock: MonotonicClock,
}

impl SqliteBackend {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self::from_connection(conn)?;
        tracing::info!("Database initialized at: {}", path.display());
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let store = Self {
            conn: Mutex::new(conn),
            clock: MonotonicClock::new(),
        };
        store.initialize_schema()?;
        store.seed_profiles()?;
        store.observe_latest()?;
        Ok(store)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Backend("database connection lock poisoned".into()))
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<()> {
        let conn = self.lock()?;
        for stmt in schema::all_schema_statements() {
            conn.execute(stmt, [])?;
        }
        Ok(())
    }

    /// First startup: an empty profiles table receives the newest legacy
    /// document as "Default Profile", or a blank document when there is none.
    fn seed_profiles(&self) -> Result<()> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM profiles", [], |row| row.get(0))?;
        if count > 0 {
            return Ok(());
        }

        let legacy: Option<String> = conn
            .query_row(
                "SELECT data FROM resume_data ORDER BY updated_at DESC, id DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;

        let data = match legacy {
            Some(data) => {
                tracing::info!("Migrated existing resume data to {}", DEFAULT_PROFILE_NAME);
                data
            }
            None => {
                tracing::info!("Created default empty profile");
                serde_json::to_string(&ResumeDocument::default())?
            }
        };

        let now = format_timestamp(self.clock.now()?);
        conn.execute(
            "INSERT INTO profiles (name, data, template, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?4)",
            params![DEFAULT_PROFILE_NAME, data, Template::Modern.as_str(), now],
        )?;
        Ok(())
    }

    /// Seed the clock from persisted rows so new stamps sort after them
    fn observe_latest(&self) -> Result<()> {
        let conn = self.lock()?;
        for sql in [
            "SELECT MAX(updated_at) FROM profiles",
            "SELECT MAX(updated_at) FROM resume_data",
        ] {
            let latest: Option<String> = conn.query_row(sql, [], |row| row.get(0))?;
            if let Some(raw) = latest {
                self.clock.observe(parse_timestamp(&raw)?);
            }
        }
        Ok(())
    }

    /// Count all profiles
    pub fn count_profiles(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM profiles", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    #[cfg(test)]
    pub(crate) fn raw_profile_data(&self, id: ProfileId) -> Result<Option<String>> {
        let conn = self.lock()?;
        conn.query_row("SELECT data FROM profiles WHERE id = ?1", [id], |row| row.get(0))
            .optional()
            .map_err(Into::into)
    }

    fn insert_profile(conn: &Connection, name: &str, data: &str, template: &str, now: &str) -> Result<ProfileId> {
        conn.execute(
            "INSERT INTO profiles (name, data, template, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?4)",
            params![name, data, template, now],
        )?;
        Ok(conn.last_insert_rowid())
    }
}

#[async_trait]
impl StorageBackend for SqliteBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Sqlite
    }

    // ========== Legacy Document Operations ==========

    async fn load_legacy_document(&self) -> Result<Option<serde_json::Value>> {
        let conn = self.lock()?;
        let data: Option<String> = conn
            .query_row(
                "SELECT data FROM resume_data ORDER BY updated_at DESC, id DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        data.map(|raw| serde_json::from_str(&raw).map_err(Into::into))
            .transpose()
    }

    async fn save_legacy_document(&self, document: &ResumeDocument) -> Result<()> {
        let data = serde_json::to_string(document)?;
        let now = format_timestamp(self.clock.now()?);
        let conn = self.lock()?;
        let existing: Option<i64> = conn
            .query_row("SELECT id FROM resume_data LIMIT 1", [], |row| row.get(0))
            .optional()?;

        match existing {
            Some(id) => {
                conn.execute(
                    "UPDATE resume_data SET data = ?1, updated_at = ?2 WHERE id = ?3",
                    params![data, now, id],
                )?;
            }
            None => {
                conn.execute(
                    "INSERT INTO resume_data (data, updated_at) VALUES (?1, ?2)",
                    params![data, now],
                )?;
            }
        }
        Ok(())
    }

    async fn clear_legacy_document(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM resume_data", [])?;
        Ok(())
    }

    // ========== Profile Operations ==========

    async fn list_profiles(&self) -> Result<Vec<ProfileSummary>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, updated_at FROM profiles ORDER BY updated_at DESC, id ASC",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(id, name, updated_at)| {
                Ok(ProfileSummary {
                    id,
                    name,
                    updated_at: parse_timestamp(&updated_at)?,
                })
            })
            .collect()
    }

    async fn get_profile(&self, id: ProfileId) -> Result<Option<StoredProfile>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT id, name, data, template, updated_at FROM profiles WHERE id = ?1",
                [id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, name, data, template, updated_at)) = row else {
            return Ok(None);
        };

        Ok(Some(StoredProfile {
            id,
            name,
            data: serde_json::from_str(&data)?,
            template: template.unwrap_or_else(|| Template::default().as_str().to_string()),
            updated_at: parse_timestamp(&updated_at)?,
        }))
    }

    async fn create_profile(
        &self,
        name: &str,
        document: &ResumeDocument,
        template: Template,
    ) -> Result<ProfileId> {
        let data = serde_json::to_string(document)?;
        let now = format_timestamp(self.clock.now()?);
        let conn = self.lock()?;
        Self::insert_profile(&conn, name, &data, template.as_str(), &now)
    }

    async fn save_profile(
        &self,
        id: ProfileId,
        name: &str,
        document: &ResumeDocument,
        template: Template,
    ) -> Result<bool> {
        let data = serde_json::to_string(document)?;
        let now = format_timestamp(self.clock.now()?);
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE profiles SET name = ?1, data = ?2, template = ?3, updated_at = ?4 WHERE id = ?5",
            params![name, data, template.as_str(), now, id],
        )?;
        Ok(changed > 0)
    }

    async fn delete_profile(&self, id: ProfileId) -> Result<bool> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let count: i64 = tx.query_row("SELECT COUNT(*) FROM profiles", [], |row| row.get(0))?;
        if count <= 1 {
            return Err(Error::LastProfile);
        }
        let deleted = tx.execute("DELETE FROM profiles WHERE id = ?1", [id])?;
        tx.commit()?;
        Ok(deleted > 0)
    }

    async fn duplicate_profile(&self, id: ProfileId, new_name: &str) -> Result<Option<ProfileId>> {
        let now = format_timestamp(self.clock.now()?);
        let conn = self.lock()?;
        let source: Option<(String, Option<String>)> = conn
            .query_row(
                "SELECT data, template FROM profiles WHERE id = ?1",
                [id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((data, template)) = source else {
            return Ok(None);
        };
        let template = template.unwrap_or_else(|| Template::default().as_str().to_string());
        Self::insert_profile(&conn, new_name, &data, &template, &now).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentPatch;

    fn document(summary: &str) -> ResumeDocument {
        DocumentPatch::summary(summary).merged(&ResumeDocument::default())
    }

    #[tokio::test]
    async fn test_first_open_seeds_default_profile() {
        let store = SqliteBackend::open_in_memory().unwrap();

        let profiles = store.list_profiles().await.unwrap();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].name, DEFAULT_PROFILE_NAME);

        let profile = store.get_profile(profiles[0].id).await.unwrap().unwrap();
        assert_eq!(profile.template, "modern");
        assert_eq!(profile.data["personalInfo"]["fullName"], "");
        assert_eq!(profile.data["sectionVisibility"]["summary"], true);
    }

    #[tokio::test]
    async fn test_seed_migrates_legacy_row() {
        let conn = Connection::open_in_memory().unwrap();
        for stmt in schema::all_schema_statements() {
            conn.execute(stmt, []).unwrap();
        }
        conn.execute(
            "INSERT INTO resume_data (data) VALUES (?1)",
            [r#"{"personalInfo":{"fullName":"Old Timer","email":"","phone":""},"summary":"","workExperience":[],"education":[],"skills":[]}"#],
        )
        .unwrap();

        let store = SqliteBackend::from_connection(conn).unwrap();
        let profiles = store.list_profiles().await.unwrap();
        assert_eq!(profiles.len(), 1);

        let profile = store.get_profile(profiles[0].id).await.unwrap().unwrap();
        assert_eq!(profile.name, DEFAULT_PROFILE_NAME);
        assert_eq!(profile.data["personalInfo"]["fullName"], "Old Timer");
        assert!(profile.data.get("personalDetails").is_none());
    }

    #[tokio::test]
    async fn test_list_orders_by_most_recent() {
        let store = SqliteBackend::open_in_memory().unwrap();
        let a = store.create_profile("Alpha", &document("a"), Template::Classic).await.unwrap();
        let b = store.create_profile("Beta", &document("b"), Template::Minimal).await.unwrap();

        let names: Vec<_> = store.list_profiles().await.unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Beta", "Alpha", DEFAULT_PROFILE_NAME]);

        assert!(store.save_profile(a, "Alpha", &document("a2"), Template::Classic).await.unwrap());
        let ids: Vec<_> = store.list_profiles().await.unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids[0], a);
        assert_eq!(ids[1], b);
    }

    #[tokio::test]
    async fn test_save_unknown_profile_is_noop() {
        let store = SqliteBackend::open_in_memory().unwrap();
        let saved = store.save_profile(999, "Ghost", &document("x"), Template::Modern).await.unwrap();
        assert!(!saved);
        assert_eq!(store.count_profiles().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_last_profile_rejected() {
        let store = SqliteBackend::open_in_memory().unwrap();
        let only = store.list_profiles().await.unwrap()[0].id;

        let err = store.delete_profile(only).await.unwrap_err();
        assert!(matches!(err, Error::LastProfile));
        assert_eq!(store.count_profiles().unwrap(), 1);

        let second = store.create_profile("Second", &document("s"), Template::Modern).await.unwrap();
        assert!(store.delete_profile(second).await.unwrap());
        assert_eq!(store.count_profiles().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_copies_data_and_template() {
        let store = SqliteBackend::open_in_memory().unwrap();
        let src = store.create_profile("Source", &document("original"), Template::Creative).await.unwrap();

        let copy = store.duplicate_profile(src, "Copy").await.unwrap().unwrap();
        assert_ne!(copy, src);

        let original = store.get_profile(src).await.unwrap().unwrap();
        let duplicate = store.get_profile(copy).await.unwrap().unwrap();
        assert_eq!(duplicate.name, "Copy");
        assert_eq!(duplicate.template, "creative");
        assert_eq!(duplicate.data, original.data);

        assert!(store.duplicate_profile(12345, "Nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_legacy_document_upsert_and_clear() {
        let store = SqliteBackend::open_in_memory().unwrap();
        assert!(store.load_legacy_document().await.unwrap().is_none());

        store.save_legacy_document(&document("first")).await.unwrap();
        store.save_legacy_document(&document("second")).await.unwrap();
        let legacy = store.load_legacy_document().await.unwrap().unwrap();
        assert_eq!(legacy["summary"], "second");

        store.clear_legacy_document().await.unwrap();
        assert!(store.load_legacy_document().await.unwrap().is_none());
        assert_eq!(store.count_profiles().unwrap(), 1);
    }
}
