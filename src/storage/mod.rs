//! Storage Layer - profile persistence behind one async contract
//!
//! Two interchangeable backends:
//! - SQLite with tables resume_data(id, data, updated_at) and
//!   profiles(id, name, data, template, created_at, updated_at)
//! - a key-value store holding the legacy document, a profile metadata list
//!   and one serialized record per profile
//!
//! Backends hand documents back as raw JSON; the [`Storage`] facade runs the
//! backfill rules in [`migrate`] on every read before typing them.

pub mod clock;
pub mod facade;
pub mod kv;
pub mod migrate;
pub mod schema;
pub mod sqlite;

use crate::document::ResumeDocument;
use crate::profile::{ProfileId, ProfileSummary, Template};
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub use facade::{Storage, StorageConfig};
pub use kv::{FileStore, KeyValueStore, KvBackend, MemoryStore};
pub use sqlite::SqliteBackend;

/// Which backend is serving a [`Storage`] facade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Sqlite,
    #[serde(rename = "kv")]
    KeyValue,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Sqlite => "sqlite",
            BackendKind::KeyValue => "kv",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Backend choice from configuration. `Auto` prefers SQLite and falls back
/// to the key-value store when the database cannot be opened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendPreference {
    #[default]
    Auto,
    Sqlite,
    #[serde(rename = "kv")]
    KeyValue,
}

impl FromStr for BackendPreference {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(BackendPreference::Auto),
            "sqlite" | "sql" | "db" => Ok(BackendPreference::Sqlite),
            "kv" | "keyvalue" | "key-value" => Ok(BackendPreference::KeyValue),
            _ => Err(crate::Error::Backend(format!("Unknown backend: {}", s))),
        }
    }
}

/// A profile as a backend stores it: document still untyped, template
/// still a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredProfile {
    pub id: ProfileId,
    pub name: String,
    pub data: serde_json::Value,
    pub template: String,
    pub updated_at: DateTime<Utc>,
}

/// Durable CRUD for profiles and the legacy single document.
///
/// Implementations never retry; every failure is returned to the caller.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Most recently updated pre-profile document, if any
    async fn load_legacy_document(&self) -> Result<Option<serde_json::Value>>;

    /// Upsert the single legacy document
    async fn save_legacy_document(&self, document: &ResumeDocument) -> Result<()>;

    async fn clear_legacy_document(&self) -> Result<()>;

    /// Profiles ordered by `updated_at` descending, ties in insertion order
    async fn list_profiles(&self) -> Result<Vec<ProfileSummary>>;

    async fn get_profile(&self, id: ProfileId) -> Result<Option<StoredProfile>>;

    async fn create_profile(
        &self,
        name: &str,
        document: &ResumeDocument,
        template: Template,
    ) -> Result<ProfileId>;

    /// Overwrite name, document and template and bump `updated_at`.
    /// Returns `false` when no profile has this id.
    async fn save_profile(
        &self,
        id: ProfileId,
        name: &str,
        document: &ResumeDocument,
        template: Template,
    ) -> Result<bool>;

    /// Returns `false` when no profile has this id and
    /// [`Error::LastProfile`](crate::Error::LastProfile) when it would leave
    /// the store empty.
    async fn delete_profile(&self, id: ProfileId) -> Result<bool>;

    /// Copy a profile's document and template under a new name
    async fn duplicate_profile(&self, id: ProfileId, new_name: &str) -> Result<Option<ProfileId>>;
}
