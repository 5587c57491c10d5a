//! # Resumekit - profile-backed resume storage
//!
//! Keeps named resume profiles consistent between an in-memory edit buffer,
//! a debounced persistent store and the export pipeline.
//!
//! Resumekit provides:
//! - A typed resume document model with backward-compatible loading
//! - Two interchangeable storage backends (SQLite, key-value) behind one facade
//! - A session controller with debounced autosave and profile lifecycle operations
//! - An export interface that renders documents honoring section visibility

pub mod document;
pub mod profile;
pub mod storage;
pub mod autosave;
pub mod session;
pub mod export;
pub mod bridge;
pub mod server;
pub mod output;
pub mod config;
pub mod ui;


// Re-exports for convenient access
pub use document::{DocumentPatch, ResumeDocument, Section};
pub use profile::{Profile, ProfileId, ProfileName, ProfileSummary, Template};
pub use storage::{BackendKind, Storage};
pub use session::Session;

/// Result type alias for Resumekit operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Resumekit operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Profile not found")]
    ProfileNotFound(ProfileId),

    #[error("Cannot delete the last profile")]
    LastProfile,

    #[error("{0}")]
    InvalidProfileName(String),

    #[error("Unknown template: {0}")]
    InvalidTemplate(String),

    #[error("Unknown section: {0}")]
    InvalidSection(String),

    #[error("Duplicate id '{id}' in {list}")]
    DuplicateEntryId { list: String, id: String },

    #[error("No profile is active")]
    NoActiveProfile,

    #[error("No renderer registered for {0}")]
    UnsupportedFormat(String),
}

/// Coarse classification of an [`Error`], used by the boundary layer so
/// callers can tell "doesn't exist" apart from "storage broken".
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Backend,
    NotFound,
    Invariant,
    Validation,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Storage(_) | Error::Io(_) | Error::Serialization(_) | Error::Backend(_) => {
                ErrorKind::Backend
            }
            Error::ProfileNotFound(_) => ErrorKind::NotFound,
            Error::LastProfile | Error::NoActiveProfile => ErrorKind::Invariant,
            Error::InvalidProfileName(_)
            | Error::InvalidTemplate(_)
            | Error::InvalidSection(_)
            | Error::DuplicateEntryId { .. }
            | Error::UnsupportedFormat(_) => ErrorKind::Validation,
        }
    }
}
