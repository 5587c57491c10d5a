//! Profile session controller
//!
//! Owns the profile being edited: its id, name, document and template, the
//! cached profile list and the debounced autosave. Edits only touch memory
//! and arm the autosave; lifecycle operations talk to storage directly and
//! leave the session untouched when storage fails.
//!
//! Before a lifecycle operation switches profiles, any pending autosave is
//! written under the profile it was captured for, so a late timer can never
//! land one profile's document on another profile's id. Every lifecycle
//! write also waits out an autosave that is already writing, so an older
//! snapshot never lands on top of it.

use std::sync::Arc;
use std::time::Duration;
use crate::autosave::{Autosave, DEFAULT_DELAY, SaveRequest};
use crate::document::{DocumentPatch, ResumeDocument, Section};
use crate::profile::{Profile, ProfileId, ProfileName, ProfileSummary, Template};
use crate::storage::Storage;
use crate::{Error, Result};

/// The active profile. Replaced as a whole on every switch.
#[derive(Debug, Clone, Default, PartialEq)]
struct Current {
    id: Option<ProfileId>,
    name: String,
    document: ResumeDocument,
    template: Template,
}

impl From<Profile> for Current {
    fn from(profile: Profile) -> Self {
        Self {
            id: Some(profile.id),
            name: profile.name,
            document: profile.data,
            template: profile.template,
        }
    }
}

pub struct Session {
    storage: Arc<Storage>,
    current: Current,
    profiles: Vec<ProfileSummary>,
    loading: bool,
    autosave: Autosave,
}

impl Session {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self::with_autosave_delay(storage, DEFAULT_DELAY)
    }

    pub fn with_autosave_delay(storage: Arc<Storage>, delay: Duration) -> Self {
        Self {
            autosave: Autosave::new(storage.clone(), delay),
            storage,
            current: Current::default(),
            profiles: Vec::new(),
            loading: false,
        }
    }

    /// Seed a first profile if the store has none, then initialize.
    pub async fn start(storage: Arc<Storage>, delay: Duration) -> Result<Self> {
        if let Some(id) = storage.ensure_default_profile().await? {
            tracing::info!("First run: created default profile {}", id);
        }
        let mut session = Self::with_autosave_delay(storage, delay);
        session.initialize().await?;
        Ok(session)
    }

    /// Load the most recently updated profile. With no profiles the session
    /// stays uninitialized and nothing is created.
    pub async fn initialize(&mut self) -> Result<()> {
        self.loading = true;
        let result = self.load_most_recent().await;
        self.loading = false;
        result
    }

    async fn load_most_recent(&mut self) -> Result<()> {
        let profiles = self.storage.list_profiles().await?;
        let Some(first) = profiles.first() else {
            tracing::debug!("no profiles yet, session left uninitialized");
            self.profiles = profiles;
            return Ok(());
        };
        let id = first.id;
        let profile = self
            .storage
            .get_profile(id)
            .await?
            .ok_or(Error::ProfileNotFound(id))?;
        self.current = profile.into();
        self.profiles = profiles;
        Ok(())
    }

    // ========== State ==========

    pub fn current_profile_id(&self) -> Option<ProfileId> {
        self.current.id
    }

    pub fn current_profile_name(&self) -> &str {
        &self.current.name
    }

    pub fn document(&self) -> &ResumeDocument {
        &self.current.document
    }

    pub fn template(&self) -> Template {
        self.current.template
    }

    /// Cached profile list, most recently updated first
    pub fn profiles(&self) -> &[ProfileSummary] {
        &self.profiles
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn has_pending_save(&self) -> bool {
        self.autosave.is_pending()
    }

    pub fn storage(&self) -> &Arc<Storage> {
        &self.storage
    }

    // ========== Edits ==========
    //
    // Edits arm the autosave, which spawns onto the Tokio runtime: call them
    // from within one.

    /// Shallow-merge `patch` into the current document.
    pub fn update_document(&mut self, patch: DocumentPatch) -> Result<()> {
        let next = patch.merged(&self.current.document);
        next.validate_ids()?;
        self.current.document = next;
        self.schedule_autosave();
        Ok(())
    }

    /// Flip one section's visibility and return the new value
    pub fn toggle_section_visibility(&mut self, section: Section) -> bool {
        let visible = self.current.document.section_visibility.toggle(section);
        self.schedule_autosave();
        visible
    }

    pub fn set_template(&mut self, template: Template) {
        if self.current.template == template {
            return;
        }
        self.current.template = template;
        self.schedule_autosave();
    }

    fn schedule_autosave(&mut self) {
        if self.loading {
            return;
        }
        let Some(profile_id) = self.current.id else {
            return;
        };
        self.autosave.schedule(SaveRequest {
            profile_id,
            name: self.current.name.clone(),
            document: self.current.document.clone(),
            template: self.current.template,
        });
    }

    /// Write a pending autosave now. Returns whether anything was written.
    pub async fn flush(&mut self) -> Result<bool> {
        self.autosave.flush().await
    }

    // ========== Lifecycle ==========

    /// Create a profile holding a blank document and switch to it.
    pub async fn create_new_profile(&mut self, name: &str) -> Result<ProfileId> {
        let name = ProfileName::parse(name)?;
        self.autosave.flush().await?;

        let document = ResumeDocument::default();
        let id = self
            .storage
            .create_profile(name.as_str(), &document, Template::Modern)
            .await?;

        self.current = Current {
            id: Some(id),
            name: name.into_inner(),
            document,
            template: Template::Modern,
        };
        self.refresh_profiles().await;
        Ok(id)
    }

    /// Copy the active profile under `name` and switch to the copy.
    pub async fn duplicate_current_profile(&mut self, name: &str) -> Result<ProfileId> {
        let id = self.current.id.ok_or(Error::NoActiveProfile)?;
        let name = ProfileName::parse(name)?;
        self.autosave.flush().await?;

        let copy = self
            .storage
            .duplicate_profile(id, name.as_str())
            .await?
            .ok_or(Error::ProfileNotFound(id))?;
        self.activate(copy).await?;
        self.refresh_profiles().await;
        Ok(copy)
    }

    /// Rename the active profile, persisting immediately.
    pub async fn rename_current_profile(&mut self, name: &str) -> Result<()> {
        let name = ProfileName::parse(name)?;
        self.save_as(name.as_str()).await?;
        self.current.name = name.into_inner();
        self.refresh_profiles().await;
        Ok(())
    }

    /// Persist the active profile now, bypassing the debounce.
    pub async fn save_now(&mut self) -> Result<()> {
        let name = self.current.name.clone();
        self.save_as(&name).await?;
        self.refresh_profiles().await;
        Ok(())
    }

    /// Write the in-memory document under `name`. The in-memory document
    /// already includes any pending edit, so the pending save is folded in;
    /// it is re-armed if the write fails.
    async fn save_as(&mut self, name: &str) -> Result<()> {
        let id = self.current.id.ok_or(Error::NoActiveProfile)?;
        let pending = self.autosave.cancel().await;
        let result = self
            .storage
            .save_profile(id, name, &self.current.document, self.current.template)
            .await;
        match result {
            Ok(true) => Ok(()),
            Ok(false) => {
                self.restore(pending);
                Err(Error::ProfileNotFound(id))
            }
            Err(e) => {
                self.restore(pending);
                Err(e)
            }
        }
    }

    fn restore(&mut self, pending: Option<SaveRequest>) {
        if let Some(request) = pending {
            self.autosave.schedule(request);
        }
    }

    /// Delete the active profile and switch to the most recently updated
    /// remaining one. Refused by storage when it is the only profile.
    pub async fn delete_current_profile(&mut self) -> Result<()> {
        let id = self.current.id.ok_or(Error::NoActiveProfile)?;

        if !self.storage.delete_profile(id).await? {
            self.refresh_profiles().await;
            return Err(Error::ProfileNotFound(id));
        }
        // edits to a deleted profile have nowhere to go
        self.autosave.cancel().await;

        self.refresh_profiles().await;
        let remaining: Vec<ProfileId> = self
            .profiles
            .iter()
            .map(|p| p.id)
            .filter(|&p| p != id)
            .collect();

        let mut last_err = None;
        for next in remaining {
            match self.activate(next).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::warn!("Could not open profile {} after delete: {}", next, e);
                    last_err = Some(e);
                }
            }
        }
        self.current = Current::default();
        last_err.map_or(Ok(()), Err)
    }

    /// Switch to profile `id`. A no-op when it is already active.
    pub async fn load_profile(&mut self, id: ProfileId) -> Result<()> {
        if self.current.id == Some(id) {
            return Ok(());
        }
        self.autosave.flush().await?;
        self.activate(id).await?;
        self.refresh_profiles().await;
        Ok(())
    }

    async fn activate(&mut self, id: ProfileId) -> Result<()> {
        self.loading = true;
        let result = self.storage.get_profile(id).await;
        self.loading = false;

        let profile = result?.ok_or(Error::ProfileNotFound(id))?;
        tracing::debug!("switched to profile {} ({})", profile.id, profile.name);
        self.current = profile.into();
        Ok(())
    }

    /// Reset the document to blank and drop the legacy record. The active
    /// profile is saved blank right away so memory and storage agree;
    /// profiles themselves are never deleted.
    pub async fn clear_all_data(&mut self) -> Result<()> {
        self.storage.clear_legacy_document().await?;

        let cleared = ResumeDocument::default();
        let pending = self.autosave.cancel().await;
        if let Some(id) = self.current.id {
            let result = self
                .storage
                .save_profile(id, &self.current.name, &cleared, self.current.template)
                .await;
            if let Err(e) = result {
                self.restore(pending);
                return Err(e);
            }
        }

        self.current.document = cleared;
        self.refresh_profiles().await;
        tracing::info!("Cleared resume data");
        Ok(())
    }

    /// Reload the cached profile list. Failures keep the previous list.
    pub async fn refresh_profiles(&mut self) {
        match self.storage.list_profiles().await {
            Ok(profiles) => self.profiles = profiles,
            Err(e) => tracing::warn!("Failed to refresh profile list: {}", e),
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("current_profile_id", &self.current.id)
            .field("current_profile_name", &self.current.name)
            .field("template", &self.current.template)
            .field("profiles", &self.profiles.len())
            .finish()
    }
}
