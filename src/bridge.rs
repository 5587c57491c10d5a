//! Boundary contract for UI and export collaborators
//!
//! Every call returns an [`ApiResponse`]: `success` plus either `data` or an
//! `error` message and its [`ErrorKind`]. Nothing raised below this layer
//! escapes it.
//!
//! Incoming documents are backfilled the same way stored ones are, so
//! clients written before a field existed keep working.

use std::sync::Arc;
use serde::{Deserialize, Serialize};
use crate::document::ResumeDocument;
use crate::profile::{Profile, ProfileId, ProfileSummary, Template};
use crate::storage::Storage;
use crate::{Error, ErrorKind, Result};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorKind>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            code: None,
        }
    }

    pub fn fail(error: &Error) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
            code: Some(error.kind()),
        }
    }
}

impl ApiResponse<()> {
    /// Success with no payload
    pub fn done() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
            code: None,
        }
    }
}

impl<T> From<Result<T>> for ApiResponse<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::fail(&e),
        }
    }
}

fn completed(result: Result<()>) -> ApiResponse<()> {
    match result {
        Ok(()) => ApiResponse::done(),
        Err(e) => ApiResponse::fail(&e),
    }
}

/// Body of create and save calls
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRequest {
    pub name: String,
    pub data: serde_json::Value,
    #[serde(default)]
    pub template: Option<String>,
}

impl ProfileRequest {
    fn template(&self) -> Result<Template> {
        match self.template.as_deref() {
            Some(raw) => raw.parse(),
            None => Ok(Template::default()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateRequest {
    pub new_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileCreated {
    pub profile_id: ProfileId,
}

#[derive(Debug, Clone)]
pub struct Bridge {
    storage: Arc<Storage>,
}

impl Bridge {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Arc<Storage> {
        &self.storage
    }

    // ========== Legacy Document ==========

    pub async fn save_resume(&self, data: serde_json::Value) -> ApiResponse<()> {
        completed(self.try_save_resume(data).await)
    }

    async fn try_save_resume(&self, data: serde_json::Value) -> Result<()> {
        let document = self.storage.normalize_document(data)?;
        self.storage.save_legacy_document(&document).await
    }

    /// `data` is `null` when no legacy document exists
    pub async fn load_resume(&self) -> ApiResponse<Option<ResumeDocument>> {
        self.storage.load_legacy_document().await.into()
    }

    pub async fn clear_resume(&self) -> ApiResponse<()> {
        completed(self.storage.clear_legacy_document().await)
    }

    // ========== Profiles ==========

    pub async fn get_all_profiles(&self) -> ApiResponse<Vec<ProfileSummary>> {
        self.storage.list_profiles().await.into()
    }

    pub async fn get_profile(&self, id: ProfileId) -> ApiResponse<Profile> {
        let result = self.storage.get_profile(id).await;
        result.and_then(|p| p.ok_or(Error::ProfileNotFound(id))).into()
    }

    pub async fn save_profile(&self, id: ProfileId, request: ProfileRequest) -> ApiResponse<()> {
        completed(self.try_save_profile(id, request).await)
    }

    async fn try_save_profile(&self, id: ProfileId, request: ProfileRequest) -> Result<()> {
        let template = request.template()?;
        let document = self.storage.normalize_document(request.data)?;
        if self.storage.save_profile(id, &request.name, &document, template).await? {
            Ok(())
        } else {
            Err(Error::ProfileNotFound(id))
        }
    }

    pub async fn create_profile(&self, request: ProfileRequest) -> ApiResponse<ProfileCreated> {
        self.try_create_profile(request).await.into()
    }

    async fn try_create_profile(&self, request: ProfileRequest) -> Result<ProfileCreated> {
        let template = request.template()?;
        let document = self.storage.normalize_document(request.data)?;
        let profile_id = self.storage.create_profile(&request.name, &document, template).await?;
        Ok(ProfileCreated { profile_id })
    }

    pub async fn delete_profile(&self, id: ProfileId) -> ApiResponse<()> {
        completed(match self.storage.delete_profile(id).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(Error::ProfileNotFound(id)),
            Err(e) => Err(e),
        })
    }

    pub async fn duplicate_profile(&self, id: ProfileId, request: DuplicateRequest) -> ApiResponse<ProfileCreated> {
        let result = self.storage.duplicate_profile(id, &request.new_name).await;
        result
            .and_then(|copy| copy.ok_or(Error::ProfileNotFound(id)))
            .map(|profile_id| ProfileCreated { profile_id })
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bridge() -> Bridge {
        Bridge::new(Arc::new(Storage::in_memory()))
    }

    fn request(name: &str, data: serde_json::Value) -> ProfileRequest {
        ProfileRequest { name: name.into(), data, template: None }
    }

    fn old_data(summary: &str) -> serde_json::Value {
        json!({
            "personalInfo": { "fullName": "Jane", "email": "", "phone": "" },
            "summary": summary,
            "workExperience": [], "education": [], "skills": []
        })
    }

    #[tokio::test]
    async fn test_legacy_document_contract() {
        let bridge = bridge();

        let empty = bridge.load_resume().await;
        assert!(empty.success);
        assert_eq!(empty.data, Some(None));
        assert_eq!(serde_json::to_value(&empty).unwrap(), json!({ "success": true, "data": null }));

        assert!(bridge.save_resume(old_data("legacy")).await.success);
        let loaded = bridge.load_resume().await.data.unwrap().unwrap();
        assert_eq!(loaded.summary, "legacy");
        assert!(loaded.section_visibility.personal_details);

        assert!(bridge.clear_resume().await.success);
        assert_eq!(bridge.load_resume().await.data, Some(None));
    }

    #[tokio::test]
    async fn test_profile_contract() {
        let bridge = bridge();

        let created = bridge.create_profile(request("Main", old_data("a"))).await;
        let id = created.data.unwrap().profile_id;

        let mut save = request("Main v2", old_data("b"));
        save.template = Some("minimal".into());
        assert!(bridge.save_profile(id, save).await.success);

        let profile = bridge.get_profile(id).await.data.unwrap();
        assert_eq!(profile.name, "Main v2");
        assert_eq!(profile.template, Template::Minimal);
        assert_eq!(profile.data.summary, "b");

        let copy = bridge
            .duplicate_profile(id, DuplicateRequest { new_name: "Copy".into() })
            .await
            .data
            .unwrap()
            .profile_id;
        assert_ne!(copy, id);
        assert_eq!(bridge.get_all_profiles().await.data.unwrap().len(), 2);

        assert!(bridge.delete_profile(copy).await.success);
        let last = bridge.delete_profile(id).await;
        assert!(!last.success);
        assert_eq!(last.error.as_deref(), Some("Cannot delete the last profile"));
        assert_eq!(last.code, Some(ErrorKind::Invariant));
    }

    #[tokio::test]
    async fn test_failures_are_typed() {
        let bridge = bridge();

        let missing = bridge.get_profile(42).await;
        assert!(!missing.success);
        assert_eq!(missing.error.as_deref(), Some("Profile not found"));
        assert_eq!(missing.code, Some(ErrorKind::NotFound));

        let unknown = bridge.save_profile(42, request("Ghost", old_data("x"))).await;
        assert_eq!(unknown.code, Some(ErrorKind::NotFound));

        let short = bridge.create_profile(request("x", old_data("x"))).await;
        assert_eq!(short.error.as_deref(), Some("Profile name must be at least 2 characters"));
        assert_eq!(short.code, Some(ErrorKind::Validation));

        let mut bad_template = request("Main", old_data("x"));
        bad_template.template = Some("baroque".into());
        assert_eq!(bridge.create_profile(bad_template).await.code, Some(ErrorKind::Validation));

        let not_object = bridge.save_resume(json!("text")).await;
        assert!(!not_object.success);
        assert!(bridge.get_all_profiles().await.data.unwrap().is_empty());
    }
}
