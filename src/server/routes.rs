use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use crate::bridge::{ApiResponse, DuplicateRequest, ProfileCreated, ProfileRequest};
use crate::document::ResumeDocument;
use crate::export::{ExportArtifact, ExportFormat};
use crate::profile::{Profile, ProfileId, ProfileSummary};
use crate::server::AppState;
use crate::{Error, ErrorKind};
use std::sync::Arc;

type Reply<T> = (StatusCode, Json<ApiResponse<T>>);

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Invariant => StatusCode::CONFLICT,
        ErrorKind::Backend => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reply<T: Serialize>(response: ApiResponse<T>) -> Reply<T> {
    let status = response.code.map(status_for).unwrap_or(StatusCode::OK);
    (status, Json(response))
}

#[derive(Deserialize)]
pub struct ExportParams {
    pub format: Option<String>,
}

pub async fn load_resume(State(state): State<Arc<AppState>>) -> Reply<Option<ResumeDocument>> {
    reply(state.bridge.load_resume().await)
}

pub async fn save_resume(
    State(state): State<Arc<AppState>>,
    Json(data): Json<serde_json::Value>,
) -> Reply<()> {
    reply(state.bridge.save_resume(data).await)
}

pub async fn clear_resume(State(state): State<Arc<AppState>>) -> Reply<()> {
    reply(state.bridge.clear_resume().await)
}

pub async fn list_profiles(State(state): State<Arc<AppState>>) -> Reply<Vec<ProfileSummary>> {
    reply(state.bridge.get_all_profiles().await)
}

pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ProfileId>,
) -> Reply<Profile> {
    reply(state.bridge.get_profile(id).await)
}

pub async fn create_profile(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ProfileRequest>,
) -> Reply<ProfileCreated> {
    let (status, body) = reply(state.bridge.create_profile(request).await);
    if status == StatusCode::OK {
        return (StatusCode::CREATED, body);
    }
    (status, body)
}

pub async fn save_profile(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ProfileId>,
    Json(request): Json<ProfileRequest>,
) -> Reply<()> {
    reply(state.bridge.save_profile(id, request).await)
}

pub async fn delete_profile(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ProfileId>,
) -> Reply<()> {
    reply(state.bridge.delete_profile(id).await)
}

pub async fn duplicate_profile(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ProfileId>,
    Json(request): Json<DuplicateRequest>,
) -> Reply<ProfileCreated> {
    let (status, body) = reply(state.bridge.duplicate_profile(id, request).await);
    if status == StatusCode::OK {
        return (StatusCode::CREATED, body);
    }
    (status, body)
}

/// Render a profile. `format` defaults to plain text.
pub async fn export_profile(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ProfileId>,
    Query(params): Query<ExportParams>,
) -> Response {
    match render(&state, id, params.format.as_deref()).await {
        Ok(artifact) => (
            [
                (header::CONTENT_TYPE, artifact.mime.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", artifact.filename),
                ),
            ],
            Bytes::from(artifact.bytes),
        )
            .into_response(),
        Err(e) => reply(ApiResponse::<()>::fail(&e)).into_response(),
    }
}

async fn render(state: &AppState, id: ProfileId, format: Option<&str>) -> crate::Result<ExportArtifact> {
    let format = match format {
        Some(raw) => raw.parse()?,
        None => ExportFormat::Text,
    };
    let profile = state
        .bridge
        .storage()
        .get_profile(id)
        .await?
        .ok_or(Error::ProfileNotFound(id))?;
    state.exporter.export(&profile.data, profile.template, format)
}

#[cfg(test)]
mod tests {
    use crate::server::{router, AppState};
    use crate::storage::Storage;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> Router {
        router(Arc::new(AppState::new(Arc::new(Storage::in_memory()))))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn profile_body(name: &str) -> Value {
        json!({
            "name": name,
            "data": {
                "personalInfo": { "fullName": "Jane Doe", "email": "jane@example.com", "phone": "" },
                "summary": "Engineer",
                "workExperience": [], "education": [], "skills": []
            },
            "template": "classic"
        })
    }

    #[tokio::test]
    async fn test_profile_crud_over_http() {
        let app = app();

        let (status, body) = send(&app, "POST", "/profiles", Some(profile_body("Main"))).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["data"]["profileId"].as_i64().unwrap();

        let (status, body) = send(&app, "GET", &format!("/profiles/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["template"], "classic");
        assert_eq!(body["data"]["data"]["sectionVisibility"]["summary"], true);

        let (status, _) = send(&app, "POST", &format!("/profiles/{}/duplicate", id), Some(json!({ "newName": "Copy" }))).await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, body) = send(&app, "GET", "/profiles", None).await;
        assert_eq!(body["data"][0]["name"], "Copy");
        assert_eq!(body["data"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let app = app();

        let (status, body) = send(&app, "GET", "/profiles/7", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "success": false, "error": "Profile not found", "code": "not_found" }));

        let (status, _) = send(&app, "POST", "/profiles", Some(profile_body("x"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = send(&app, "POST", "/profiles", Some(profile_body("Only"))).await;
        let id = body["data"]["profileId"].as_i64().unwrap();
        let (status, body) = send(&app, "DELETE", &format!("/profiles/{}", id), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "Cannot delete the last profile");
    }

    #[tokio::test]
    async fn test_legacy_resume_routes() {
        let app = app();

        let (status, body) = send(&app, "GET", "/resume", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true, "data": null }));

        let doc = profile_body("unused")["data"].clone();
        let (status, _) = send(&app, "PUT", "/resume", Some(doc)).await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(&app, "GET", "/resume", None).await;
        assert_eq!(body["data"]["personalInfo"]["fullName"], "Jane Doe");
        assert_eq!(body["data"]["personalDetails"]["nationality"], "");

        send(&app, "DELETE", "/resume", None).await;
        let (_, body) = send(&app, "GET", "/resume", None).await;
        assert_eq!(body["data"], Value::Null);
    }

    #[tokio::test]
    async fn test_export_route() {
        let app = app();
        let (_, body) = send(&app, "POST", "/profiles", Some(profile_body("Main"))).await;
        let id = body["data"]["profileId"].as_i64().unwrap();

        let request = Request::builder()
            .uri(format!("/profiles/{}/export?format=text", id))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"Jane_Doe_resume.txt\""
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8(bytes.to_vec()).unwrap().starts_with("Jane Doe\n"));

        let (status, body) = send(&app, "GET", &format!("/profiles/{}/export?format=pdf", id), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No renderer registered for pdf");
    }
}
