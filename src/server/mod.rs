use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use crate::bridge::Bridge;
use crate::export::{self, Exporter};
use crate::storage::Storage;

pub mod routes;

/// Server state
pub struct AppState {
    pub bridge: Bridge,
    pub exporter: Exporter,
}

impl AppState {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self {
            bridge: Bridge::new(storage),
            exporter: export::default_exporter(),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/resume",
            get(routes::load_resume)
                .put(routes::save_resume)
                .delete(routes::clear_resume),
        )
        .route("/profiles", get(routes::list_profiles).post(routes::create_profile))
        .route(
            "/profiles/{id}",
            get(routes::get_profile)
                .put(routes::save_profile)
                .delete(routes::delete_profile),
        )
        .route("/profiles/{id}/duplicate", post(routes::duplicate_profile))
        .route("/profiles/{id}/export", get(routes::export_profile))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(port: u16, storage: Arc<Storage>) -> anyhow::Result<()> {
    let app = router(Arc::new(AppState::new(storage)));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    tracing::info!("Starting server on {}", addr);
    crate::ui::output::server_started(&addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
