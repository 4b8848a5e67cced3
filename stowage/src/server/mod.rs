//! HTTP surface.
//!
//! All state sits behind one `std::sync::Mutex`; every handler takes the lock
//! once, so requests observe and mutate the registries one at a time. A handler
//! that panics while holding it does not take the service down: later requests
//! recover the guard from the poisoned lock.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::StowageConfig;
use crate::error::{StowageError, StowageResult};
use crate::service::Stowage;

pub mod error;
mod handlers;

pub use error::ApiError;

#[derive(Clone, Default)]
pub struct AppState {
    inner: Arc<Mutex<Stowage>>,
}

impl AppState {
    pub fn new(stowage: Stowage) -> Self {
        Self {
            inner: Arc::new(Mutex::new(stowage)),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Stowage> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("recovering stowage state after a panicked request");
            PoisonError::into_inner(poisoned)
        })
    }
}

pub fn router(state: AppState, max_body_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/placement", post(handlers::placement))
        .route("/api/search", get(handlers::search))
        .route("/api/retrieve", post(handlers::retrieve))
        .route("/api/place", post(handlers::place))
        .route("/api/waste/identify", get(handlers::identify_waste))
        .route("/api/waste/return-plan", post(handlers::return_plan))
        .route(
            "/api/waste/complete-undocking",
            post(handlers::complete_undocking),
        )
        .route("/api/simulate/day", post(handlers::simulate_day))
        .route("/api/import/items", post(handlers::import_items))
        .route("/api/import/containers", post(handlers::import_containers))
        .route("/api/export/arrangement", get(handlers::export_arrangement))
        .route("/api/logs", get(handlers::logs))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `config.bind_addr` and serve until `shutdown` resolves.
pub async fn serve<F>(config: &StowageConfig, state: AppState, shutdown: F) -> StowageResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(state, config.max_upload_bytes);
    let listener = TcpListener::bind(config.bind_addr.as_str())
        .await
        .map_err(|e| StowageError::Io(format!("bind {}: {}", config.bind_addr, e)))?;

    tracing::info!(addr = %config.bind_addr, "stowage server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("stowage server stopped");
    Ok(())
}
