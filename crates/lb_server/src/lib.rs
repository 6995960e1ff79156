//! lb_server — Lockbox HTTP record server
//!
//! Thin HTTP surface over [`lb_store::Store`].  Every route except
//! registration requires basic auth; every request must declare
//! `Content-Type: application/json`.

use std::future::Future;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use lb_store::Store;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};

pub const REGISTER_PATH: &str = "/users";

/// Shared handler state.  The store is injected by whoever builds the
/// router; there is no process-wide handle.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
}

impl AppState {
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(REGISTER_PATH, post(handlers::register))
        .route("/ping", get(handlers::ping))
        .route(
            "/records",
            post(handlers::store_record).get(handlers::list_records),
        )
        .route(
            "/records/by_type/:record_type",
            get(handlers::list_records_by_type),
        )
        // `:key` is an id alone, or a record type when a name follows.
        .route(
            "/records/:key",
            get(handlers::get_record)
                .put(handlers::update_record)
                .delete(handlers::delete_record),
        )
        .route(
            "/records/:key/:name",
            get(handlers::get_record_by_name)
                .put(handlers::update_record_by_name)
                .delete(handlers::delete_record_by_name),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_user,
        ))
        .layer(middleware::from_fn(auth::require_json))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve on an already bound listener until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "listening");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
