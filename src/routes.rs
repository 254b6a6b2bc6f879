// routes.rs
use std::sync::Arc;

use axum::{routing::get, Extension, Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::{
    handler::{
        franchises::{franchise_handler, franchiser_handler},
        investments::{investment_handler, investor_handler, share_handler},
        properties::property_handler,
        wallets::wallet_handler,
    },
    AppState,
};

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "Server is running"
    }))
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_route = Router::new()
        .nest("/properties", property_handler())
        .nest("/franchisers", franchiser_handler())
        .nest("/franchises", franchise_handler())
        .nest("/investments", investment_handler())
        .nest("/shares", share_handler())
        .nest("/investors", investor_handler())
        .nest("/wallets", wallet_handler())
        .layer(TraceLayer::new_for_http())
        .layer(Extension(app_state));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_route)
}

/// Router over a fresh in-memory store.
#[cfg(test)]
pub fn test_router() -> Router {
    use crate::{config::Config, db::memory::MemoryStore};

    let state = AppState::new(Arc::new(MemoryStore::new()), &Config::for_tests());
    create_router(Arc::new(state))
}
