use std::sync::Arc;

use axum::{
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::franchisedtos::{CreateFranchiseDto, CreateFranchiserDto},
    error::HttpError,
    AppState,
};

pub fn franchiser_handler() -> Router {
    Router::new()
        .route("/", post(create_franchiser))
        .route("/:franchiser_id", get(get_franchiser))
}

pub fn franchise_handler() -> Router {
    Router::new()
        .route("/", post(create_franchise))
        .route("/:franchise_id", get(get_franchise))
}

pub async fn create_franchiser(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<CreateFranchiserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let franchiser = app_state.franchise_service.create_franchiser(body).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "status": "success",
            "data": franchiser
        })),
    ))
}

pub async fn get_franchiser(
    Path(franchiser_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let franchiser = app_state.franchise_service.get_franchiser(franchiser_id).await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": franchiser
    })))
}

pub async fn create_franchise(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<CreateFranchiseDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let franchise = app_state.franchise_service.create_franchise(body).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "status": "success",
            "data": franchise
        })),
    ))
}

pub async fn get_franchise(
    Path(franchise_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let franchise = app_state.franchise_service.get_franchise(franchise_id).await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": franchise
    })))
}
