use std::sync::Arc;

use axum::{
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::investmentdtos::{
        validate_wallet_address, ConfirmShareDto, CreateInvestmentDto, PurchaseSharesDto,
        ShareReasonDto, UpdateInvestmentStatusDto,
    },
    error::HttpError,
    AppState,
};

pub fn investment_handler() -> Router {
    Router::new()
        .route("/", post(create_investment))
        .route("/:franchise_id", get(get_investment))
        .route("/:franchise_id/status", put(update_investment_status))
        .route("/:franchise_id/progress", get(get_investment_progress))
        .route(
            "/:franchise_id/shares",
            get(list_franchise_shares).post(purchase_shares),
        )
}

pub fn share_handler() -> Router {
    Router::new()
        .route("/:share_id/confirm", post(confirm_share))
        .route("/:share_id/fail", post(fail_share))
        .route("/:share_id/refund", post(refund_share))
}

pub fn investor_handler() -> Router {
    Router::new().route("/:investor_id/shares", get(list_investor_shares))
}

pub async fn create_investment(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<CreateInvestmentDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let investment = app_state.investment_service.create_investment(body).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "status": "success",
            "data": investment
        })),
    ))
}

pub async fn get_investment(
    Path(franchise_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let investment = app_state.investment_service.get_investment(franchise_id).await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": investment
    })))
}

pub async fn update_investment_status(
    Path(franchise_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<UpdateInvestmentStatusDto>,
) -> Result<impl IntoResponse, HttpError> {
    let investment = app_state
        .investment_service
        .update_investment_status(franchise_id, body.status)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": investment
    })))
}

pub async fn get_investment_progress(
    Path(franchise_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let progress = app_state
        .investment_service
        .get_investment_progress(franchise_id)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": progress
    })))
}

pub async fn purchase_shares(
    Path(franchise_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<PurchaseSharesDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let share = app_state
        .investment_service
        .purchase_shares(franchise_id, body)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "status": "success",
            "data": share
        })),
    ))
}

pub async fn list_franchise_shares(
    Path(franchise_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let shares = app_state
        .investment_service
        .list_shares_by_franchise(franchise_id)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "results": shares.len(),
        "data": shares
    })))
}

pub async fn confirm_share(
    Path(share_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    body: Option<Json<ConfirmShareDto>>,
) -> Result<impl IntoResponse, HttpError> {
    let body = body.map(|Json(body)| body).unwrap_or_default();
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let (share, investment) = app_state.investment_service.confirm_share(share_id, body).await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": {
            "share": share,
            "investment": investment
        }
    })))
}

pub async fn fail_share(
    Path(share_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<ShareReasonDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let share = app_state.investment_service.fail_share(share_id, body.reason).await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": share
    })))
}

pub async fn refund_share(
    Path(share_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<ShareReasonDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let (share, investment) = app_state
        .investment_service
        .refund_share(share_id, body.reason)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": {
            "share": share,
            "investment": investment
        }
    })))
}

pub async fn list_investor_shares(
    Path(investor_id): Path<String>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    validate_wallet_address(&investor_id)
        .map_err(|_| HttpError::bad_request("Investor id must be a base58 wallet address"))?;

    let shares = app_state
        .investment_service
        .list_shares_by_investor(&investor_id)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "results": shares.len(),
        "data": shares
    })))
}
