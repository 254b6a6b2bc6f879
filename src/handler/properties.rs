use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::propertydtos::{
        AssignPropertyDto, BulkStageDto, CheckViolationsDto, ContactDto, CreatePropertyDto,
        ImposePenaltyDto, PropertyQueryDto, SearchQueryDto, UpdateAvailabilityDto,
        UpdatePenaltyStatusDto, UpdateStageDto, UpdateStatusDto, VerifyPropertyDto,
    },
    error::{ErrorMessage, HttpError},
    AppState,
};

pub fn property_handler() -> Router {
    Router::new()
        .route("/", get(get_properties).post(create_property))
        .route("/search", get(search_properties))
        .route("/stats", get(get_property_stats))
        .route("/penalty-stats", get(get_penalty_stats))
        .route("/bulk-stage", post(bulk_update_stages))
        .route("/:property_id", get(get_property))
        .route("/:property_id/stage", put(update_stage))
        .route("/:property_id/availability", put(update_availability))
        .route("/:property_id/status", put(update_status))
        .route("/:property_id/verify", put(verify_property))
        .route("/:property_id/assign", put(assign_property))
        .route("/:property_id/contacts", post(add_contact))
        .route("/:property_id/penalties", post(impose_penalty))
        .route("/:property_id/penalties/status", put(update_penalty_status))
        .route("/:property_id/violations/check", post(check_violations))
}

fn parse_property_id(raw: &str) -> Result<Uuid, HttpError> {
    Uuid::parse_str(raw).map_err(|_| HttpError::bad_request(ErrorMessage::InvalidPropertyId.to_string()))
}

pub async fn create_property(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<CreatePropertyDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let property = app_state.property_service.create_property(body).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "status": "success",
            "data": {
                "property_id": property.id,
                "property": property
            }
        })),
    ))
}

pub async fn get_properties(
    Query(query): Query<PropertyQueryDto>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    query.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let properties = app_state.property_service.get_properties(query).await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "results": properties.len(),
        "data": properties
    })))
}

pub async fn get_property(
    Path(property_id): Path<String>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let property_id = parse_property_id(&property_id)?;
    let property = app_state.property_service.get_property(property_id).await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": property
    })))
}

pub async fn search_properties(
    Query(query): Query<SearchQueryDto>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    query.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let properties = app_state
        .property_service
        .search_properties(&query.q, query.limit)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "results": properties.len(),
        "data": properties
    })))
}

pub async fn get_property_stats(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let stats = app_state.property_service.property_stats().await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": stats
    })))
}

pub async fn get_penalty_stats(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let stats = app_state.property_service.penalty_stats().await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": stats
    })))
}

pub async fn update_stage(
    Path(property_id): Path<String>,
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<UpdateStageDto>,
) -> Result<impl IntoResponse, HttpError> {
    let property_id = parse_property_id(&property_id)?;
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let property = app_state.property_service.update_stage(property_id, body).await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": {
            "success": true,
            "property": property
        }
    })))
}

pub async fn update_availability(
    Path(property_id): Path<String>,
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<UpdateAvailabilityDto>,
) -> Result<impl IntoResponse, HttpError> {
    let property_id = parse_property_id(&property_id)?;
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let property = app_state
        .property_service
        .update_availability(property_id, body)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": {
            "success": true,
            "property": property
        }
    })))
}

pub async fn update_status(
    Path(property_id): Path<String>,
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<UpdateStatusDto>,
) -> Result<impl IntoResponse, HttpError> {
    let property_id = parse_property_id(&property_id)?;
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let outcome = app_state
        .property_service
        .update_status_with_penalty_check(property_id, body)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": {
            "success": true,
            "property": outcome.property,
            "violations": outcome.violations
        }
    })))
}

pub async fn bulk_update_stages(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<BulkStageDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let response = app_state.property_service.bulk_update_stages(body).await;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": response
    })))
}

pub async fn verify_property(
    Path(property_id): Path<String>,
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<VerifyPropertyDto>,
) -> Result<impl IntoResponse, HttpError> {
    let property_id = parse_property_id(&property_id)?;
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let property = app_state.property_service.verify_property(property_id, body).await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": {
            "success": true,
            "property": property
        }
    })))
}

pub async fn assign_property(
    Path(property_id): Path<String>,
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<AssignPropertyDto>,
) -> Result<impl IntoResponse, HttpError> {
    let property_id = parse_property_id(&property_id)?;

    let property = app_state.property_service.assign_property(property_id, body).await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": {
            "success": true,
            "property": property
        }
    })))
}

pub async fn add_contact(
    Path(property_id): Path<String>,
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<ContactDto>,
) -> Result<impl IntoResponse, HttpError> {
    let property_id = parse_property_id(&property_id)?;
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let property = app_state.property_service.add_contact(property_id, body).await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": {
            "success": true,
            "contact_history": property.contact_history
        }
    })))
}

pub async fn impose_penalty(
    Path(property_id): Path<String>,
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<ImposePenaltyDto>,
) -> Result<impl IntoResponse, HttpError> {
    let property_id = parse_property_id(&property_id)?;
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let imposed = app_state.property_service.impose_penalty(property_id, body).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "status": "success",
            "data": imposed
        })),
    ))
}

pub async fn update_penalty_status(
    Path(property_id): Path<String>,
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<UpdatePenaltyStatusDto>,
) -> Result<impl IntoResponse, HttpError> {
    let property_id = parse_property_id(&property_id)?;
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let property = app_state
        .property_service
        .update_penalty_status(property_id, body)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": {
            "success": true,
            "total_penalties": property.total_penalties,
            "unpaid_penalties": property.unpaid_penalties,
            "penalty_history": property.penalty_history
        }
    })))
}

pub async fn check_violations(
    Path(property_id): Path<String>,
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<CheckViolationsDto>,
) -> Result<impl IntoResponse, HttpError> {
    let property_id = parse_property_id(&property_id)?;

    let report = app_state
        .property_service
        .check_violations(property_id, body.checked_by)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": report
    })))
}
