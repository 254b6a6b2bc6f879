use std::sync::Arc;

use axum::{extract::Path, response::IntoResponse, routing::get, Extension, Json, Router};

use crate::{dtos::investmentdtos::validate_wallet_address, error::HttpError, AppState};

pub fn wallet_handler() -> Router {
    Router::new().route("/:address/balance", get(get_wallet_balance))
}

pub async fn get_wallet_balance(
    Path(address): Path<String>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    validate_wallet_address(&address)
        .map_err(|_| HttpError::bad_request("Address must be a base58 wallet address"))?;

    let balance = app_state.rpc.get_balance(&address).await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": balance
    })))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use crate::routes::test_router;

    #[tokio::test]
    async fn unreachable_endpoints_surface_as_bad_gateway() {
        let app = test_router();
        let request = Request::builder()
            .uri("/api/wallets/9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin/balance")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "fail");
    }
}
