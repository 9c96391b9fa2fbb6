use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{ApiError, AppState, CurrentCaller};
use crate::clients::VoucherQuote;
use crate::order_actor::{CheckoutRequest, OrderServiceError};

pub const ROLLBACK_SUCCESS_MESSAGE: &str = "Inventory rollback completed successfully";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/orders", post(place_order_handler))
        .route("/api/orders/rollback-inventory", post(rollback_inventory_handler))
        .route("/api/orders/{id}", get(view_order_handler))
        .route("/api/orders/{id}/confirm-payment", post(confirm_payment_handler))
        .route("/api/orders/{id}/complete", post(complete_order_handler))
        .route("/api/products/{id}", get(view_product_handler))
        .route("/api/vouchers/validate", post(validate_voucher_handler))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollbackRequest {
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RollbackResponse {
    pub success: bool,
    pub message: &'static str,
    pub order_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ValidateVoucherRequest {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub subtotal: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateVoucherResponse {
    pub valid: bool,
    #[serde(flatten)]
    pub quote: VoucherQuote,
}

fn malformed(rejection: JsonRejection) -> ApiError {
    ApiError::bad_request(rejection.body_text())
}

#[instrument(skip_all)]
async fn place_order_handler(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    payload: Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    if caller.is_none() {
        return Err(OrderServiceError::Unauthorized.into());
    }
    let Json(request) = payload.map_err(malformed)?;
    let order = state.orders.place_order(caller.as_ref(), request).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

#[instrument(skip_all, fields(order_id = %id))]
async fn view_order_handler(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state.orders.view_order(caller.as_ref(), id).await?;
    Ok(Json(order))
}

#[instrument(skip_all, fields(order_id = %id))]
async fn confirm_payment_handler(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state.orders.confirm_payment(caller.as_ref(), id).await?;
    Ok(Json(order))
}

#[instrument(skip_all, fields(order_id = %id))]
async fn complete_order_handler(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state.orders.complete_order(caller.as_ref(), id).await?;
    Ok(Json(order))
}

#[instrument(skip_all)]
async fn rollback_inventory_handler(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    payload: Result<Json<RollbackRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    if caller.is_none() {
        return Err(OrderServiceError::Unauthorized.into());
    }
    let Json(request) = payload.map_err(malformed)?;
    let order_id = request
        .order_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::bad_request("Order ID is required"))?;

    let outcome = state
        .orders
        .rollback_inventory(caller.as_ref(), order_id, request.reason)
        .await?;

    Ok(Json(RollbackResponse {
        success: true,
        message: ROLLBACK_SUCCESS_MESSAGE,
        order_id: outcome.order.id,
    }))
}

#[instrument(skip_all, fields(product_id = %id))]
async fn view_product_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state
        .products
        .get_product(id.clone())
        .await?
        .ok_or_else(|| ApiError::from(OrderServiceError::NotFound { collection: "product", id }))?;
    Ok(Json(product))
}

#[instrument(skip_all)]
async fn validate_voucher_handler(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    payload: Result<Json<ValidateVoucherRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    if caller.is_none() {
        return Err(OrderServiceError::Unauthorized.into());
    }
    let Json(request) = payload.map_err(malformed)?;
    let (Some(code), Some(subtotal)) = (request.code.filter(|c| !c.trim().is_empty()), request.subtotal) else {
        return Err(ApiError::bad_request("Missing required fields"));
    };

    let quote = state
        .vouchers
        .quote(code.trim().to_string(), subtotal)
        .await
        .map_err(ApiError::from_request)?;
    Ok(Json(ValidateVoucherResponse { valid: true, quote }))
}
