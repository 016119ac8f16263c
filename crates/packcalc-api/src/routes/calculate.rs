//! # Order Calculation API
//!
//! `POST /api/calculate` runs the optimizer against the active pack sizes.
//! Both outcomes share one response shape: on failure `success` is `false`,
//! `errorMessage` explains why, totals are zero and the pack list is empty.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use packcalc_core::{Decomposition, OrderQuantity, PackAllocation};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, ErrorDetail};
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;

/// Calculation request.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalculateRequest {
    #[schema(value_type = u64, example = 501)]
    pub order_quantity: serde_json::Value,
}

impl Validate for CalculateRequest {
    type Output = OrderQuantity;

    fn validate(self) -> Result<OrderQuantity, AppError> {
        Ok(OrderQuantity::from_json_value(&self.order_quantity)?)
    }
}

/// One line of the answer: `quantity` packs of `size` items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PackLine {
    pub size: u64,
    pub quantity: u64,
}

impl From<&PackAllocation> for PackLine {
    fn from(a: &PackAllocation) -> Self {
        Self {
            size: a.size,
            quantity: a.quantity,
        }
    }
}

/// Calculation response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalculateResponse {
    pub order_quantity: u64,
    pub total_items: u64,
    pub total_packs: u64,
    /// Packs by descending size.
    #[serde(rename = "pack_configurations")]
    pub pack_configurations: Vec<PackLine>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
}

impl CalculateResponse {
    pub fn success(decomposition: &Decomposition) -> Self {
        Self {
            order_quantity: decomposition.order_quantity().get(),
            total_items: decomposition.total_items(),
            total_packs: decomposition.total_packs(),
            pack_configurations: decomposition
                .allocations()
                .iter()
                .map(PackLine::from)
                .collect(),
            success: true,
            error_message: None,
            error: None,
        }
    }

    pub fn failure(order_quantity: u64, err: &AppError) -> Self {
        let body = err.body();
        Self {
            order_quantity,
            total_items: 0,
            total_packs: 0,
            pack_configurations: Vec::new(),
            success: false,
            error_message: Some(body.error_message),
            error: Some(body.error),
        }
    }
}

/// Build the calculation router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/calculate", post(calculate))
}

/// POST /api/calculate: Decompose an order into packs.
#[utoipa::path(
    post,
    path = "/api/calculate",
    request_body = CalculateRequest,
    responses(
        (status = 200, description = "Packs to ship", body = CalculateResponse),
        (status = 409, description = "No pack sizes configured", body = CalculateResponse),
        (status = 422, description = "Invalid order quantity or malformed body", body = CalculateResponse),
        (status = 429, description = "Rate limited", body = crate::error::ErrorBody),
    ),
    tag = "calculate"
)]
pub async fn calculate(
    State(state): State<AppState>,
    body: Result<Json<CalculateRequest>, JsonRejection>,
) -> Response {
    let order = match extract_validated_json(body) {
        Ok(order) => order,
        Err(err) => return failure(0, err),
    };

    match state.calculate(order).await {
        Ok(decomposition) => {
            tracing::info!(
                order = order.get(),
                total_items = decomposition.total_items(),
                total_packs = decomposition.total_packs(),
                "order calculated"
            );
            Json(CalculateResponse::success(&decomposition)).into_response()
        }
        Err(err) => failure(order.get(), err),
    }
}

fn failure(order_quantity: u64, err: AppError) -> Response {
    let (status, _) = err.status_and_code();
    err.log();
    if !status.is_server_error() {
        tracing::info!(order = order_quantity, error = %err, "calculation rejected");
    }
    (status, Json(CalculateResponse::failure(order_quantity, &err))).into_response()
}
