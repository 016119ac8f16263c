//! # Pack Size Configuration API
//!
//! Read and replace the active pack-size set. Submissions are normalized
//! (deduplicated, sorted descending) and the normalized set is echoed back.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use packcalc_core::PackSizeSet;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, ErrorBody};
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;

/// Replace-all request. Entries are validated individually so that a
/// fractional or non-numeric size is reported as an invalid pack size.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PackSizesRequest {
    #[schema(value_type = Vec<i64>, example = json!([250, 500, 1000, 2000, 5000]))]
    pub pack_sizes: Vec<serde_json::Value>,
}

impl Validate for PackSizesRequest {
    type Output = PackSizeSet;

    fn validate(self) -> Result<PackSizeSet, AppError> {
        Ok(PackSizeSet::from_json_values(&self.pack_sizes)?)
    }
}

/// The active pack sizes, largest first.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PackSizesResponse {
    #[schema(example = json!([5000, 2000, 1000, 500, 250]))]
    pub pack_sizes: Vec<u64>,
}

impl From<&PackSizeSet> for PackSizesResponse {
    fn from(sizes: &PackSizeSet) -> Self {
        Self {
            pack_sizes: sizes.to_vec(),
        }
    }
}

/// Build the pack configuration router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/packs", get(get_pack_sizes).post(replace_pack_sizes))
}

/// GET /api/packs: Current pack sizes.
#[utoipa::path(
    get,
    path = "/api/packs",
    responses(
        (status = 200, description = "Active pack sizes", body = PackSizesResponse),
        (status = 409, description = "No pack sizes configured", body = ErrorBody),
    ),
    tag = "packs"
)]
pub async fn get_pack_sizes(
    State(state): State<AppState>,
) -> Result<Json<PackSizesResponse>, AppError> {
    let active = state.packs.require()?;
    Ok(Json(PackSizesResponse::from(active.sizes())))
}

/// POST /api/packs: Replace the pack sizes.
#[utoipa::path(
    post,
    path = "/api/packs",
    request_body = PackSizesRequest,
    responses(
        (status = 200, description = "Normalized pack sizes now in effect", body = PackSizesResponse),
        (status = 409, description = "Empty pack-size list", body = ErrorBody),
        (status = 422, description = "Invalid pack size or malformed body", body = ErrorBody),
        (status = 429, description = "Rate limited", body = ErrorBody),
    ),
    tag = "packs"
)]
pub async fn replace_pack_sizes(
    State(state): State<AppState>,
    body: Result<Json<PackSizesRequest>, JsonRejection>,
) -> Result<Json<PackSizesResponse>, AppError> {
    let sizes = extract_validated_json(body)?;
    let active = state.replace_pack_sizes(sizes).await?;
    Ok(Json(PackSizesResponse::from(active.sizes())))
}
