//! # OpenAPI Specification Assembly
//!
//! Assembles the utoipa-documented routes into a single OpenAPI spec served
//! at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Pack Calculator API",
        version = "0.1.0",
        description = "Configure pack sizes and decompose orders into the fewest items and packs.",
        license(name = "AGPL-3.0-or-later")
    ),
    paths(
        crate::routes::packs::get_pack_sizes,
        crate::routes::packs::replace_pack_sizes,
        crate::routes::calculate::calculate,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::routes::packs::PackSizesRequest,
        crate::routes::packs::PackSizesResponse,
        crate::routes::calculate::CalculateRequest,
        crate::routes::calculate::CalculateResponse,
        crate::routes::calculate::PackLine,
    )),
    tags(
        (name = "packs", description = "Pack-size configuration"),
        (name = "calculate", description = "Order decomposition"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json: Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_lists_every_route() {
        let spec = ApiDoc::openapi();
        let paths: Vec<&String> = spec.paths.paths.keys().collect();
        assert!(paths.iter().any(|p| *p == "/api/packs"));
        assert!(paths.iter().any(|p| *p == "/api/calculate"));
    }
}
