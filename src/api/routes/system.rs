//! System handlers: ping, OpenAPI.

use crate::api::error_response::plain_text;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// GET /v1/ping - Liveness probe
#[utoipa::path(
    get,
    path = "/v1/ping",
    tag = "system",
    responses(
        (status = 200, description = "Service is up", body = String, content_type = "text/plain")
    )
)]
pub async fn ping() -> Response {
    plain_text(StatusCode::OK, "PONG")
}

/// GET /v1/openapi.json - OpenAPI specification
#[utoipa::path(
    get,
    path = "/v1/openapi.json",
    tag = "system",
    responses(
        (status = 200, description = "OpenAPI specification", content_type = "application/json")
    )
)]
pub async fn openapi_spec() -> impl IntoResponse {
    use crate::api::openapi::ApiDoc;
    use utoipa::OpenApi;

    Json(ApiDoc::openapi())
}
