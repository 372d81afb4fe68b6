//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the artifact-dl HTTP API
//! using utoipa for compile-time document generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the artifact-dl HTTP API
///
/// The document is served at `/v1/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "artifact-dl HTTP API",
        version = "0.1.0",
        description = "Fetch artifacts from blob storage into a local directory, optionally unpacking them and keeping only the newest entries",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:9000", description = "Local development server")
    ),
    paths(
        crate::api::routes::download,
        crate::api::routes::ping,
        crate::api::routes::openapi_spec,
    ),
    components(
        schemas(crate::api::routes::DownloadForm)
    ),
    tags(
        (name = "download", description = "Artifact retrieval"),
        (name = "system", description = "Liveness and API documentation")
    )
)]
pub struct ApiDoc;
