//! Download handler: fetch an object into the destination directory.

use crate::api::AppState;
use crate::api::error_response::plain_text;
use crate::types::DownloadRequest;
use crate::utils::parse_unarchive_flag;
use axum::{
    Form,
    extract::{State, rejection::FormRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::DownloadForm;

/// POST /v1/download - Download an object, optionally unarchive it
#[utoipa::path(
    post,
    path = "/v1/download",
    tag = "download",
    request_body(
        content = DownloadForm,
        content_type = "application/x-www-form-urlencoded",
        description = "Object key and unarchive flag"
    ),
    responses(
        (status = 200, description = "Object downloaded (and extracted if requested)", body = String, content_type = "text/plain"),
        (status = 400, description = "Unreadable form body, empty uri, or the object could not be downloaded", body = String, content_type = "text/plain"),
        (status = 500, description = "Writing or extracting the object failed", body = String, content_type = "text/plain")
    )
)]
pub async fn download(
    State(state): State<AppState>,
    body: Result<Form<Vec<(String, String)>>, FormRejection>,
) -> Response {
    let form = match body {
        Ok(Form(pairs)) => DownloadForm::from_pairs(pairs),
        // not a form body: no fields at all
        Err(FormRejection::InvalidFormContentType(_)) => DownloadForm::default(),
        Err(rejection) => return parse_failure(rejection.body_text()),
    };

    if form.uri.is_empty() {
        return plain_text(StatusCode::BAD_REQUEST, "empty uri field");
    }

    let request = DownloadRequest::new(form.uri, parse_unarchive_flag(form.unarchive.as_deref()));
    match state.downloader.handle(request).await {
        Ok(_) => plain_text(StatusCode::OK, "download success"),
        Err(e) => e.into_response(),
    }
}

fn parse_failure(detail: String) -> Response {
    plain_text(
        StatusCode::BAD_REQUEST,
        format!("parse form failed: {}", detail),
    )
}
