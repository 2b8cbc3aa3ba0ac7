use crate::core::error::ApiError;
use axum::{http::Uri, response::Response};
use axum::response::IntoResponse;

pub async fn fallback_handler(uri: Uri) -> Response {
    ApiError::NotFound(format!("no route for {}", uri.path())).into_response()
}
