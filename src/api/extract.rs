use axum::extract::{FromRequest, FromRequestParts};

use crate::api::response::ApiError;

/// `axum::Json` whose rejection uses the `{"error": ...}` body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Query` whose rejection uses the `{"error": ...}` body.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);
