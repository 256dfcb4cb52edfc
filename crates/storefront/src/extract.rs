//! Request extractors.

use axum::extract::FromRequest;

use crate::error::AppError;

/// JSON body extractor whose rejections are `AppError::BadRequest`.
///
/// Malformed or mistyped bodies therefore get the same `{message}` response
/// as every other invalid request, instead of axum's plain-text rejection.
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);
