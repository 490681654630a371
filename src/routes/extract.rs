use axum::extract::FromRequest;

use crate::error::AppError;

/// JSON request body whose rejections are answered like any other [`AppError`].
///
/// Malformed JSON, wrongly typed fields and a missing content type all end up
/// as a 500 with an `{error, detail}` body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);
