use axum::extract::{FromRequest, FromRequestParts};

use crate::helpers::error::ApiError;

/// `axum::Json` that rejects malformed bodies with the JSON error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct Json<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct Path<T>(pub T);
