use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

/// Success envelope: `{"success": true, "data": ...}` sent with the given status.
pub struct Success<T> {
    pub code: StatusCode,
    pub data: T,
}

impl<T: Serialize> Success<T> {
    pub fn ok(data: T) -> Self {
        Self { code: StatusCode::OK, data }
    }

    pub fn created(data: T) -> Self {
        Self { code: StatusCode::CREATED, data }
    }
}

impl<T: Serialize> IntoResponse for Success<T> {
    fn into_response(self) -> Response {
        (self.code, Json(json!({
            "success": true,
            "data": self.data,
        }))).into_response()
    }
}

#[derive(Serialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}
