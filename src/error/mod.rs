use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use metrics::counter;
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::error;

/// A single offending field reported in a validation failure
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    /// Machine-readable error kind such as `missing` or `float_parsing`
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Location of the field, starting with `body` or `path`
    pub loc: Vec<String>,
    /// Human-readable explanation
    pub msg: String,
    /// The value that failed validation
    pub input: Value,
}

impl FieldError {
    pub fn new(kind: &'static str, loc: &[&str], msg: impl Into<String>, input: Value) -> Self {
        Self {
            kind,
            loc: loc.iter().map(|s| s.to_string()).collect(),
            msg: msg.into(),
            input,
        }
    }
}

/// Errors raised by the catalog store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// An item was stored under a key other than its own identifier
    #[error("item {item_id} cannot be stored under key {key}")]
    KeyMismatch { key: i64, item_id: i64 },
    /// The identifier leaves no room for a successor
    #[error("item id {0} is out of range")]
    IdOutOfRange(i64),
    /// Every representable identifier has been issued
    #[error("item identifiers are exhausted")]
    IdsExhausted,
}

/// Errors that terminate a request
#[derive(Debug, Error)]
pub enum ApiError {
    /// The requested item is not in the catalog
    #[error("Item not found")]
    NotFound,
    /// The request failed schema validation before reaching the handler
    #[error("request validation failed with {} error(s)", .0.len())]
    Validation(Vec<FieldError>),
    /// No route matches the request path
    #[error("Not Found")]
    RouteNotFound,
    /// The route exists but does not accept the request method
    #[error("Method Not Allowed")]
    MethodNotAllowed,
    /// The caller exceeded the configured request rate
    #[error("Too Many Requests")]
    TooManyRequests,
    /// The catalog could not complete the operation
    #[error("Internal Server Error")]
    Store(#[from] StoreError),
}

impl ApiError {
    /// The HTTP status code for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound | ApiError::RouteNotFound => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Validation(errors) => {
                counter!("itemcatalog.validation_errors").increment(1);
                json!({ "detail": errors })
            }
            ApiError::Store(e) => {
                error!(error = %e, "Catalog store operation failed");
                json!({ "detail": "Internal Server Error" })
            }
            other => json!({ "detail": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}
