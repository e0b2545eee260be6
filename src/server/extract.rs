use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
};
use serde_json::Value;
use tracing::debug;

use crate::error::{ApiError, FieldError};
use crate::models::ItemCreate;
use crate::validate::{parse_item_id, parse_json_body, validate_item_create};

/// Item identifier parsed from the `{item_id}` path segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemId(pub i64);

impl<S> FromRequestParts<S> for ItemId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Extract the raw segment without any type conversion
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| {
                debug!(error = %e, "Failed to extract item_id path segment");
                ApiError::RouteNotFound
            })?;
        // Validate it as an integer
        parse_item_id(&raw).map(ItemId)
    }
}

/// Request body that passed item creation validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidItemCreate(pub ItemCreate);

impl<S> FromRequest<S> for ValidItemCreate
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        // Buffer the full request body
        let bytes = Bytes::from_request(req, state).await.map_err(|e| {
            ApiError::Validation(vec![FieldError::new(
                "json_invalid",
                &["body"],
                e.body_text(),
                Value::Null,
            )])
        })?;
        // Parse and validate the body
        let body = parse_json_body(&bytes)?;
        validate_item_create(&body).map(ValidItemCreate)
    }
}
