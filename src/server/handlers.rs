use axum::{Json, extract::State};
use metrics::counter;
use tracing::{debug, info};

use super::AppState;
use super::extract::{ItemId, ValidItemCreate};
use crate::error::ApiError;
use crate::models::{HealthResponse, Item};

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

/// Fetch a single item by identifier
pub async fn get_item(
    State(state): State<AppState>,
    ItemId(item_id): ItemId,
) -> Result<Json<Item>, ApiError> {
    // Update lookup metrics
    counter!("itemcatalog.item_lookups").increment(1);
    // Look up the item in the catalog
    match state.store.get(item_id).await {
        Some(item) => Ok(Json(item)),
        None => {
            // Output debugging information
            debug!(item_id, "Item not found");
            counter!("itemcatalog.item_not_found").increment(1);
            Err(ApiError::NotFound)
        }
    }
}

/// List every item in the catalog
pub async fn list_items(State(state): State<AppState>) -> Json<Vec<Item>> {
    Json(state.store.all().await)
}

/// Create a new item and return it with its assigned identifier
pub async fn create_item(
    State(state): State<AppState>,
    ValidItemCreate(input): ValidItemCreate,
) -> Result<Json<Item>, ApiError> {
    // Allocate an identifier and store the item
    let item = state.store.create(input).await?;
    // Update creation metrics
    counter!("itemcatalog.items_created").increment(1);
    // Output debugging information
    info!(item_id = item.id, name = %item.name, "Item created");
    Ok(Json(item))
}

/// Fallback for paths with no matching route
pub async fn route_not_found() -> ApiError {
    ApiError::RouteNotFound
}

/// Fallback for known paths requested with an unsupported method
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
