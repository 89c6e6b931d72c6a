use axum::{
    extract::{Path, State},
    Json,
};

use crate::database::models::Item;
use crate::error::ApiError;
use crate::state::AppState;

use super::parse_item_id;

/// GET /api/items/:id - a single item
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Item>, ApiError> {
    let id = parse_item_id(&id)?;
    let item = state
        .store
        .get(id)
        .await?
        .ok_or_else(ApiError::item_not_found)?;
    Ok(Json(item))
}
