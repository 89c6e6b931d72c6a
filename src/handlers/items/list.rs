use axum::{extract::State, Json};

use crate::database::models::Item;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/items - every item, unfiltered
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Item>>, ApiError> {
    let items = state.store.list().await?;
    Ok(Json(items))
}
