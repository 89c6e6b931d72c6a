use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Serialize;

use crate::auth::{authorize, Mutation, Principal};
use crate::database::models::Item;
use crate::error::ApiError;
use crate::state::AppState;

use super::parse_item_id;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub message: String,
    pub deleted_item: Item,
}

/// DELETE /api/items/:id - remove an owned item
pub async fn delete(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let id = parse_item_id(&id)?;
    let existing = state
        .store
        .get(id)
        .await?
        .ok_or_else(ApiError::item_not_found)?;

    authorize(&existing, &principal, Mutation::Delete).into_result()?;

    // A concurrent delete may have won the race; the loser sees 404
    let deleted_item = state
        .store
        .delete(id)
        .await?
        .ok_or_else(ApiError::item_not_found)?;

    tracing::info!("Item {} deleted by '{}'", deleted_item.id, principal.subject);
    Ok(Json(DeleteResponse {
        message: "Item deleted successfully".to_string(),
        deleted_item,
    }))
}
