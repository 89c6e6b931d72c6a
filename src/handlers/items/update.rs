use axum::{
    extract::{Path, State},
    Extension, Json,
};

use crate::auth::{authorize, Mutation, Principal};
use crate::database::models::Item;
use crate::error::ApiError;
use crate::media;
use crate::state::AppState;

use super::{parse_item_id, ItemForm};

/// PUT /api/items/:id - overwrite the supplied fields of an owned item
///
/// Order: existence (404), ownership (403), validation (400), then the photo
/// upload. Without a new photo the stored `mediaUrl` is kept as is.
pub async fn update(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    form: ItemForm,
) -> Result<Json<Item>, ApiError> {
    let id = parse_item_id(&id)?;
    let existing = state
        .store
        .get(id)
        .await?
        .ok_or_else(ApiError::item_not_found)?;

    authorize(&existing, &principal, Mutation::Update).into_result()?;

    let changes = form.input.into_changes()?;
    let media_url = media::resolve(state.media.as_ref(), form.upload).await?;

    // The record may have been deleted since the lookup
    let updated = state
        .store
        .update(id, changes.with_media_url(media_url))
        .await?
        .ok_or_else(ApiError::item_not_found)?;

    tracing::info!("Item {} updated by '{}'", updated.id, principal.subject);
    Ok(Json(updated))
}
