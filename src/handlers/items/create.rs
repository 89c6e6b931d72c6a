use axum::{extract::State, http::StatusCode, Extension, Json};

use crate::auth::Principal;
use crate::database::models::Item;
use crate::error::ApiError;
use crate::media;
use crate::state::AppState;

use super::ItemForm;

/// POST /api/items - report a lost or found item
pub async fn create(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    form: ItemForm,
) -> Result<(StatusCode, Json<Item>), ApiError> {
    // Validate first so a rejected report never uploads a photo
    let mut new_item = form.input.into_new_item(&principal)?;
    new_item.media_url = media::resolve(state.media.as_ref(), form.upload).await?;

    let item = state.store.create(new_item).await?;
    tracing::info!("Item {} created by '{}'", item.id, item.owner);

    Ok((StatusCode::CREATED, Json(item)))
}
