// handlers/items - /api/items endpoints
//
// Reads are public. Create, update and delete sit behind the authorization
// gate and receive the caller as `Extension<Principal>`.

pub mod create;
pub mod delete;
pub mod form;
pub mod list;
pub mod show;
pub mod update;

pub use create::create;
pub use delete::delete;
pub use form::ItemForm;
pub use list::list;
pub use show::show;
pub use update::update;

use uuid::Uuid;

use crate::error::ApiError;

/// Ids are UUIDs; anything else cannot name a stored item.
pub(crate) fn parse_item_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::item_not_found())
}

#[cfg(test)]
mod tests;
