//! Ownership policy for mutating operations on items.

use crate::auth::Principal;
use crate::database::models::Item;
use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn into_result(self) -> Result<(), ApiError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny => Err(ApiError::forbidden()),
        }
    }
}

/// Only the principal recorded as the item's owner may change or remove it.
///
/// Callers must have loaded `item` already: a missing record is a 404 and is
/// decided before this check.
pub fn authorize(item: &Item, principal: &Principal, mutation: Mutation) -> Decision {
    if item.owner == principal.subject {
        Decision::Allow
    } else {
        tracing::warn!(
            "Ownership check failed: {:?} on item {} by '{}' (owner '{}')",
            mutation,
            item.id,
            principal.subject,
            item.owner
        );
        Decision::Deny
    }
}
