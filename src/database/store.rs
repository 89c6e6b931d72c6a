use async_trait::async_trait;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Item, ItemChanges, NewItem};

/// Durable keyed collection of items.
///
/// Implementations assign ids, serialize conflicting writes, and report a
/// missing id as `Ok(None)` rather than an error.
#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn create(&self, item: NewItem) -> Result<Item, DatabaseError>;

    /// Every record, oldest `date` first.
    async fn list(&self) -> Result<Vec<Item>, DatabaseError>;

    async fn get(&self, id: Uuid) -> Result<Option<Item>, DatabaseError>;

    /// Apply `changes` and return the stored result, or `None` if the id is gone.
    async fn update(&self, id: Uuid, changes: ItemChanges) -> Result<Option<Item>, DatabaseError>;

    /// Physically remove the record and return its last state.
    async fn delete(&self, id: Uuid) -> Result<Option<Item>, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;
}
