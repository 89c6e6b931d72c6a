use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Item, ItemChanges, NewItem};
use crate::database::store::ItemStore;

/// Process-local item store for development and tests.
///
/// Contents are lost on restart. Writes are serialized by the lock.
#[derive(Clone, Default)]
pub struct MemoryItemStore {
    items: Arc<RwLock<HashMap<Uuid, Item>>>,
}

impl MemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

#[async_trait]
impl ItemStore for MemoryItemStore {
    async fn create(&self, item: NewItem) -> Result<Item, DatabaseError> {
        let mut items = self.items.write().await;
        let mut id = Uuid::new_v4();
        while items.contains_key(&id) {
            id = Uuid::new_v4();
        }
        let item = item.into_item(id);
        items.insert(id, item.clone());
        Ok(item)
    }

    async fn list(&self) -> Result<Vec<Item>, DatabaseError> {
        let mut items: Vec<Item> = self.items.read().await.values().cloned().collect();
        items.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        Ok(items)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Item>, DatabaseError> {
        Ok(self.items.read().await.get(&id).cloned())
    }

    async fn update(&self, id: Uuid, changes: ItemChanges) -> Result<Option<Item>, DatabaseError> {
        let mut items = self.items.write().await;
        Ok(items.get_mut(&id).map(|item| {
            changes.apply_to(item);
            item.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Item>, DatabaseError> {
        Ok(self.items.write().await.remove(&id))
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}
