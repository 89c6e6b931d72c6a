use async_trait::async_trait;
use axum::body::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::media::{ImageFormat, MediaError, MediaStore, Upload};

/// Keeps photos in process memory under `memory://{folder}/{uuid}.{ext}` URLs
#[derive(Clone)]
pub struct MemoryMediaStore {
    folder: String,
    objects: Arc<RwLock<HashMap<String, Bytes>>>,
}

impl MemoryMediaStore {
    pub fn new(folder: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            objects: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn get(&self, url: &str) -> Option<Bytes> {
        self.objects.read().await.get(url).cloned()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }
}

#[async_trait]
impl MediaStore for MemoryMediaStore {
    async fn store(&self, upload: Upload, format: ImageFormat) -> Result<String, MediaError> {
        let url = format!(
            "memory://{}/{}.{}",
            self.folder,
            Uuid::new_v4().simple(),
            format.extension()
        );
        self.objects.write().await.insert(url.clone(), upload.bytes);
        Ok(url)
    }
}
