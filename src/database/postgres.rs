use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{Item, ItemChanges, NewItem};
use crate::database::store::ItemStore;

const ITEM_COLUMNS: &str = "id, title, description, location, status, date, owner, media_url";

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS lost_items (
        id UUID PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        location TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'lost' CHECK (status IN ('lost', 'found')),
        date TIMESTAMPTZ NOT NULL DEFAULT now(),
        owner TEXT NOT NULL,
        media_url TEXT
    )
"#;

/// Item store backed by the `lost_items` Postgres table
#[derive(Clone)]
pub struct PgItemStore {
    pool: PgPool,
}

impl PgItemStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the table if it does not exist yet
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        info!("lost_items table ready");
        Ok(())
    }
}

#[async_trait]
impl ItemStore for PgItemStore {
    async fn create(&self, item: NewItem) -> Result<Item, DatabaseError> {
        let sql = format!(
            "INSERT INTO lost_items ({ITEM_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {ITEM_COLUMNS}"
        );

        let item = sqlx::query_as::<_, Item>(&sql)
            .bind(Uuid::new_v4())
            .bind(&item.title)
            .bind(&item.description)
            .bind(&item.location)
            .bind(item.status.as_str())
            .bind(item.date.unwrap_or_else(Utc::now))
            .bind(&item.owner)
            .bind(&item.media_url)
            .fetch_one(&self.pool)
            .await?;

        Ok(item)
    }

    async fn list(&self) -> Result<Vec<Item>, DatabaseError> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM lost_items ORDER BY date ASC, id ASC");
        let items = sqlx::query_as::<_, Item>(&sql).fetch_all(&self.pool).await?;
        Ok(items)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Item>, DatabaseError> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM lost_items WHERE id = $1");
        let item = sqlx::query_as::<_, Item>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    async fn update(&self, id: Uuid, changes: ItemChanges) -> Result<Option<Item>, DatabaseError> {
        // COALESCE keeps the stored value for every field the caller left out
        let sql = format!(
            r#"UPDATE lost_items SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                location = COALESCE($4, location),
                status = COALESCE($5, status),
                date = COALESCE($6, date),
                media_url = COALESCE($7, media_url)
            WHERE id = $1
            RETURNING {ITEM_COLUMNS}"#
        );

        let item = sqlx::query_as::<_, Item>(&sql)
            .bind(id)
            .bind(changes.title)
            .bind(changes.description)
            .bind(changes.location)
            .bind(changes.status.map(|s| s.as_str()))
            .bind(changes.date)
            .bind(changes.media_url)
            .fetch_optional(&self.pool)
            .await?;

        Ok(item)
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Item>, DatabaseError> {
        let sql = format!("DELETE FROM lost_items WHERE id = $1 RETURNING {ITEM_COLUMNS}");
        let item = sqlx::query_as::<_, Item>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }
}
