use crate::config::{DatabaseConfig, PoolSettings};
use crate::db::errors::{DbError, Result};
use crate::types::{ItemId, LookId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// A persisted wardrobe item: one uploaded garment photo plus its category label.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WardrobeItem {
    pub id: ItemId,
    pub user_id: String,
    pub image_url: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

/// Insert request for a wardrobe item
#[derive(Debug, Clone)]
pub struct WardrobeItemCreate {
    pub user_id: String,
    pub image_url: String,
    pub category: String,
}

/// Optional styling parameters attached to a saved look. All free-form;
/// callers may send any subset and the rest stay null.
#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct LookParams {
    pub occasion: Option<String>,
    pub weather: Option<String>,
    pub style: Option<String>,
    pub color: Option<String>,
    pub fit: Option<String>,
    pub material: Option<String>,
    pub season: Option<String>,
    pub time_of_day: Option<String>,
    pub budget: Option<String>,
    pub personal_style: Option<String>,
}

/// A persisted styled look: a generated outfit image saved by an authenticated user.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StyledLook {
    pub id: LookId,
    pub user_id: String,
    pub image_url: String,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub params: LookParams,
    pub created_at: DateTime<Utc>,
}

/// Insert request for a styled look
#[derive(Debug, Clone)]
pub struct StyledLookCreate {
    pub user_id: String,
    pub image_url: String,
    pub params: LookParams,
}

/// Trait for metadata store backends
#[async_trait]
pub trait WardrobeStore: Send + Sync {
    /// Insert a wardrobe item and return the stored record
    async fn insert_item(&self, request: &WardrobeItemCreate) -> Result<WardrobeItem>;

    /// List a user's wardrobe items, newest first
    async fn list_items(&self, user_id: &str) -> Result<Vec<WardrobeItem>>;

    /// Fetch a single wardrobe item by id
    async fn get_item(&self, id: ItemId) -> Result<Option<WardrobeItem>>;

    /// Delete a wardrobe item; returns whether a record existed
    async fn delete_item(&self, id: ItemId) -> Result<bool>;

    /// Insert a styled look and return the stored record
    async fn insert_look(&self, request: &StyledLookCreate) -> Result<StyledLook>;

    /// List a user's styled looks, newest first
    async fn list_looks(&self, user_id: &str) -> Result<Vec<StyledLook>>;
}

// ============================================================================
// PostgreSQL Implementation
// ============================================================================

/// PostgreSQL metadata store backend
pub struct PostgresWardrobeStore {
    pool: PgPool,
}

impl PostgresWardrobeStore {
    /// Connect to PostgreSQL with the configured pool settings and run
    /// pending migrations.
    pub async fn connect(url: &str, settings: &PoolSettings) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
            .connect(url)
            .await?;

        crate::migrator()
            .run(&pool)
            .await
            .map_err(|e| DbError::Other(anyhow::anyhow!("Failed to run migrations: {e}")))?;

        Ok(Self { pool })
    }

    /// Wrap an existing pool (migrations are assumed to have run)
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WardrobeStore for PostgresWardrobeStore {
    async fn insert_item(&self, request: &WardrobeItemCreate) -> Result<WardrobeItem> {
        let item = sqlx::query_as::<_, WardrobeItem>(
            "INSERT INTO wardrobe_items (user_id, image_url, category)
             VALUES ($1, $2, $3)
             RETURNING id, user_id, image_url, category, created_at",
        )
        .bind(&request.user_id)
        .bind(&request.image_url)
        .bind(&request.category)
        .fetch_one(&self.pool)
        .await?;

        Ok(item)
    }

    async fn list_items(&self, user_id: &str) -> Result<Vec<WardrobeItem>> {
        let items = sqlx::query_as::<_, WardrobeItem>(
            "SELECT id, user_id, image_url, category, created_at
             FROM wardrobe_items
             WHERE user_id = $1
             ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    async fn get_item(&self, id: ItemId) -> Result<Option<WardrobeItem>> {
        let item = sqlx::query_as::<_, WardrobeItem>(
            "SELECT id, user_id, image_url, category, created_at
             FROM wardrobe_items
             WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    async fn delete_item(&self, id: ItemId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM wardrobe_items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_look(&self, request: &StyledLookCreate) -> Result<StyledLook> {
        let look = sqlx::query_as::<_, StyledLook>(
            "INSERT INTO styled_looks
               (user_id, image_url, occasion, weather, style, color, fit, material, season, time_of_day, budget, personal_style)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING id, user_id, image_url, occasion, weather, style, color, fit, material, season, time_of_day,
                       budget, personal_style, created_at",
        )
        .bind(&request.user_id)
        .bind(&request.image_url)
        .bind(&request.params.occasion)
        .bind(&request.params.weather)
        .bind(&request.params.style)
        .bind(&request.params.color)
        .bind(&request.params.fit)
        .bind(&request.params.material)
        .bind(&request.params.season)
        .bind(&request.params.time_of_day)
        .bind(&request.params.budget)
        .bind(&request.params.personal_style)
        .fetch_one(&self.pool)
        .await?;

        Ok(look)
    }

    async fn list_looks(&self, user_id: &str) -> Result<Vec<StyledLook>> {
        let looks = sqlx::query_as::<_, StyledLook>(
            "SELECT id, user_id, image_url, occasion, weather, style, color, fit, material, season, time_of_day,
                    budget, personal_style, created_at
             FROM styled_looks
             WHERE user_id = $1
             ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(looks)
    }
}

// ============================================================================
// In-Memory Implementation
// ============================================================================

/// In-memory metadata store backend - keeps records in insertion order
/// Useful for development and testing
#[derive(Default)]
pub struct MemoryWardrobeStore {
    items: RwLock<Vec<WardrobeItem>>,
    looks: RwLock<Vec<StyledLook>>,
}

impl MemoryWardrobeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WardrobeStore for MemoryWardrobeStore {
    async fn insert_item(&self, request: &WardrobeItemCreate) -> Result<WardrobeItem> {
        let item = WardrobeItem {
            id: Uuid::new_v4(),
            user_id: request.user_id.clone(),
            image_url: request.image_url.clone(),
            category: request.category.clone(),
            created_at: Utc::now(),
        };
        self.items.write().push(item.clone());
        Ok(item)
    }

    async fn list_items(&self, user_id: &str) -> Result<Vec<WardrobeItem>> {
        // Reverse insertion order stands in for ORDER BY created_at DESC
        Ok(self
            .items
            .read()
            .iter()
            .rev()
            .filter(|item| item.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_item(&self, id: ItemId) -> Result<Option<WardrobeItem>> {
        Ok(self.items.read().iter().find(|item| item.id == id).cloned())
    }

    async fn delete_item(&self, id: ItemId) -> Result<bool> {
        let mut items = self.items.write();
        let before = items.len();
        items.retain(|item| item.id != id);
        Ok(items.len() < before)
    }

    async fn insert_look(&self, request: &StyledLookCreate) -> Result<StyledLook> {
        let look = StyledLook {
            id: Uuid::new_v4(),
            user_id: request.user_id.clone(),
            image_url: request.image_url.clone(),
            params: request.params.clone(),
            created_at: Utc::now(),
        };
        self.looks.write().push(look.clone());
        Ok(look)
    }

    async fn list_looks(&self, user_id: &str) -> Result<Vec<StyledLook>> {
        Ok(self
            .looks
            .read()
            .iter()
            .rev()
            .filter(|look| look.user_id == user_id)
            .cloned()
            .collect())
    }
}

// ============================================================================
// Factory
// ============================================================================

/// Create a metadata store backend from configuration
pub async fn create_wardrobe_store(config: &DatabaseConfig) -> Result<Arc<dyn WardrobeStore>> {
    match config {
        DatabaseConfig::Postgres { url, pool } => {
            tracing::info!("Connecting metadata store to PostgreSQL");
            let store = PostgresWardrobeStore::connect(url, pool).await?;
            Ok(Arc::new(store))
        }
        DatabaseConfig::Memory => {
            tracing::info!("Creating in-memory metadata store");
            Ok(Arc::new(MemoryWardrobeStore::new()))
        }
    }
}
