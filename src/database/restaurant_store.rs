//! Restaurant Store - persistent restaurant entities and cuisine browsing.
//!
//! Restaurants are created lazily the first time a complete feed record is
//! observed; the ingestion engine never updates or deletes them. Identity is
//! the exact six-field tuple, backed by a unique index, so lookup-and-insert
//! is one atomic statement rather than a racy check-then-insert.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::opendata::types::RestaurantIdentity;

/// Stored restaurant entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RestaurantRow {
    pub restaurant_id: Uuid,
    pub name: String,
    pub cuisine: String,
    pub borough: String,
    pub building_number: String,
    pub street: String,
    pub zipcode: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl RestaurantRow {
    /// The identity tuple this row was stored under.
    pub fn identity(&self) -> RestaurantIdentity {
        RestaurantIdentity {
            name: self.name.clone(),
            cuisine: self.cuisine.clone(),
            borough: self.borough.clone(),
            building_number: self.building_number.clone(),
            street: self.street.clone(),
            zipcode: self.zipcode.clone(),
        }
    }
}

/// Store operations the ingestion engine depends on.
#[async_trait]
pub trait RestaurantStoreTrait: Send + Sync {
    /// Resolve an identity to its stored entity, inserting it when absent.
    /// Lookup and insert are indivisible: concurrent calls for the same
    /// identity resolve to the same row.
    async fn find_or_create(&self, identity: &RestaurantIdentity) -> Result<RestaurantRow>;
}

/// Service for restaurant persistence
#[derive(Clone, Debug)]
pub struct RestaurantStore {
    pool: PgPool,
}

impl RestaurantStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Get restaurant by ID
    pub async fn get_by_id(&self, restaurant_id: Uuid) -> Result<Option<RestaurantRow>> {
        sqlx::query_as::<_, RestaurantRow>(
            r#"
            SELECT restaurant_id, name, cuisine, borough, building_number, street, zipcode, created_at
            FROM restaurants
            WHERE restaurant_id = $1
            "#,
        )
        .bind(restaurant_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get restaurant by ID")
    }

    /// All distinct cuisines in the store, ascending
    pub async fn list_cuisines(&self) -> Result<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT cuisine
            FROM restaurants
            ORDER BY cuisine ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list cuisines")
    }

    /// Stored restaurants with the given cuisine
    pub async fn list_by_cuisine(&self, cuisine: &str) -> Result<Vec<RestaurantRow>> {
        sqlx::query_as::<_, RestaurantRow>(
            r#"
            SELECT restaurant_id, name, cuisine, borough, building_number, street, zipcode, created_at
            FROM restaurants
            WHERE cuisine = $1
            ORDER BY name ASC
            "#,
        )
        .bind(cuisine)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list restaurants by cuisine")
    }
}

#[async_trait]
impl RestaurantStoreTrait for RestaurantStore {
    async fn find_or_create(&self, identity: &RestaurantIdentity) -> Result<RestaurantRow> {
        let restaurant_id = Uuid::new_v4();

        // The no-op update on conflict makes RETURNING yield the existing row,
        // so a conflicting insert behaves as a lookup.
        let row = sqlx::query_as::<_, RestaurantRow>(
            r#"
            INSERT INTO restaurants
                (restaurant_id, name, cuisine, borough, building_number, street, zipcode, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
            ON CONFLICT (name, cuisine, borough, building_number, street, zipcode)
                DO UPDATE SET name = restaurants.name
            RETURNING restaurant_id, name, cuisine, borough, building_number, street, zipcode, created_at
            "#,
        )
        .bind(restaurant_id)
        .bind(&identity.name)
        .bind(&identity.cuisine)
        .bind(&identity.borough)
        .bind(&identity.building_number)
        .bind(&identity.street)
        .bind(&identity.zipcode)
        .fetch_one(&self.pool)
        .await
        .context("Failed to find or create restaurant")?;

        if row.restaurant_id == restaurant_id {
            info!("Created restaurant {} '{}'", row.restaurant_id, row.name);
        }

        Ok(row)
    }
}
