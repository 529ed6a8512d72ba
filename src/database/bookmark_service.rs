//! Bookmark Service - user bookmarks on restaurants.

use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::restaurant_store::RestaurantRow;

/// Outcome of a bookmark toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BookmarkToggle {
    Added,
    Removed,
}

/// Service for bookmark operations
#[derive(Clone, Debug)]
pub struct BookmarkService {
    pool: PgPool,
}

impl BookmarkService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Bookmark the restaurant if it isn't bookmarked, remove the bookmark if
    /// it is. The delete-first shape keeps the toggle to one statement per
    /// branch.
    pub async fn toggle(&self, user_id: Uuid, restaurant_id: Uuid) -> Result<BookmarkToggle> {
        let removed = sqlx::query(
            r#"
            DELETE FROM bookmarks
            WHERE user_id = $1 AND restaurant_id = $2
            "#,
        )
        .bind(user_id)
        .bind(restaurant_id)
        .execute(&self.pool)
        .await
        .context("Failed to remove bookmark")?;

        if removed.rows_affected() > 0 {
            info!("User {} removed bookmark on {}", user_id, restaurant_id);
            return Ok(BookmarkToggle::Removed);
        }

        sqlx::query(
            r#"
            INSERT INTO bookmarks (bookmark_id, user_id, restaurant_id, created_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (user_id, restaurant_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(restaurant_id)
        .execute(&self.pool)
        .await
        .context("Failed to add bookmark")?;

        info!("User {} bookmarked {}", user_id, restaurant_id);
        Ok(BookmarkToggle::Added)
    }

    /// The restaurants a user has bookmarked
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<RestaurantRow>> {
        sqlx::query_as::<_, RestaurantRow>(
            r#"
            SELECT r.restaurant_id, r.name, r.cuisine, r.borough, r.building_number, r.street, r.zipcode, r.created_at
            FROM restaurants r
            JOIN bookmarks b ON b.restaurant_id = r.restaurant_id
            WHERE b.user_id = $1
            ORDER BY b.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list bookmarked restaurants")
    }

    /// Just the bookmarked restaurant ids, for marking cards in listings
    pub async fn restaurant_ids_for_user(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT restaurant_id
            FROM bookmarks
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list bookmark ids")
    }
}
