//! Review Service - user reviews on restaurants.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

/// Maximum review length, matching the column width
pub const MAX_REVIEW_LEN: usize = 150;

/// Stored review
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ReviewRow {
    pub review_id: Uuid,
    pub body: String,
    pub user_id: Uuid,
    pub restaurant_id: Uuid,
    pub created_at: Option<DateTime<Utc>>,
}

/// Service for review operations
#[derive(Clone, Debug)]
pub struct ReviewService {
    pool: PgPool,
}

impl ReviewService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create a review. The body is limited to [`MAX_REVIEW_LEN`] characters.
    pub async fn create(
        &self,
        user_id: Uuid,
        restaurant_id: Uuid,
        body: &str,
    ) -> Result<ReviewRow> {
        if body.chars().count() > MAX_REVIEW_LEN {
            bail!("Review exceeds {} characters", MAX_REVIEW_LEN);
        }

        let review_id = Uuid::new_v4();
        let row = sqlx::query_as::<_, ReviewRow>(
            r#"
            INSERT INTO reviews (review_id, body, user_id, restaurant_id, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING review_id, body, user_id, restaurant_id, created_at
            "#,
        )
        .bind(review_id)
        .bind(body)
        .bind(user_id)
        .bind(restaurant_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to create review")?;

        info!(
            "User {} reviewed restaurant {} ({})",
            user_id, restaurant_id, review_id
        );
        Ok(row)
    }

    /// Reviews for a restaurant, newest first
    pub async fn list_for_restaurant(&self, restaurant_id: Uuid) -> Result<Vec<ReviewRow>> {
        sqlx::query_as::<_, ReviewRow>(
            r#"
            SELECT review_id, body, user_id, restaurant_id, created_at
            FROM reviews
            WHERE restaurant_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list reviews for restaurant")
    }

    /// Reviews written by a user, newest first
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ReviewRow>> {
        sqlx::query_as::<_, ReviewRow>(
            r#"
            SELECT review_id, body, user_id, restaurant_id, created_at
            FROM reviews
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list reviews for user")
    }

    /// Delete a review. Only the author's delete takes effect; anyone else's
    /// attempt affects no rows and returns false.
    pub async fn delete(&self, review_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM reviews
            WHERE review_id = $1 AND user_id = $2
            "#,
        )
        .bind(review_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .context("Failed to delete review")?;

        if result.rows_affected() > 0 {
            info!("Deleted review {}", review_id);
        }

        Ok(result.rows_affected() > 0)
    }
}
