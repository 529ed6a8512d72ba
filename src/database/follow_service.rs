//! Follow Service - the user social graph.
//!
//! A plain many-to-many join on users. Cascade on account deletion is handled
//! by the schema, not here.

use anyhow::{bail, Context, Result};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::user_service::UserRow;

/// Service for follow relationships
#[derive(Clone, Debug)]
pub struct FollowService {
    pool: PgPool,
}

impl FollowService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Follow a user. Returns false when the follow already existed.
    pub async fn follow(&self, follower_id: Uuid, followed_id: Uuid) -> Result<bool> {
        if follower_id == followed_id {
            bail!("Users cannot follow themselves");
        }

        let result = sqlx::query(
            r#"
            INSERT INTO follows (follower_id, followed_id, created_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (follower_id, followed_id) DO NOTHING
            "#,
        )
        .bind(follower_id)
        .bind(followed_id)
        .execute(&self.pool)
        .await
        .context("Failed to add follow")?;

        if result.rows_affected() > 0 {
            info!("User {} followed {}", follower_id, followed_id);
        }

        Ok(result.rows_affected() > 0)
    }

    /// Unfollow a user. Returns false when there was nothing to remove.
    pub async fn unfollow(&self, follower_id: Uuid, followed_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM follows
            WHERE follower_id = $1 AND followed_id = $2
            "#,
        )
        .bind(follower_id)
        .bind(followed_id)
        .execute(&self.pool)
        .await
        .context("Failed to remove follow")?;

        if result.rows_affected() > 0 {
            info!("User {} unfollowed {}", follower_id, followed_id);
        }

        Ok(result.rows_affected() > 0)
    }

    /// Users following the given user
    pub async fn followers(&self, user_id: Uuid) -> Result<Vec<UserRow>> {
        sqlx::query_as::<_, UserRow>(
            r#"
            SELECT u.user_id, u.username, u.password_hash, u.email, u.first_name, u.last_name, u.created_at
            FROM users u
            JOIN follows f ON f.follower_id = u.user_id
            WHERE f.followed_id = $1
            ORDER BY u.username ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list followers")
    }

    /// Users the given user follows
    pub async fn following(&self, user_id: Uuid) -> Result<Vec<UserRow>> {
        sqlx::query_as::<_, UserRow>(
            r#"
            SELECT u.user_id, u.username, u.password_hash, u.email, u.first_name, u.last_name, u.created_at
            FROM users u
            JOIN follows f ON f.followed_id = u.user_id
            WHERE f.follower_id = $1
            ORDER BY u.username ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list following")
    }
}
