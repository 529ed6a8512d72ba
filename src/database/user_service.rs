//! User Service - account registration, authentication, and lookup.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

/// User account record. The password hash never serializes out.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRow {
    pub user_id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// Fields for registering a user
#[derive(Debug, Clone)]
pub struct NewUserFields {
    pub username: String,
    pub password: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// Service for user accounts
#[derive(Clone, Debug)]
pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Register a user with a bcrypt-hashed password. Username and email
    /// uniqueness are schema-enforced; violations propagate as errors.
    pub async fn register(&self, fields: &NewUserFields) -> Result<UserRow> {
        let password_hash = bcrypt::hash(&fields.password, bcrypt::DEFAULT_COST)
            .context("Failed to hash password")?;
        let user_id = Uuid::new_v4();

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (user_id, username, password_hash, email, first_name, last_name, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            RETURNING user_id, username, password_hash, email, first_name, last_name, created_at
            "#,
        )
        .bind(user_id)
        .bind(&fields.username)
        .bind(&password_hash)
        .bind(&fields.email)
        .bind(&fields.first_name)
        .bind(&fields.last_name)
        .fetch_one(&self.pool)
        .await
        .context("Failed to register user")?;

        info!("Registered user {} '{}'", row.user_id, row.username);
        Ok(row)
    }

    /// Validate credentials. Returns `Ok(None)` for an unknown username or a
    /// wrong password; errors are reserved for infrastructure failures.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Option<UserRow>> {
        let user = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT user_id, username, password_hash, email, first_name, last_name, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to look up user for authentication")?;

        match user {
            Some(user) => {
                let valid = bcrypt::verify(password, &user.password_hash)
                    .context("Failed to verify password")?;
                Ok(valid.then_some(user))
            }
            None => Ok(None),
        }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, user_id: Uuid) -> Result<Option<UserRow>> {
        sqlx::query_as::<_, UserRow>(
            r#"
            SELECT user_id, username, password_hash, email, first_name, last_name, created_at
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get user by ID")
    }

    /// List users, optionally filtered by a username substring
    pub async fn search(&self, query: Option<&str>) -> Result<Vec<UserRow>> {
        match query {
            Some(q) if !q.is_empty() => {
                sqlx::query_as::<_, UserRow>(
                    r#"
                    SELECT user_id, username, password_hash, email, first_name, last_name, created_at
                    FROM users
                    WHERE username LIKE $1
                    ORDER BY username ASC
                    "#,
                )
                .bind(format!("%{}%", q))
                .fetch_all(&self.pool)
                .await
                .context("Failed to search users")
            }
            _ => {
                sqlx::query_as::<_, UserRow>(
                    r#"
                    SELECT user_id, username, password_hash, email, first_name, last_name, created_at
                    FROM users
                    ORDER BY username ASC
                    "#,
                )
                .fetch_all(&self.pool)
                .await
                .context("Failed to list users")
            }
        }
    }
}
