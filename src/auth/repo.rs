use anyhow::anyhow;
use async_trait::async_trait;
use sqlx::PgPool;

use crate::auth::repo_types::User;
use crate::error::StoreError;

/// Durable per-user record of credentials and the active session token.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    /// Find the user whose active token is exactly `token`.
    async fn find_by_active_token(&self, token: &str) -> Result<Option<User>, StoreError>;

    /// Insert a new user with no active token. Fails with
    /// [`StoreError::Duplicate`] if the username is taken.
    async fn create(&self, username: &str, password_hash: &str) -> Result<User, StoreError>;

    /// Persist `password_hash` and `active_token` for `user.username`.
    /// Last write wins.
    async fn save(&self, user: &User) -> Result<User, StoreError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT username, password_hash, active_token, created_at, updated_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_active_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT username, password_hash, active_token, created_at, updated_at
            FROM users
            WHERE active_token = $1
            LIMIT 1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn create(&self, username: &str, password_hash: &str) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash)
            VALUES ($1, $2)
            RETURNING username, password_hash, active_token, created_at, updated_at
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.db)
        .await?;
        Ok(user)
    }

    async fn save(&self, user: &User) -> Result<User, StoreError> {
        let saved = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET password_hash = $2, active_token = $3, updated_at = now()
            WHERE username = $1
            RETURNING username, password_hash, active_token, created_at, updated_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.active_token.as_deref())
        .fetch_optional(&self.db)
        .await?;
        saved.ok_or_else(|| StoreError::Backend(anyhow!("user {} no longer exists", user.username)))
    }
}
