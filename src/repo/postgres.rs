//! PostgreSQL-backed repository.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::repo::model::User;
use crate::repo::{AuthRepository, RepoError};

const CREATE_USERS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        user_id TEXT UNIQUE NOT NULL,
        email TEXT NOT NULL,
        username TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
"#;

#[derive(Debug, Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the `users` table if it does not exist.
    pub async fn ensure_schema(&self) -> Result<(), RepoError> {
        sqlx::query(CREATE_USERS_TABLE).execute(&self.pool).await?;
        Ok(())
    }

    pub async fn find_by_user_id(&self, user_id: &str) -> Result<Option<User>, RepoError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, user_id, email, username, created_at FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}

#[async_trait]
impl AuthRepository for PgAuthRepository {
    async fn sign_up_save(&self, user: &User) -> Result<(), RepoError> {
        let result = sqlx::query(
            "INSERT INTO users (id, user_id, email, username, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(user.id)
        .bind(&user.user_id)
        .bind(&user.email)
        .bind(&user.username)
        .bind(user.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                tracing::debug!(user_id = %user.user_id, "User saved");
                Ok(())
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(RepoError::Duplicate(user.user_id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn user_exists(&self, user_id: &str) -> Result<bool, RepoError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE user_id = $1)")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn ping(&self) -> Result<(), RepoError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
