//! User persistence.
//!
//! [`AuthRepository`] is the seam handlers and the RPC service depend on;
//! [`PgAuthRepository`] is the production implementation.

pub mod model;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

pub use model::User;
pub use postgres::PgAuthRepository;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("user `{0}` already exists")]
    Duplicate(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait AuthRepository: Send + Sync {
    /// Persist a newly signed-up user.
    async fn sign_up_save(&self, user: &User) -> Result<(), RepoError>;

    async fn user_exists(&self, user_id: &str) -> Result<bool, RepoError>;

    /// Cheap round trip to the backing store.
    async fn ping(&self) -> Result<(), RepoError>;
}
