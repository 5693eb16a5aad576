//! `UserRpcMethod` service.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::observability::metrics;
use crate::repo::{AuthRepository, RepoError};
use crate::rpc::messages::{UserExistenceReq, UserExistenceResp};

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("malformed request: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error(transparent)]
    Repository(#[from] RepoError),
}

#[async_trait]
pub trait UserRpcMethod: Send + Sync {
    async fn user_existence_call(
        &self,
        request: UserExistenceReq,
    ) -> Result<UserExistenceResp, RpcError>;
}

/// Answers existence checks from the user repository.
pub struct UserExistenceService {
    repo: Arc<dyn AuthRepository>,
}

impl UserExistenceService {
    pub fn new(repo: Arc<dyn AuthRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl UserRpcMethod for UserExistenceService {
    async fn user_existence_call(
        &self,
        request: UserExistenceReq,
    ) -> Result<UserExistenceResp, RpcError> {
        if request.user_id.is_empty() {
            metrics::record_rpc_call("UserExistenceCall", "empty");
            return Ok(UserExistenceResp { status: false });
        }

        match self.repo.user_exists(&request.user_id).await {
            Ok(status) => {
                metrics::record_rpc_call("UserExistenceCall", "ok");
                tracing::debug!(user_id = %request.user_id, status, "User existence checked");
                Ok(UserExistenceResp { status })
            }
            Err(e) => {
                metrics::record_rpc_call("UserExistenceCall", "error");
                Err(e.into())
            }
        }
    }
}
