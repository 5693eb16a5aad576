//! Route handlers.
//!
//! - `GET /health`: database reachability as JSON
//! - `POST /UserRpcMethod/UserExistenceCall`: proto3 in, proto3 out

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json,
};
use prost::Message;

use crate::http::server::HttpServer;
use crate::repo::AuthRepository;
use crate::rpc::{RpcError, UserExistenceReq, UserRpcMethod, USER_EXISTENCE_CALL_PATH};

pub const HEALTH_PATH: &str = "/health";

/// Content type of protobuf request and response bodies.
pub const PROTOBUF_CONTENT_TYPE: &str = "application/x-protobuf";

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub app_name: Arc<str>,
    pub repo: Arc<dyn AuthRepository>,
    pub rpc: Arc<dyn UserRpcMethod>,
}

/// Register the service routes on `server`.
pub fn register(server: HttpServer, state: AppState) -> HttpServer {
    server
        .route(HEALTH_PATH, get(health).with_state(state.clone()))
        .route(
            USER_EXISTENCE_CALL_PATH,
            post(user_existence_call).with_state(state),
        )
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match state.repo.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "ok",
                "app": &*state.app_name,
                "database": "up",
            })),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Health check database ping failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "status": "degraded",
                    "app": &*state.app_name,
                    "database": "down",
                })),
            )
        }
    }
}

async fn user_existence_call(State(state): State<AppState>, body: Bytes) -> Response {
    match call_user_existence(&state, body).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, PROTOBUF_CONTENT_TYPE)], bytes).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn call_user_existence(state: &AppState, body: Bytes) -> Result<Vec<u8>, RpcError> {
    let request = UserExistenceReq::decode(body)?;
    let response = state.rpc.user_existence_call(request).await?;
    Ok(response.encode_to_vec())
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = match &self {
            RpcError::Decode(e) => {
                tracing::debug!(error = %e, "Rejected malformed UserExistenceReq");
                StatusCode::BAD_REQUEST
            }
            RpcError::Repository(e) => {
                tracing::error!(error = %e, "UserExistenceCall failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, self.to_string()).into_response()
    }
}
