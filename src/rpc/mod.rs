//! RPC contract: the `UserRpcMethod` service and its proto3 messages.
//!
//! Messages are served over HTTP by `http::handlers` with
//! `content-type: application/x-protobuf`.

pub mod messages;
pub mod service;

pub use messages::{UserExistenceReq, UserExistenceResp, USER_EXISTENCE_CALL_PATH};
pub use service::{RpcError, UserExistenceService, UserRpcMethod};
