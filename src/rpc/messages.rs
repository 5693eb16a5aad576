//! `UserRpcMethod` wire messages (proto3).
//!
//! ```text
//! service UserRpcMethod {
//!   rpc UserExistenceCall(UserExistenceReq) returns (UserExistenceResp);
//! }
//! message UserExistenceReq  { string UserId = 1; }
//! message UserExistenceResp { bool status = 1; }
//! ```

/// Service name on the wire.
pub const SERVICE_NAME: &str = "UserRpcMethod";

/// Route of the unary `UserExistenceCall`.
pub const USER_EXISTENCE_CALL_PATH: &str = "/UserRpcMethod/UserExistenceCall";

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UserExistenceReq {
    #[prost(string, tag = "1")]
    pub user_id: ::prost::alloc::string::String,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct UserExistenceResp {
    #[prost(bool, tag = "1")]
    pub status: bool,
}
