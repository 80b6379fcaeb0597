mod http;
pub mod methods;

use std::error::Error as StdError;
use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

pub use http::{build_http_client, JsonRpcClient};

pub const JSON_RPC_VERSION: &str = "2.0";

/// Errors surfaced by a [RpcTransport].
#[derive(Debug, Clone, PartialEq)]
pub enum RpcError {
    /// The node answered "too many requests" (HTTP 429).
    RateLimited,
    /// Any other non-200 HTTP status.
    Status(u16),
    /// The request could not be sent or the connection dropped.
    Request(String),
    /// The response body is not the JSON we expected.
    Decode(String),
    /// The node answered with a JSON-RPC error object.
    Rpc { code: i64, message: String },
    /// The node answered with a `null` result.
    MissingResult,
}

impl RpcError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, RpcError::RateLimited)
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RpcError::RateLimited => write!(f, "rate limit exceeded (429)"),
            RpcError::Status(code) => write!(f, "invalid response code: {}", code),
            RpcError::Request(msg) => write!(f, "unable to send request ({})", msg),
            RpcError::Decode(msg) => write!(f, "unable to decode response ({})", msg),
            RpcError::Rpc { code, message } => write!(f, "rpc error {}: {}", code, message),
            RpcError::MissingResult => write!(f, "empty result"),
        }
    }
}

impl StdError for RpcError {}

/// Request/response channel to a ledger node. Implementations are shared
/// between concurrent tasks, hence `Send + Sync`.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, RpcError>;
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest<'a> {
    pub jsonrpc: &'a str,
    pub method: &'a str,
    pub params: Vec<Value>,
    pub id: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<JsonRpcErrorObject>,
}

impl JsonRpcResponse {
    pub fn into_result(self) -> Result<Value, RpcError> {
        if let Some(error) = self.error {
            return Err(RpcError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        self.result.ok_or(RpcError::MissingResult)
    }
}
