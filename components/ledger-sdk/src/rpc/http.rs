use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode};
use serde_json::Value;

use super::{JsonRpcRequest, JsonRpcResponse, RpcError, RpcTransport, JSON_RPC_VERSION};

pub fn build_http_client(timeout: Duration) -> Result<HttpClient, String> {
    HttpClient::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| format!("unable to build http client: {e}"))
}

/// JSON-RPC 2.0 over HTTP POST. The api token is appended to the endpoint
/// path, which is how hosted node providers authenticate requests.
pub struct JsonRpcClient {
    http_client: HttpClient,
    endpoint: String,
}

impl JsonRpcClient {
    pub fn new(endpoint_url: &str, api_token: &str, timeout: Duration) -> Result<Self, String> {
        let endpoint = build_endpoint(endpoint_url, api_token)?;
        Ok(JsonRpcClient {
            http_client: build_http_client(timeout)?,
            endpoint,
        })
    }
}

fn build_endpoint(endpoint_url: &str, api_token: &str) -> Result<String, String> {
    if endpoint_url.is_empty() {
        return Err("empty URL provided".to_string());
    }
    if api_token.is_empty() {
        return Err("empty token provided".to_string());
    }
    Ok(format!(
        "{}/{}",
        endpoint_url.trim_end_matches('/'),
        api_token
    ))
}

#[async_trait]
impl RpcTransport for JsonRpcClient {
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, RpcError> {
        let body = JsonRpcRequest {
            jsonrpc: JSON_RPC_VERSION,
            method,
            params,
            id: 1,
        };
        let response = self
            .http_client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| RpcError::Request(e.to_string()))?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::TOO_MANY_REQUESTS => return Err(RpcError::RateLimited),
            status => return Err(RpcError::Status(status.as_u16())),
        }

        let response: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| RpcError::Decode(e.to_string()))?;
        response.into_result()
    }
}
