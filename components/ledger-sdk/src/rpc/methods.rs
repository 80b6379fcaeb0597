//! Typed wrappers over the two node methods the scanner relies on.

use ledger_types::Block;
use serde_json::json;

use crate::quantity::encode_quantity;

use super::{RpcError, RpcTransport};

pub const METHOD_BLOCK_NUMBER: &str = "eth_blockNumber";
pub const METHOD_GET_BLOCK_BY_NUMBER: &str = "eth_getBlockByNumber";

/// Returns the chain head height as reported by the node, still encoded.
pub async fn get_chain_head<T>(transport: &T) -> Result<String, RpcError>
where
    T: RpcTransport + ?Sized,
{
    let result = transport.call(METHOD_BLOCK_NUMBER, vec![]).await?;
    match result.as_str() {
        Some(height) => Ok(height.to_string()),
        None => Err(RpcError::Decode(format!(
            "expected a quantity string, got {result}"
        ))),
    }
}

/// Retrieves the block at `height` with full transaction objects.
pub async fn get_block_by_height<T>(transport: &T, height: u64) -> Result<Block, RpcError>
where
    T: RpcTransport + ?Sized,
{
    let params = vec![json!(encode_quantity(height)), json!(true)];
    let result = transport.call(METHOD_GET_BLOCK_BY_NUMBER, params).await?;
    serde_json::from_value(result).map_err(|e| RpcError::Decode(e.to_string()))
}
