//! JSON-RPC implementation of `ChainReader`.
//!
//! Uses plain `eth_call` / `eth_getTransactionReceipt` over HTTP; the
//! core only ever needs reads and receipt lookups, so no full provider
//! stack is pulled in.

use std::time::Duration;

use alloy::primitives::{Address, B256};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::error::{ChainError, ChainResult};
use crate::reader::{BoxFuture, ChainReader, ReceiptStatus, TxReceipt};

/// Default timeout for RPC requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct RpcRequest {
    jsonrpc: &'static str,
    id: u32,
    method: &'static str,
    params: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<serde_json::Value>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    transaction_hash: B256,
    status: String,
    block_number: String,
}

/// `ChainReader` backed by a JSON-RPC endpoint.
pub struct RpcChainReader {
    client: Client,
    rpc_url: String,
}

impl RpcChainReader {
    /// Create a reader for the given RPC endpoint.
    pub fn new(rpc_url: impl Into<String>) -> ChainResult<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| ChainError::Transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            rpc_url: rpc_url.into(),
        })
    }

    async fn request(
        &self,
        method: &'static str,
        params: serde_json::Value,
    ) -> ChainResult<serde_json::Value> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        };

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChainError::Transport(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChainError::Transport(format!("HTTP {status}: {body}")));
        }

        let body: RpcResponse = response
            .json()
            .await
            .map_err(|e| ChainError::Transport(format!("Failed to parse response: {e}")))?;

        if let Some(error) = body.error {
            warn!(method, code = error.code, message = %error.message, "RPC error");
            return Err(ChainError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        body.result
            .ok_or_else(|| ChainError::Transport("RPC response missing result".to_string()))
    }
}

fn parse_hex_bytes(value: &serde_json::Value) -> ChainResult<Vec<u8>> {
    let text = value
        .as_str()
        .ok_or_else(|| ChainError::Decode("expected hex string result".to_string()))?;
    hex::decode(text.trim_start_matches("0x"))
        .map_err(|e| ChainError::Decode(format!("invalid hex in result: {e}")))
}

fn parse_hex_u64(text: &str) -> ChainResult<u64> {
    u64::from_str_radix(text.trim_start_matches("0x"), 16)
        .map_err(|e| ChainError::Decode(format!("invalid hex number: {e}")))
}

impl ChainReader for RpcChainReader {
    fn call(&self, to: Address, data: Vec<u8>) -> BoxFuture<'_, ChainResult<Vec<u8>>> {
        Box::pin(async move {
            debug!(to = %to, data_len = data.len(), "eth_call");
            let params = json!([
                {
                    "to": format!("{to:#x}"),
                    "data": format!("0x{}", hex::encode(&data)),
                },
                "latest"
            ]);
            let result = self.request("eth_call", params).await?;
            parse_hex_bytes(&result)
        })
    }

    fn transaction_receipt(&self, tx_hash: B256) -> BoxFuture<'_, ChainResult<Option<TxReceipt>>> {
        Box::pin(async move {
            let params = json!([format!("{tx_hash:#x}")]);
            let result = self.request("eth_getTransactionReceipt", params).await?;

            if result.is_null() {
                return Ok(None);
            }

            let raw: RawReceipt = serde_json::from_value(result)
                .map_err(|e| ChainError::Decode(format!("invalid receipt: {e}")))?;

            let status = if parse_hex_u64(&raw.status)? == 1 {
                ReceiptStatus::Success
            } else {
                ReceiptStatus::Reverted
            };

            Ok(Some(TxReceipt {
                tx_hash: raw.transaction_hash,
                status,
                block_number: parse_hex_u64(&raw.block_number)?,
            }))
        })
    }
}
