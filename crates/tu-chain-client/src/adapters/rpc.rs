//! HTTP JSON-RPC ledger adapter
//!
//! Implements `LedgerNetwork` against a cluster's JSON-RPC endpoint.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::domain::{Blockhash, ChainClientError, Commitment, Pubkey, Signature, SignatureStatus};
use crate::ports::LedgerNetwork;

/// JSON-RPC request envelope
#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a, T> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: T,
}

/// JSON-RPC response envelope
#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

/// JSON-RPC error object
#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

/// `{ context, value }` wrapper used by most read methods
#[derive(Debug, Deserialize)]
struct WithContext<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
struct AccountInfo {
    /// `[payload, encoding]`
    data: (String, String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LatestBlockhash {
    blockhash: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcSignatureStatus {
    #[serde(default)]
    err: Option<Value>,
    #[serde(default)]
    confirmation_status: Option<Commitment>,
}

/// Turn a JSON-RPC error into the client's taxonomy.
///
/// Preflight failures carry the runtime error and program logs in `data`.
fn rejection_from_rpc(error: JsonRpcError) -> ChainClientError {
    let data = error.data.unwrap_or(Value::Null);
    let logs = data
        .get("logs")
        .and_then(Value::as_array)
        .map(|lines| {
            lines
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let message = match data.get("err") {
        Some(err) if !err.is_null() => format!("{}: {}", error.message, err),
        _ => error.message,
    };
    ChainClientError::from_rejection(Some(error.code), message, logs)
}

fn decode_account(info: AccountInfo) -> Result<Vec<u8>, ChainClientError> {
    let (payload, encoding) = info.data;
    if encoding != "base64" {
        return Err(ChainClientError::Decode(format!(
            "unexpected account encoding '{encoding}'"
        )));
    }
    BASE64
        .decode(payload)
        .map_err(|e| ChainClientError::Decode(e.to_string()))
}

fn to_status(status: RpcSignatureStatus) -> SignatureStatus {
    SignatureStatus {
        // Nodes omit the level for rooted transactions.
        confirmation: status.confirmation_status.or(Some(Commitment::Finalized)),
        err: status.err.filter(|e| !e.is_null()).map(|e| e.to_string()),
    }
}

/// Ledger network over HTTP JSON-RPC.
pub struct HttpRpcNetwork {
    client: Client,
    endpoint: String,
    request_id: AtomicU64,
}

impl HttpRpcNetwork {
    /// Create a client for `endpoint`.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ChainClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| ChainClientError::TransportError(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            request_id: AtomicU64::new(1),
        })
    }

    /// Create a client from the endpoint and timeout in `config`.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ChainClientError> {
        Self::new(config.endpoint.clone(), config.request_timeout())
    }

    fn next_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Call a JSON-RPC method.
    async fn call<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> Result<R, ChainClientError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.next_id(),
            method,
            params,
        };
        debug!("[tu-client] RPC {} -> {}", method, self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    ChainClientError::TransportError(format!("Cannot connect to {}", self.endpoint))
                } else {
                    ChainClientError::TransportError(e.to_string())
                }
            })?;

        let status = response.status();
        let rpc_response: JsonRpcResponse<R> = response.json().await.map_err(|e| {
            ChainClientError::TransportError(format!("HTTP {status}: invalid JSON-RPC response: {e}"))
        })?;

        if let Some(error) = rpc_response.error {
            warn!("[tu-client] RPC {} failed: {} {}", method, error.code, error.message);
            return Err(rejection_from_rpc(error));
        }

        rpc_response
            .result
            .ok_or_else(|| ChainClientError::TransportError(format!("{method}: missing result")))
    }
}

#[async_trait]
impl LedgerNetwork for HttpRpcNetwork {
    async fn get_account(
        &self,
        address: &Pubkey,
        commitment: Commitment,
    ) -> Result<Option<Vec<u8>>, ChainClientError> {
        let response: WithContext<Option<AccountInfo>> = self
            .call(
                "getAccountInfo",
                json!([address.to_string(), { "encoding": "base64", "commitment": commitment }]),
            )
            .await?;
        response.value.map(decode_account).transpose()
    }

    async fn get_recent_blockhash(&self, commitment: Commitment) -> Result<Blockhash, ChainClientError> {
        let response: WithContext<LatestBlockhash> = self
            .call("getLatestBlockhash", json!([{ "commitment": commitment }]))
            .await?;
        response.value.blockhash.parse().map_err(|_| {
            ChainClientError::Decode(format!("bad blockhash '{}'", response.value.blockhash))
        })
    }

    async fn send_transaction(
        &self,
        wire: Vec<u8>,
        preflight: Commitment,
    ) -> Result<Signature, ChainClientError> {
        let signature: String = self
            .call(
                "sendTransaction",
                json!([BASE64.encode(wire), { "encoding": "base64", "preflightCommitment": preflight }]),
            )
            .await?;
        signature
            .parse()
            .map_err(|_| ChainClientError::Decode(format!("bad signature '{signature}'")))
    }

    async fn get_signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<SignatureStatus>, ChainClientError> {
        let response: WithContext<Vec<Option<RpcSignatureStatus>>> = self
            .call(
                "getSignatureStatuses",
                json!([[signature.to_string()], { "searchTransactionHistory": true }]),
            )
            .await?;
        Ok(response.value.into_iter().next().flatten().map(to_status))
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rpc_error(value: Value) -> JsonRpcError {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_request_envelope() {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: 7,
            method: "getLatestBlockhash",
            params: json!([{ "commitment": Commitment::Processed }]),
        };
        let encoded = serde_json::to_value(&request).unwrap();
        assert_eq!(encoded["method"], "getLatestBlockhash");
        assert_eq!(encoded["params"][0]["commitment"], "processed");
    }

    #[test]
    fn test_missing_account_is_none() {
        let response: JsonRpcResponse<WithContext<Option<AccountInfo>>> = serde_json::from_value(
            json!({ "jsonrpc": "2.0", "id": 1, "result": { "context": { "slot": 5 }, "value": null } }),
        )
        .unwrap();
        assert!(response.result.unwrap().value.is_none());
    }

    #[test]
    fn test_account_payload_decodes() {
        let info: AccountInfo = serde_json::from_value(json!({
            "data": [BASE64.encode([1u8, 2, 3]), "base64"],
            "lamports": 1,
            "owner": "11111111111111111111111111111111",
            "executable": false,
            "rentEpoch": 0
        }))
        .unwrap();
        assert_eq!(decode_account(info).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_account_wrong_encoding() {
        let info = AccountInfo {
            data: ("AQID".into(), "base58".into()),
        };
        assert!(matches!(decode_account(info), Err(ChainClientError::Decode(_))));
    }

    #[test]
    fn test_preflight_already_in_use() {
        let error = rpc_error(json!({
            "code": -32002,
            "message": "Transaction simulation failed: Error processing Instruction 0: custom program error: 0x0",
            "data": {
                "err": { "InstructionError": [0, { "Custom": 0 }] },
                "logs": [
                    "Program 11111111111111111111111111111111 invoke [2]",
                    "Allocate: account Address { address: 9xQe, base: None } already in use"
                ]
            }
        }));
        assert!(matches!(
            rejection_from_rpc(error),
            ChainClientError::AlreadyInitialized(_)
        ));
    }

    #[test]
    fn test_preflight_fee_payer_unfunded() {
        let error = rpc_error(json!({
            "code": -32002,
            "message": "Transaction simulation failed: Attempt to debit an account but found no record of a prior credit.",
            "data": { "err": "AccountNotFound", "logs": [] }
        }));
        assert!(matches!(
            rejection_from_rpc(error),
            ChainClientError::InsufficientFunds(_)
        ));
    }

    #[test]
    fn test_other_rejection_keeps_details() {
        let error = rpc_error(json!({
            "code": -32602,
            "message": "invalid transaction: Transaction failed to sanitize accounts offsets correctly"
        }));
        match rejection_from_rpc(error) {
            ChainClientError::Rejected { code, message, logs } => {
                assert_eq!(code, Some(-32602));
                assert!(message.contains("sanitize"));
                assert!(logs.is_empty());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_signature_status_levels() {
        let landed: RpcSignatureStatus = serde_json::from_value(json!({
            "slot": 10, "confirmations": 0, "err": null, "confirmationStatus": "confirmed"
        }))
        .unwrap();
        let status = to_status(landed);
        assert_eq!(status.confirmation, Some(Commitment::Confirmed));
        assert!(status.err.is_none());

        let failed: RpcSignatureStatus = serde_json::from_value(json!({
            "slot": 10, "confirmations": null, "err": { "InstructionError": [0, "Custom"] }
        }))
        .unwrap();
        let status = to_status(failed);
        assert_eq!(status.confirmation, Some(Commitment::Finalized));
        assert!(status.err.is_some());
    }

    #[test]
    fn test_endpoint_reported() {
        let network = HttpRpcNetwork::from_config(&ClientConfig::for_testing()).unwrap();
        assert_eq!(network.endpoint(), "http://127.0.0.1:8899");
    }
}
