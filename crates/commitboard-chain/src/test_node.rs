//! In-process JSON-RPC node for exercising provider paths in tests.
//!
//! Serves the handful of `eth_*` methods the indexer uses from in-memory
//! state and records every method it is asked for. Anything else gets a
//! `-32601` error object.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use alloy::rpc::types::Log;
use alloy_primitives::{Address, B256, Bytes, keccak256};
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;

/// How the node answers `eth_getTransactionReceipt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptMode {
    /// Mined with status 1.
    Success,
    /// Mined with status 0.
    Reverted,
    /// Never mined: the receipt is always `null`.
    Pending,
}

/// In-memory node state.
#[derive(Debug)]
pub struct TestNode {
    chain_id: u64,
    head: AtomicU64,
    deployed_at: AtomicU64,
    logs: Mutex<Vec<Log>>,
    call_result: Mutex<Bytes>,
    receipts: Mutex<ReceiptMode>,
    calls: Mutex<Vec<String>>,
    raw_transactions: Mutex<Vec<Bytes>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn quantity(value: u64) -> Value {
    Value::String(format!("{value:#x}"))
}

fn parse_quantity(value: &Value) -> Option<u64> {
    let hex = value.as_str()?.strip_prefix("0x")?;
    u64::from_str_radix(hex, 16).ok()
}

impl TestNode {
    /// A node on `chain_id` at block 0 with the contract deployed at
    /// genesis and no logs.
    pub const fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            head: AtomicU64::new(0),
            deployed_at: AtomicU64::new(0),
            logs: Mutex::new(Vec::new()),
            call_result: Mutex::new(Bytes::new()),
            receipts: Mutex::new(ReceiptMode::Success),
            calls: Mutex::new(Vec::new()),
            raw_transactions: Mutex::new(Vec::new()),
        }
    }

    /// Start serving on an ephemeral local port.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the listener cannot bind.
    pub async fn spawn(self) -> std::io::Result<(Arc<Self>, String)> {
        let node = Arc::new(self);
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let url = format!("http://{}", listener.local_addr()?);
        let app = Router::new()
            .route("/", post(handle))
            .with_state(Arc::clone(&node));
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Ok((node, url))
    }

    /// Move the chain head.
    pub fn set_head(&self, block: u64) {
        self.head.store(block, Ordering::SeqCst);
    }

    /// First block with contract code.
    pub fn set_deployed_at(&self, block: u64) {
        self.deployed_at.store(block, Ordering::SeqCst);
    }

    /// Add logs to the chain.
    pub fn push_logs(&self, logs: impl IntoIterator<Item = Log>) {
        lock(&self.logs).extend(logs);
    }

    /// Return data for every `eth_call`.
    pub fn set_call_result(&self, data: Bytes) {
        *lock(&self.call_result) = data;
    }

    /// Change how receipts are answered.
    pub fn set_receipts(&self, mode: ReceiptMode) {
        *lock(&self.receipts) = mode;
    }

    /// Number of times `method` was called.
    pub fn count(&self, method: &str) -> usize {
        lock(&self.calls).iter().filter(|m| *m == method).count()
    }

    /// Raw transactions received, in order.
    pub fn raw_transactions(&self) -> Vec<Bytes> {
        lock(&self.raw_transactions).clone()
    }

    fn answer(&self, method: &str, params: &Value) -> Option<Value> {
        let param = |i: usize| params.get(i).cloned().unwrap_or(Value::Null);
        match method {
            "eth_chainId" => Some(quantity(self.chain_id)),
            "eth_blockNumber" => Some(quantity(self.head.load(Ordering::SeqCst))),
            "eth_getBlockByNumber" => Some(Value::Null),
            "eth_getCode" => {
                let block = parse_quantity(&param(1)).unwrap_or(u64::MAX);
                let deployed = block >= self.deployed_at.load(Ordering::SeqCst);
                Some(json!(if deployed { "0x6080" } else { "0x" }))
            }
            "eth_getLogs" => {
                let filter = param(0);
                let from = filter.get("fromBlock").and_then(parse_quantity).unwrap_or(0);
                let to = filter
                    .get("toBlock")
                    .and_then(parse_quantity)
                    .unwrap_or(u64::MAX);
                let logs: Vec<Log> = lock(&self.logs)
                    .iter()
                    .filter(|log| log.block_number.is_some_and(|b| b >= from && b <= to))
                    .cloned()
                    .collect();
                serde_json::to_value(logs).ok()
            }
            "eth_call" => Some(json!(lock(&self.call_result).clone())),
            "eth_sendRawTransaction" => {
                let raw: Bytes = serde_json::from_value(param(0)).ok()?;
                let tx_hash = keccak256(&raw);
                lock(&self.raw_transactions).push(raw);
                Some(json!(tx_hash))
            }
            "eth_getTransactionReceipt" => {
                let tx_hash: B256 = serde_json::from_value(param(0)).ok()?;
                Some(match *lock(&self.receipts) {
                    ReceiptMode::Pending => Value::Null,
                    ReceiptMode::Success => receipt(tx_hash, true),
                    ReceiptMode::Reverted => receipt(tx_hash, false),
                })
            }
            _ => None,
        }
    }
}

fn receipt(tx_hash: B256, success: bool) -> Value {
    json!({
        "type": "0x2",
        "status": if success { "0x1" } else { "0x0" },
        "cumulativeGasUsed": "0x5208",
        "logs": [],
        "logsBloom": format!("0x{}", "0".repeat(512)),
        "transactionHash": tx_hash,
        "transactionIndex": "0x0",
        "blockHash": B256::repeat_byte(0xbb),
        "blockNumber": "0x64",
        "gasUsed": "0x5208",
        "effectiveGasPrice": "0x3b9aca00",
        "from": Address::ZERO,
        "to": Address::ZERO,
        "contractAddress": null
    })
}

async fn handle(State(node): State<Arc<TestNode>>, Json(request): Json<Value>) -> Json<Value> {
    let id = request.get("id").cloned().unwrap_or(Value::Null);
    let method = request
        .get("method")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();
    let params = request.get("params").cloned().unwrap_or(Value::Null);
    lock(&node.calls).push(method.clone());

    Json(match node.answer(&method, &params) {
        Some(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
        None => json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": -32601, "message": format!("{method} not supported") }
        }),
    })
}
