use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use ledger_sdk::quantity::{encode_quantity, parse_quantity_u64};
use ledger_sdk::rpc::methods::{METHOD_BLOCK_NUMBER, METHOD_GET_BLOCK_BY_NUMBER};
use ledger_sdk::rpc::{RpcError, RpcTransport};
use ledger_types::{Block, Transaction};
use serde_json::{json, Value};

pub struct TestTransactionBuilder {
    from: String,
    to: Option<String>,
    value: String,
}

impl TestTransactionBuilder {
    pub fn new() -> Self {
        TestTransactionBuilder {
            from: "0x1".to_string(),
            to: Some("0x2".to_string()),
            value: "0".to_string(),
        }
    }

    pub fn from(mut self, from: &str) -> Self {
        self.from = from.to_string();
        self
    }

    pub fn to(mut self, to: &str) -> Self {
        self.to = Some(to.to_string());
        self
    }

    pub fn contract_creation(mut self) -> Self {
        self.to = None;
        self
    }

    pub fn value(mut self, value: &str) -> Self {
        self.value = value.to_string();
        self
    }

    pub fn build(self) -> Transaction {
        Transaction {
            from: self.from,
            to: self.to,
            value: self.value,
        }
    }
}

pub struct TestBlockBuilder {
    number: Option<String>,
    transactions: Vec<Transaction>,
}

impl TestBlockBuilder {
    pub fn new() -> Self {
        TestBlockBuilder {
            number: None,
            transactions: vec![],
        }
    }

    pub fn height(mut self, height: u64) -> Self {
        self.number = Some(encode_quantity(height));
        self
    }

    pub fn add_transaction(mut self, transaction: Transaction) -> Self {
        self.transactions.push(transaction);
        self
    }

    pub fn transfer(self, from: &str, to: &str, value: &str) -> Self {
        self.add_transaction(
            TestTransactionBuilder::new()
                .from(from)
                .to(to)
                .value(value)
                .build(),
        )
    }

    pub fn build(self) -> Block {
        Block {
            number: self.number,
            transactions: self.transactions,
        }
    }
}

/// Scripted node. Unless told otherwise, every height answers with a block
/// holding a single transfer of 1 from `0xa` to `0xb`.
pub struct MockTransport {
    head: Result<Value, RpcError>,
    blocks: HashMap<u64, Block>,
    scripted_errors: Mutex<HashMap<u64, VecDeque<RpcError>>>,
    hanging: HashSet<u64>,
    latency: Duration,
    block_calls: Mutex<HashMap<u64, u32>>,
    head_calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockTransport {
    pub fn new(head: u64) -> Self {
        MockTransport {
            head: Ok(json!(encode_quantity(head))),
            blocks: HashMap::new(),
            scripted_errors: Mutex::new(HashMap::new()),
            hanging: HashSet::new(),
            latency: Duration::from_millis(0),
            block_calls: Mutex::new(HashMap::new()),
            head_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn head_response(mut self, response: Result<Value, RpcError>) -> Self {
        self.head = response;
        self
    }

    pub fn block(mut self, height: u64, block: Block) -> Self {
        self.blocks.insert(height, block);
        self
    }

    /// Answers the first calls for `height` with `errors`, in order, then succeeds.
    pub fn fail_block(self, height: u64, errors: Vec<RpcError>) -> Self {
        self.scripted_errors
            .lock()
            .unwrap()
            .insert(height, errors.into_iter().collect());
        self
    }

    /// Calls for `height` never complete.
    pub fn hang_block(mut self, height: u64) -> Self {
        self.hanging.insert(height);
        self
    }

    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn block_calls(&self, height: u64) -> u32 {
        *self.block_calls.lock().unwrap().get(&height).unwrap_or(&0)
    }

    pub fn total_block_calls(&self) -> u32 {
        self.block_calls.lock().unwrap().values().sum()
    }

    pub fn head_calls(&self) -> usize {
        self.head_calls.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    async fn get_block(&self, height: u64) -> Result<Value, RpcError> {
        *self.block_calls.lock().unwrap().entry(height).or_insert(0) += 1;
        if self.hanging.contains(&height) {
            std::future::pending::<()>().await;
        }
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let scripted = self
            .scripted_errors
            .lock()
            .unwrap()
            .get_mut(&height)
            .and_then(|errors| errors.pop_front());
        if let Some(error) = scripted {
            return Err(error);
        }
        let block = match self.blocks.get(&height) {
            Some(block) => block.clone(),
            None => TestBlockBuilder::new()
                .height(height)
                .transfer("0xa", "0xb", "1")
                .build(),
        };
        serde_json::to_value(block).map_err(|e| RpcError::Decode(e.to_string()))
    }
}

#[async_trait]
impl RpcTransport for MockTransport {
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, RpcError> {
        match method {
            METHOD_BLOCK_NUMBER => {
                self.head_calls.fetch_add(1, Ordering::SeqCst);
                self.head.clone()
            }
            METHOD_GET_BLOCK_BY_NUMBER => {
                let height = params
                    .first()
                    .and_then(|p| p.as_str())
                    .and_then(|p| parse_quantity_u64(p).ok())
                    .ok_or_else(|| RpcError::Rpc {
                        code: -32602,
                        message: "invalid block number".into(),
                    })?;
                let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                self.peak_in_flight.fetch_max(current, Ordering::SeqCst);
                let result = self.get_block(height).await;
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                result
            }
            _ => Err(RpcError::Rpc {
                code: -32601,
                message: format!("method {method} not found"),
            }),
        }
    }
}
