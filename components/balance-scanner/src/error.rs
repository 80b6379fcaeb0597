use ledger_sdk::rpc::RpcError;
use thiserror::Error;

/// Coarse classification of [ScanError], for callers that branch on the
/// nature of a failure rather than on its details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Transport,
    RateLimit,
    RetryExhausted,
    IncompleteResult,
    Cancellation,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScanError {
    #[error("invalid number of blocks {0}, allowed range is 1-500")]
    InvalidBlockCount(u64),
    #[error("invalid block number {0}, expected positive value")]
    InvalidHeight(i64),
    #[error("unable to parse chain head `{0}`")]
    InvalidChainHead(String),
    #[error("failed to parse transaction value: {0}")]
    InvalidValue(String),
    #[error("no blocks provided")]
    NoBlocks,
    #[error("no transactions provided")]
    EmptyBlock,
    #[error("rpc call failed: {0}")]
    Transport(RpcError),
    #[error("rate limit exceeded")]
    RateLimited,
    #[error("failed to collect transactions for block {height}, no more attempts ({attempts} made)")]
    RetryExhausted { height: i64, attempts: u32 },
    #[error("failed to collect all blocks, expected {expected}, got {fetched}")]
    IncompleteResult {
        expected: u64,
        fetched: u64,
        failures: Vec<(i64, ScanError)>,
    },
    #[error("operation cancelled before completion")]
    Cancelled,
}

impl ScanError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScanError::InvalidBlockCount(_)
            | ScanError::InvalidHeight(_)
            | ScanError::InvalidChainHead(_)
            | ScanError::InvalidValue(_)
            | ScanError::NoBlocks
            | ScanError::EmptyBlock => ErrorKind::Validation,
            ScanError::Transport(_) => ErrorKind::Transport,
            ScanError::RateLimited => ErrorKind::RateLimit,
            ScanError::RetryExhausted { .. } => ErrorKind::RetryExhausted,
            ScanError::IncompleteResult { .. } => ErrorKind::IncompleteResult,
            ScanError::Cancelled => ErrorKind::Cancellation,
        }
    }
}

impl From<RpcError> for ScanError {
    fn from(error: RpcError) -> Self {
        match error {
            RpcError::RateLimited => ScanError::RateLimited,
            other => ScanError::Transport(other),
        }
    }
}
