use std::sync::Arc;
use std::time::Duration;

use config::ScanConfig;
use ledger_sdk::quantity::parse_quantity_u64;
use ledger_sdk::rpc::methods::{get_block_by_height, get_chain_head};
use ledger_sdk::rpc::RpcTransport;
use ledger_sdk::utils::Context;
use ledger_sdk::{try_debug, try_error, try_info, try_warn};
use ledger_types::{Block, MAX_BLOCKS_PER_SCAN};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::error::ScanError;

pub const DEFAULT_CONCURRENT_REQUESTS_LIMIT: usize = 40;
pub const DEFAULT_RATE_LIMIT_ATTEMPTS: u32 = 5;
pub const DEFAULT_RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(1);

/// How block retrieval behaves towards the node.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchPolicy {
    /// Upper bound on requests in flight at any time.
    pub concurrency: usize,
    /// Total attempts per height when the node answers with a rate limit.
    pub max_attempts: u32,
    /// Pause between two attempts on the same height.
    pub backoff: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        FetchPolicy {
            concurrency: DEFAULT_CONCURRENT_REQUESTS_LIMIT,
            max_attempts: DEFAULT_RATE_LIMIT_ATTEMPTS,
            backoff: DEFAULT_RATE_LIMIT_BACKOFF,
        }
    }
}

impl FetchPolicy {
    pub fn from_config(config: &ScanConfig) -> Self {
        FetchPolicy {
            concurrency: config.concurrency.clamp(1, MAX_BLOCKS_PER_SCAN as usize),
            max_attempts: config.max_attempts.max(1),
            backoff: config.backoff(),
        }
    }
}

/// Retrieves the most recent blocks of the chain.
///
/// Every height is fetched by its own task. Tasks are spawned eagerly but a
/// task only talks to the node while holding one of `concurrency` permits,
/// released as soon as the call returns, whatever its outcome. Rate limited
/// calls are retried per height; any other failure is final for that height.
/// A fetch either yields exactly the requested number of blocks or fails.
pub struct BlockFetcher<T: RpcTransport + ?Sized> {
    transport: Arc<T>,
    policy: FetchPolicy,
    ctx: Context,
}

impl<T> BlockFetcher<T>
where
    T: RpcTransport + ?Sized + 'static,
{
    pub fn new(transport: Arc<T>, policy: FetchPolicy, ctx: &Context) -> Self {
        BlockFetcher {
            transport,
            policy,
            ctx: ctx.clone(),
        }
    }

    /// Fetches the `n` blocks ending at the current chain head, in no
    /// particular order. Fails with [ScanError::Cancelled] as soon as `cancel`
    /// fires, abandoning in-flight and pending retrievals.
    pub async fn fetch_latest(
        &self,
        n: u64,
        cancel: &CancellationToken,
    ) -> Result<Vec<Block>, ScanError> {
        if n == 0 || n > MAX_BLOCKS_PER_SCAN {
            return Err(ScanError::InvalidBlockCount(n));
        }
        if cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }

        let chain_head = self.get_chain_head(cancel).await?;
        try_info!(self.ctx, "Last block: #{chain_head}, fetching {n} blocks");

        let permits = self.policy.concurrency.clamp(1, n as usize);
        let semaphore = Arc::new(Semaphore::new(permits));
        let mut tasks = JoinSet::new();
        for height in target_heights(chain_head, n) {
            let transport = self.transport.clone();
            let semaphore = semaphore.clone();
            let policy = self.policy.clone();
            let cancel = cancel.clone();
            let ctx = self.ctx.clone();
            tasks.spawn(async move {
                let result = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(ScanError::Cancelled),
                    result = fetch_block_with_retry(
                        transport.as_ref(),
                        semaphore,
                        height,
                        &policy,
                        &ctx,
                    ) => result,
                };
                (height, result)
            });
        }

        let mut blocks = Vec::with_capacity(n as usize);
        let mut failures = vec![];
        loop {
            let joined = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tasks.abort_all();
                    try_warn!(self.ctx, "Block retrieval cancelled, {} blocks collected", blocks.len());
                    return Err(ScanError::Cancelled);
                }
                joined = tasks.join_next() => joined,
            };
            match joined {
                None => break,
                Some(Ok((_, Ok(block)))) => blocks.push(block),
                Some(Ok((height, Err(e)))) => {
                    try_warn!(self.ctx, "Failed to get block {height}: {e}");
                    failures.push((height, e));
                }
                Some(Err(e)) => {
                    try_error!(self.ctx, "Block retrieval task aborted: {e}");
                }
            }
        }

        if cancel.is_cancelled() || failures.iter().any(|(_, e)| *e == ScanError::Cancelled) {
            return Err(ScanError::Cancelled);
        }
        if !failures.is_empty() || blocks.len() as u64 != n {
            failures.sort_by(|(a, _), (b, _)| b.cmp(a));
            return Err(ScanError::IncompleteResult {
                expected: n,
                fetched: blocks.len() as u64,
                failures,
            });
        }
        try_debug!(self.ctx, "{} blocks collected", blocks.len());
        Ok(blocks)
    }

    async fn get_chain_head(&self, cancel: &CancellationToken) -> Result<i64, ScanError> {
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ScanError::Cancelled),
            response = get_chain_head(self.transport.as_ref()) => response,
        };
        let raw_height = response.map_err(ScanError::from)?;
        parse_quantity_u64(&raw_height)
            .ok()
            .and_then(|height| i64::try_from(height).ok())
            .ok_or(ScanError::InvalidChainHead(raw_height))
    }
}

/// Heights `head, head - 1, ..., head - n + 1`. Near genesis some of them are
/// negative; they are kept so the retrieval reports them as failures.
fn target_heights(chain_head: i64, n: u64) -> Vec<i64> {
    (0..n as i64).map(|offset| chain_head - offset).collect()
}

async fn fetch_block_with_retry<T>(
    transport: &T,
    semaphore: Arc<Semaphore>,
    height: i64,
    policy: &FetchPolicy,
    ctx: &Context,
) -> Result<Block, ScanError>
where
    T: RpcTransport + ?Sized,
{
    if height < 0 {
        return Err(ScanError::InvalidHeight(height));
    }

    let mut attempts = 0;
    while attempts < policy.max_attempts {
        attempts += 1;
        let response = {
            let _permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| ScanError::Cancelled)?;
            get_block_by_height(transport, height as u64).await
        };
        match response {
            Ok(block) => return Ok(block),
            Err(e) if e.is_rate_limited() => {
                if attempts < policy.max_attempts {
                    try_warn!(
                        ctx,
                        "Rate limit exceeded on block {height} (attempt {attempts}/{}), retrying in {:?}",
                        policy.max_attempts,
                        policy.backoff
                    );
                    tokio::time::sleep(policy.backoff).await;
                }
            }
            Err(e) => return Err(ScanError::Transport(e)),
        }
    }
    Err(ScanError::RetryExhausted { height, attempts })
}
