use std::fmt::Display;
use std::sync::Arc;

use config::Config;
use ledger_sdk::rpc::{JsonRpcClient, RpcTransport};
use ledger_sdk::try_info;
use ledger_sdk::utils::Context;
use ledger_types::BalanceChange;
use tokio_util::sync::CancellationToken;

use crate::aggregator::BalanceAggregator;
use crate::error::ScanError;
use crate::fetcher::{BlockFetcher, FetchPolicy};
use crate::units::wei_to_ether;

pub const REPORT_ETHER_DECIMALS: u32 = 6;

#[derive(Debug, Clone, PartialEq)]
pub struct ScanReport {
    pub blocks_scanned: u64,
    pub change: BalanceChange,
}

impl Display for ScanReport {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(
            f,
            "The address that sent/received the most in the last {} blocks:",
            self.blocks_scanned
        )?;
        if self.change.is_sender() {
            writeln!(f, "Address {} sent the most", self.change.address)?;
        } else {
            writeln!(f, "Address {} received the most", self.change.address)?;
        }
        writeln!(f, "{} WEI", self.change.delta)?;
        write!(
            f,
            "{} ETH",
            wei_to_ether(&self.change.delta, REPORT_ETHER_DECIMALS)
        )
    }
}

/// Fetches the latest blocks and reports the largest balance change. The
/// transport is built once and handed to the fetcher.
pub struct Service<T: RpcTransport + ?Sized> {
    fetcher: BlockFetcher<T>,
    ctx: Context,
}

impl Service<JsonRpcClient> {
    pub fn new(config: &Config, ctx: &Context) -> Result<Self, String> {
        let client = JsonRpcClient::new(
            &config.rpc.endpoint_url,
            &config.rpc.api_token,
            config.rpc.timeout(),
        )?;
        Ok(Service::with_transport(
            Arc::new(client),
            FetchPolicy::from_config(&config.scan),
            ctx,
        ))
    }
}

impl<T> Service<T>
where
    T: RpcTransport + ?Sized + 'static,
{
    pub fn with_transport(transport: Arc<T>, policy: FetchPolicy, ctx: &Context) -> Self {
        Service {
            fetcher: BlockFetcher::new(transport, policy, ctx),
            ctx: ctx.clone(),
        }
    }

    pub async fn scan(
        &self,
        blocks_to_fetch: u64,
        cancel: &CancellationToken,
    ) -> Result<ScanReport, ScanError> {
        let blocks = self.fetcher.fetch_latest(blocks_to_fetch, cancel).await?;
        let transactions: usize = blocks.iter().map(|b| b.transactions.len()).sum();
        try_info!(
            self.ctx,
            "Aggregating {transactions} transactions from {} blocks",
            blocks.len()
        );
        let change = BalanceAggregator::largest_change(&blocks)?;
        try_info!(self.ctx, "Largest balance change: {change}");
        Ok(ScanReport {
            blocks_scanned: blocks_to_fetch,
            change,
        })
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;
    use std::time::Duration;

    use config::Config;
    use ledger_sdk::utils::Context;
    use ledger_types::{BalanceChange, Block};
    use num_bigint::BigInt;
    use tokio_util::sync::CancellationToken;

    use crate::error::ScanError;
    use crate::fetcher::FetchPolicy;
    use crate::test_builders::{MockTransport, TestBlockBuilder};

    use super::{ScanReport, Service};

    fn policy() -> FetchPolicy {
        FetchPolicy::from_config(&Config::test_default().scan)
    }

    #[tokio::test]
    async fn scans_latest_blocks() {
        let transport = Arc::new(
            MockTransport::new(30)
                .block(
                    30,
                    TestBlockBuilder::new()
                        .transfer("0x1", "0x2", "1535333445")
                        .transfer("0x1", "0x2", "4545666742")
                        .transfer("0x2", "0x3", "97979882342")
                        .build(),
                )
                .block(
                    29,
                    TestBlockBuilder::new()
                        .transfer("0x3", "0x5", "153445534656")
                        .transfer("0x7", "0x5", "2341545")
                        .transfer("0x3", "0x1", "545321498")
                        .build(),
                )
                .block(
                    28,
                    TestBlockBuilder::new()
                        .transfer("0x5", "0x1", "13215523")
                        .transfer("0x4", "0x7", "5366678")
                        .build(),
                ),
        );
        let service = Service::with_transport(transport, policy(), &Context::empty());
        let report = service.scan(3, &CancellationToken::new()).await.unwrap();
        assert_eq!(report.blocks_scanned, 3);
        assert_eq!(report.change.address, "0x5");
        assert_eq!(report.change.delta, BigInt::from(153434660678i64));
    }

    #[tokio::test]
    async fn empty_block_fails_the_scan() {
        let transport = Arc::new(MockTransport::new(30).block(29, Block::default()));
        let service = Service::with_transport(transport, policy(), &Context::empty());
        let result = service.scan(2, &CancellationToken::new()).await;
        assert_eq!(result, Err(ScanError::EmptyBlock));
    }

    #[tokio::test]
    async fn deadline_cancels_the_scan() {
        let transport = Arc::new(MockTransport::new(30).hang_block(30));
        let service = Service::with_transport(transport, policy(), &Context::empty());
        let cancel = CancellationToken::new();
        let deadline = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            deadline.cancel();
        });
        assert_eq!(service.scan(5, &cancel).await, Err(ScanError::Cancelled));
    }

    #[test]
    fn builds_json_rpc_service_from_config() {
        assert!(Service::new(&Config::devnet_default(), &Context::empty()).is_ok());

        let mut config = Config::devnet_default();
        config.rpc.api_token = String::new();
        assert_eq!(
            Service::new(&config, &Context::empty()).err(),
            Some("empty token provided".to_string())
        );
    }

    #[test]
    fn reports_receiver() {
        let report = ScanReport {
            blocks_scanned: 100,
            change: BalanceChange::new(
                "0x5".into(),
                BigInt::parse_bytes(b"2500000000000000000", 10).unwrap(),
            ),
        };
        assert_eq!(
            report.to_string(),
            "The address that sent/received the most in the last 100 blocks:\n\
             Address 0x5 received the most\n\
             2500000000000000000 WEI\n\
             2.500000 ETH"
        );
    }

    #[test]
    fn reports_sender() {
        let report = ScanReport {
            blocks_scanned: 10,
            change: BalanceChange::new("0xa".into(), BigInt::from(-1_000_000_000_000i64)),
        };
        let rendered = report.to_string();
        assert!(rendered.contains("Address 0xa sent the most"));
        assert!(rendered.contains("-1000000000000 WEI"));
        assert!(rendered.ends_with("-0.000001 ETH"));
    }
}
