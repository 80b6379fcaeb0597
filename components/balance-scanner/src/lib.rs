pub mod aggregator;
pub mod error;
pub mod fetcher;
pub mod service;
pub mod units;

#[cfg(test)]
pub mod test_builders;

pub use aggregator::BalanceAggregator;
pub use error::{ErrorKind, ScanError};
pub use fetcher::{BlockFetcher, FetchPolicy};
pub use service::{ScanReport, Service};
