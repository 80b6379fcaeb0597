use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use ledger_types::MAX_BLOCKS_PER_SCAN;

use crate::toml::ConfigToml;

pub const DEFAULT_SCAN_BLOCKS: u64 = 100;
pub const DEFAULT_CONCURRENCY: usize = 40;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_BACKOFF_MS: u64 = 1_000;
pub const DEFAULT_DEADLINE_SECS: u64 = 60;
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 15;

pub const ENV_ENDPOINT_URL: &str = "ENDPOINT_URL";
pub const ENV_API_TOKEN: &str = "API_TOKEN";
pub const ENV_RPC_TIMEOUT_SECS: &str = "RPC_TIMEOUT_SECS";
pub const ENV_SCAN_BLOCKS: &str = "SCAN_BLOCKS";
pub const ENV_SCAN_CONCURRENCY: &str = "SCAN_CONCURRENCY";
pub const ENV_SCAN_MAX_ATTEMPTS: &str = "SCAN_MAX_ATTEMPTS";
pub const ENV_SCAN_BACKOFF_MS: &str = "SCAN_BACKOFF_MS";
pub const ENV_SCAN_DEADLINE_SECS: &str = "SCAN_DEADLINE_SECS";

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub rpc: RpcConfig,
    pub scan: ScanConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RpcConfig {
    pub endpoint_url: String,
    pub api_token: String,
    pub timeout_secs: u64,
}

impl RpcConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Knobs of the block retrieval: how many blocks, how many in flight, and how
/// hard to insist when the node throttles us.
#[derive(Clone, Debug, PartialEq)]
pub struct ScanConfig {
    pub blocks: u64,
    pub concurrency: usize,
    pub max_attempts: u32,
    pub backoff_ms: u64,
    pub deadline_secs: u64,
}

impl ScanConfig {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            blocks: DEFAULT_SCAN_BLOCKS,
            concurrency: DEFAULT_CONCURRENCY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_ms: DEFAULT_BACKOFF_MS,
            deadline_secs: DEFAULT_DEADLINE_SECS,
        }
    }
}

impl Config {
    pub fn from_file_path(file_path: &str) -> Result<Config, String> {
        let config = ConfigToml::config_from_file_path(file_path)?;
        config.validate()?;
        Ok(config)
    }

    /// Builds the configuration from the process environment, after loading
    /// a `.env` file from the working directory when there is one.
    pub fn from_env() -> Result<Config, String> {
        let _ = dotenv::dotenv();
        let vars: HashMap<String, String> = std::env::vars().collect();
        let config = Config::from_env_vars(&vars)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_env_vars(vars: &HashMap<String, String>) -> Result<Config, String> {
        let required = |key: &str| {
            vars.get(key)
                .cloned()
                .ok_or_else(|| format!("environment variable {key} not set"))
        };
        let defaults = ScanConfig::default();
        Ok(Config {
            rpc: RpcConfig {
                endpoint_url: required(ENV_ENDPOINT_URL)?,
                api_token: required(ENV_API_TOKEN)?,
                timeout_secs: parse_env(vars, ENV_RPC_TIMEOUT_SECS)?
                    .unwrap_or(DEFAULT_RPC_TIMEOUT_SECS),
            },
            scan: ScanConfig {
                blocks: parse_env(vars, ENV_SCAN_BLOCKS)?.unwrap_or(defaults.blocks),
                concurrency: parse_env(vars, ENV_SCAN_CONCURRENCY)?
                    .unwrap_or(defaults.concurrency),
                max_attempts: parse_env(vars, ENV_SCAN_MAX_ATTEMPTS)?
                    .unwrap_or(defaults.max_attempts),
                backoff_ms: parse_env(vars, ENV_SCAN_BACKOFF_MS)?.unwrap_or(defaults.backoff_ms),
                deadline_secs: parse_env(vars, ENV_SCAN_DEADLINE_SECS)?
                    .unwrap_or(defaults.deadline_secs),
            },
        })
    }

    pub fn devnet_default() -> Config {
        Config {
            rpc: RpcConfig {
                endpoint_url: "http://localhost:8545".into(),
                api_token: "devnet".into(),
                timeout_secs: DEFAULT_RPC_TIMEOUT_SECS,
            },
            scan: ScanConfig::default(),
        }
    }

    pub fn test_default() -> Config {
        let mut config = Self::devnet_default();
        config.scan.backoff_ms = 1;
        config.scan.concurrency = 4;
        config
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.rpc.endpoint_url.is_empty() {
            return Err("rpc.endpoint_url must not be empty".to_string());
        }
        if self.rpc.api_token.is_empty() {
            return Err("rpc.api_token must not be empty".to_string());
        }
        if self.scan.blocks == 0 || self.scan.blocks > MAX_BLOCKS_PER_SCAN {
            return Err(format!(
                "scan.blocks must be within 1-{MAX_BLOCKS_PER_SCAN}, got {}",
                self.scan.blocks
            ));
        }
        // more permits than heights in a scan would never be used
        if self.scan.concurrency == 0 || self.scan.concurrency > MAX_BLOCKS_PER_SCAN as usize {
            return Err(format!(
                "scan.concurrency must be within 1-{MAX_BLOCKS_PER_SCAN}, got {}",
                self.scan.concurrency
            ));
        }
        if self.scan.max_attempts == 0 {
            return Err("scan.max_attempts must be at least 1".to_string());
        }
        Ok(())
    }
}

fn parse_env<T: FromStr>(vars: &HashMap<String, String>, key: &str) -> Result<Option<T>, String>
where
    T::Err: std::fmt::Display,
{
    match vars.get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| format!("invalid value for {key}: {e}")),
        None => Ok(None),
    }
}
