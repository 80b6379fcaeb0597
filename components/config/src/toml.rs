use std::fs::File;
use std::io::{BufReader, Read};

use crate::{
    Config, RpcConfig, ScanConfig, DEFAULT_BACKOFF_MS, DEFAULT_CONCURRENCY,
    DEFAULT_DEADLINE_SECS, DEFAULT_MAX_ATTEMPTS, DEFAULT_RPC_TIMEOUT_SECS, DEFAULT_SCAN_BLOCKS,
};

#[derive(Deserialize, Debug, Clone)]
pub struct RpcConfigToml {
    pub endpoint_url: String,
    pub api_token: String,
    pub timeout_secs: Option<u64>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ScanConfigToml {
    pub blocks: Option<u64>,
    pub concurrency: Option<usize>,
    pub max_attempts: Option<u32>,
    pub backoff_ms: Option<u64>,
    pub deadline_secs: Option<u64>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ConfigToml {
    pub rpc: RpcConfigToml,
    pub scan: Option<ScanConfigToml>,
}

impl ConfigToml {
    pub fn config_from_file_path(file_path: &str) -> Result<Config, String> {
        let file = File::open(file_path)
            .map_err(|e| format!("unable to read file {}\n{:?}", file_path, e))?;
        let mut file_reader = BufReader::new(file);
        let mut file_buffer = vec![];
        file_reader
            .read_to_end(&mut file_buffer)
            .map_err(|e| format!("unable to read file {}\n{:?}", file_path, e))?;

        let config_file: ConfigToml = match toml::from_slice(&file_buffer) {
            Ok(s) => s,
            Err(e) => {
                return Err(format!("Config file malformatted {}", e));
            }
        };
        Ok(ConfigToml::config_from_toml(config_file))
    }

    pub fn config_from_toml(toml: ConfigToml) -> Config {
        let scan = match toml.scan {
            Some(scan) => ScanConfig {
                blocks: scan.blocks.unwrap_or(DEFAULT_SCAN_BLOCKS),
                concurrency: scan.concurrency.unwrap_or(DEFAULT_CONCURRENCY),
                max_attempts: scan.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
                backoff_ms: scan.backoff_ms.unwrap_or(DEFAULT_BACKOFF_MS),
                deadline_secs: scan.deadline_secs.unwrap_or(DEFAULT_DEADLINE_SECS),
            },
            None => ScanConfig::default(),
        };
        Config {
            rpc: RpcConfig {
                endpoint_url: toml.rpc.endpoint_url,
                api_token: toml.rpc.api_token,
                timeout_secs: toml.rpc.timeout_secs.unwrap_or(DEFAULT_RPC_TIMEOUT_SECS),
            },
            scan,
        }
    }
}
