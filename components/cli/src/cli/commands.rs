use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[clap(name = "largest-balance-change", author, version, about, long_about = None)]
pub enum Protocol {
    /// Find the address with the largest balance change in the latest blocks
    #[clap(name = "scan", bin_name = "scan")]
    Scan(ScanCommand),
    /// Generate a new configuration file
    #[clap(subcommand)]
    Config(ConfigCommand),
}

#[derive(Parser, PartialEq, Clone, Debug)]
pub struct ScanCommand {
    /// Number of blocks to scan back from the chain head (1-500)
    #[clap(long = "blocks")]
    pub blocks: Option<u64>,
    /// Read settings from this file instead of the environment
    #[clap(long = "config-path")]
    pub config_path: Option<String>,
}

#[derive(Subcommand, PartialEq, Clone, Debug)]
#[clap(bin_name = "config", aliases = &["config"])]
pub enum ConfigCommand {
    /// Generate new config
    #[clap(name = "new", bin_name = "new", aliases = &["generate"])]
    New(NewConfigCommand),
}

#[derive(Parser, PartialEq, Clone, Debug)]
pub struct NewConfigCommand {
    /// Node endpoint written to the generated file
    #[clap(long = "endpoint-url", default_value = "https://mainnet.infura.io/v3")]
    pub endpoint_url: String,
}
