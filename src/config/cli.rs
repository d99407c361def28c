//! Command-line flags
//!
//! Every flag is optional and, when present, overrides the matching
//! configuration key.

use clap::Parser;

#[derive(Debug, Clone, Default, Parser)]
#[command(name = "oracle-feeder", version, about = "Keeps an on-chain price oracle in sync with an off-chain feed")]
pub struct Cli {
    /// Configuration file replacing config/default and config/local
    #[arg(long)]
    pub config: Option<String>,

    /// Address of the deployed oracle contract (empty deploys a new one)
    #[arg(long, env = "DEPLOYED_CONTRACT")]
    pub deployed_contract: Option<String>,

    /// File with wallet secrets
    #[arg(long, env = "SECRETS_FILE")]
    pub secrets_file: Option<String>,

    /// Node address for blockchain connection
    #[arg(long, env = "BLOCKCHAIN_NODE")]
    pub blockchain_node: Option<String>,

    /// Number of seconds to sleep between assets
    #[arg(long, env = "SLEEP_SECONDS")]
    pub sleep_seconds: Option<u64>,

    /// Number of seconds between oracle update cycles
    #[arg(long, env = "FREQUENCY_SECONDS")]
    pub frequency_seconds: Option<u64>,

    /// Permille of deviation to trigger an oracle update
    #[arg(long, env = "DEVIATION_PERMILLE")]
    pub deviation_permille: Option<u32>,

    /// Chain-ID of the network to connect to
    #[arg(long, env = "CHAIN_ID")]
    pub chain_id: Option<u64>,

    /// Comma-separated asset symbols
    #[arg(long, value_delimiter = ',')]
    pub assets: Option<Vec<String>>,

    /// Hex creation bytecode of the oracle contract, needed to deploy
    #[arg(long, env = "ORACLE_BYTECODE_FILE")]
    pub bytecode_file: Option<String>,
}
