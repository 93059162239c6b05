use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;

use crate::error::ProbeError;

pub const DEFAULT_RPC_URL: &str = "http://localhost:8899";
pub const DEFAULT_PROGRAM_ID: &str = "8RzvJghJQYZBV6k6nU6adCLSBT4DEVNDxTs9v6EgoKaa";
pub const DEFAULT_FEE_MULTIPLIER: u64 = 100;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// JSON-RPC endpoint of the cluster under test
    #[arg(short, long, default_value = DEFAULT_RPC_URL)]
    pub url: String,

    /// Base58 address of the program that receives the probe instruction
    #[arg(short, long, default_value = DEFAULT_PROGRAM_ID)]
    pub program_id: String,

    /// Airdrop size, in multiples of the single-signature fee
    #[arg(long, default_value_t = DEFAULT_FEE_MULTIPLIER)]
    pub fee_multiplier: u64,

    #[arg(long, value_enum, default_value_t = Commitment::Confirmed)]
    pub commitment: Commitment,

    /// Give up waiting for a signature after this many seconds
    #[arg(long, default_value_t = 30)]
    pub confirm_timeout_secs: u64,

    #[arg(long, default_value_t = 250)]
    pub poll_interval_ms: u64,

    /// Pay with an existing keypair file (JSON byte array) instead of a
    /// freshly airdropped one. The account must already hold enough lamports.
    #[arg(short, long)]
    pub keypair: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Commitment {
    Processed,
    Confirmed,
    Finalized,
}

impl From<Commitment> for CommitmentConfig {
    fn from(level: Commitment) -> Self {
        match level {
            Commitment::Processed => CommitmentConfig::processed(),
            Commitment::Confirmed => CommitmentConfig::confirmed(),
            Commitment::Finalized => CommitmentConfig::finalized(),
        }
    }
}

/// Everything one probe run needs to know up front.
#[derive(Clone, Debug)]
pub struct ProbeConfig {
    /// RPC endpoint the connection handle is bound to.
    pub rpc_url: String,
    /// Program address, still base58. Decoded as the first step of a run
    /// so a typo surfaces as `InvalidAddressFormat` instead of a panic.
    pub program_id: String,
    /// The airdrop covers `lamports_per_signature * fee_multiplier`.
    /// Headroom against fee drift, not a precise requirement.
    pub fee_multiplier: u64,
    pub commitment: CommitmentConfig,
    /// Upper bound on a single confirmation wait.
    pub confirm_timeout: Duration,
    pub poll_interval: Duration,
    /// Funded payer to use as-is. `None` generates one and airdrops to it.
    pub payer_keypair: Option<PathBuf>,
}

impl ProbeConfig {
    pub fn program_id(&self) -> Result<Pubkey, ProbeError> {
        Pubkey::from_str(&self.program_id).map_err(|source| ProbeError::InvalidAddressFormat {
            address: self.program_id.clone(),
            source,
        })
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        ProbeConfig {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            program_id: DEFAULT_PROGRAM_ID.to_string(),
            fee_multiplier: DEFAULT_FEE_MULTIPLIER,
            commitment: CommitmentConfig::confirmed(),
            confirm_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(250),
            payer_keypair: None,
        }
    }
}

impl From<Args> for ProbeConfig {
    fn from(args: Args) -> Self {
        ProbeConfig {
            rpc_url: args.url,
            program_id: args.program_id,
            fee_multiplier: args.fee_multiplier,
            commitment: args.commitment.into(),
            confirm_timeout: Duration::from_secs(args.confirm_timeout_secs),
            poll_interval: Duration::from_millis(args.poll_interval_ms),
            payer_keypair: args.keypair,
        }
    }
}
