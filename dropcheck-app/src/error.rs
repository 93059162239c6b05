use std::path::PathBuf;

use solana_client::client_error::ClientError;
use solana_sdk::pubkey::ParsePubkeyError;
use solana_sdk::signature::Signature;
use thiserror::Error;

use crate::workflow::Step;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("rpc endpoint {endpoint} unreachable")]
    Connection {
        endpoint: String,
        #[source]
        source: ClientError,
    },

    #[error("invalid program address {address:?}")]
    InvalidAddressFormat {
        address: String,
        #[source]
        source: ParsePubkeyError,
    },

    #[error("cannot read payer keypair {}: {reason}", .path.display())]
    PayerKeypair { path: PathBuf, reason: String },

    #[error("airdrop of {lamports} lamports not confirmed{}", describe(.signature))]
    AirdropNotConfirmed {
        lamports: u64,
        signature: Option<Signature>,
        #[source]
        source: ClientError,
    },

    #[error("transaction not confirmed{}", describe(.signature))]
    TransactionNotConfirmed {
        signature: Option<Signature>,
        #[source]
        source: ClientError,
    },

    #[error("airdrop amount overflows: {lamports_per_signature} lamports x {multiplier}")]
    FeeOverflow {
        lamports_per_signature: u64,
        multiplier: u64,
    },

    #[error("interrupted before {0}")]
    Interrupted(Step),
}

// `None` means the request itself was rejected before a signature existed.
fn describe(signature: &Option<Signature>) -> String {
    match signature {
        Some(sig) => format!(" (signature {sig})"),
        None => " (request rejected)".to_string(),
    }
}
