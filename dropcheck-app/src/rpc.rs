use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use solana_client::client_error::{ClientError, ClientErrorKind, Result as ClientResult};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::message::Message;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use tokio::time::{sleep, Duration};
use tracing::debug;

use crate::config::ProbeConfig;

/// The handful of cluster operations a probe run depends on.
///
/// `RpcLedger` talks to a real node; tests substitute a recording stub.
pub trait Ledger {
    /// Version reported by the node. Doubles as the connection check.
    async fn handshake(&self) -> ClientResult<String>;

    async fn lamports_per_signature(&self) -> ClientResult<u64>;

    async fn request_airdrop(&self, to: &Pubkey, lamports: u64) -> ClientResult<Signature>;

    /// Suspends until `signature` lands at the configured commitment.
    /// A failed transaction, an expired wait or an interrupt is an error.
    async fn confirm(&self, signature: &Signature) -> ClientResult<()>;

    async fn latest_blockhash(&self) -> ClientResult<Hash>;

    async fn send_transaction(&self, transaction: &Transaction) -> ClientResult<Signature>;
}

pub struct RpcLedger {
    client: RpcClient,
    commitment: CommitmentConfig,
    confirm_timeout: Duration,
    poll_interval: Duration,
    term: Arc<AtomicBool>,
}

impl RpcLedger {
    pub fn new(config: &ProbeConfig, term: Arc<AtomicBool>) -> Self {
        let client = RpcClient::new_with_commitment(config.rpc_url.clone(), config.commitment);
        Self::with_client(client, config, term)
    }

    pub fn with_client(client: RpcClient, config: &ProbeConfig, term: Arc<AtomicBool>) -> Self {
        RpcLedger {
            client,
            commitment: config.commitment,
            confirm_timeout: config.confirm_timeout,
            poll_interval: config.poll_interval,
            term,
        }
    }

    pub fn url(&self) -> String {
        self.client.url()
    }
}

impl Ledger for RpcLedger {
    async fn handshake(&self) -> ClientResult<String> {
        let version = self.client.get_version().await?;
        Ok(version.solana_core)
    }

    async fn lamports_per_signature(&self) -> ClientResult<u64> {
        // Fee of a message whose only content is its payer's signature.
        let blockhash = self.client.get_latest_blockhash().await?;
        let message = Message::new_with_blockhash(&[], Some(&Pubkey::default()), &blockhash);
        self.client.get_fee_for_message(&message).await
    }

    async fn request_airdrop(&self, to: &Pubkey, lamports: u64) -> ClientResult<Signature> {
        self.client.request_airdrop(to, lamports).await
    }

    async fn confirm(&self, signature: &Signature) -> ClientResult<()> {
        let started = Instant::now();
        let mut polls = 0u32;
        loop {
            if self.term.load(Ordering::Relaxed) {
                return Err(ClientErrorKind::Custom(format!(
                    "interrupted while waiting for {signature} ({polls} polls)"
                ))
                .into());
            }

            polls += 1;
            match self
                .client
                .get_signature_status_with_commitment(signature, self.commitment)
                .await?
            {
                Some(Ok(())) => {
                    debug!(%signature, polls, "signature confirmed");
                    return Ok(());
                }
                Some(Err(err)) => return Err(ClientError::from(err)),
                None => {}
            }

            if started.elapsed() >= self.confirm_timeout {
                return Err(ClientErrorKind::Custom(format!(
                    "signature {signature} not confirmed after {}s ({polls} polls)",
                    self.confirm_timeout.as_secs()
                ))
                .into());
            }
            sleep(self.poll_interval).await;
        }
    }

    async fn latest_blockhash(&self) -> ClientResult<Hash> {
        self.client.get_latest_blockhash().await
    }

    async fn send_transaction(&self, transaction: &Transaction) -> ClientResult<Signature> {
        self.client.send_transaction(transaction).await
    }
}
