use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use solana_client::client_error::ClientError;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{read_keypair_file, Keypair, Signature, Signer};
use tracing::{debug, info};

use crate::config::ProbeConfig;
use crate::error::ProbeError;
use crate::probe::{airdrop_lamports, probe_instruction, probe_transaction};
use crate::rpc::Ledger;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    DecodeProgram,
    Connect,
    QueryFees,
    GeneratePayer,
    RequestAirdrop,
    ConfirmAirdrop,
    BuildInstruction,
    SubmitTransaction,
    ConfirmTransaction,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::DecodeProgram => "decode-program",
            Step::Connect => "connect",
            Step::QueryFees => "query-fees",
            Step::GeneratePayer => "generate-payer",
            Step::RequestAirdrop => "request-airdrop",
            Step::ConfirmAirdrop => "confirm-airdrop",
            Step::BuildInstruction => "build-instruction",
            Step::SubmitTransaction => "submit-transaction",
            Step::ConfirmTransaction => "confirm-transaction",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub struct Receipt {
    pub program_id: Pubkey,
    pub payer: Pubkey,
    /// Lamports the airdrop was sized to, whether or not one was sent.
    pub airdrop_lamports: u64,
    /// `None` when the payer was loaded from a keypair file.
    pub airdrop_signature: Option<Signature>,
    pub transaction_signature: Signature,
}

/// One airdrop-then-submit run against a cluster.
///
/// Every step is a method returning `Result`; the interrupt flag is
/// checked before each one. The ledger watches the same flag while it
/// waits on a confirmation, and a wait it abandons is reported here as
/// `Interrupted` for that step.
pub struct Probe<'a, L> {
    config: &'a ProbeConfig,
    ledger: &'a L,
    term: Arc<AtomicBool>,
}

impl<'a, L: Ledger> Probe<'a, L> {
    pub fn new(config: &'a ProbeConfig, ledger: &'a L, term: Arc<AtomicBool>) -> Self {
        Probe { config, ledger, term }
    }

    pub async fn run(&self) -> Result<Receipt, ProbeError> {
        self.checkpoint(Step::DecodeProgram)?;
        let program_id = self.config.program_id()?;

        self.connect().await?;
        let lamports = self.estimate_airdrop().await?;

        self.checkpoint(Step::GeneratePayer)?;
        let (payer, airdrop_signature) = match self.load_payer()? {
            Some(payer) => {
                info!(payer = %payer.pubkey(), "using provided payer, skipping airdrop");
                (payer, None)
            }
            None => {
                let payer = Keypair::new();
                info!(payer = %payer.pubkey(), "generated fee payer");
                let signature = self.fund(&payer, lamports).await?;
                (payer, Some(signature))
            }
        };

        self.checkpoint(Step::BuildInstruction)?;
        let instruction = probe_instruction(program_id);
        info!(program = %program_id, "sending probe transaction");

        let transaction_signature = self.submit(&payer, instruction).await?;

        Ok(Receipt {
            program_id,
            payer: payer.pubkey(),
            airdrop_lamports: lamports,
            airdrop_signature,
            transaction_signature,
        })
    }

    fn checkpoint(&self, step: Step) -> Result<(), ProbeError> {
        if self.term.load(Ordering::Relaxed) {
            return Err(ProbeError::Interrupted(step));
        }
        debug!(%step, "step");
        Ok(())
    }

    fn connection_error(&self, source: ClientError) -> ProbeError {
        ProbeError::Connection {
            endpoint: self.config.rpc_url.clone(),
            source,
        }
    }

    /// A failed wait after the flag went up was cut short, not rejected.
    fn waited(&self, step: Step, err: ProbeError) -> ProbeError {
        if self.term.load(Ordering::Relaxed) {
            ProbeError::Interrupted(step)
        } else {
            err
        }
    }

    fn load_payer(&self) -> Result<Option<Keypair>, ProbeError> {
        let Some(path) = &self.config.payer_keypair else {
            return Ok(None);
        };
        read_keypair_file(path)
            .map(Some)
            .map_err(|e| ProbeError::PayerKeypair {
                path: path.clone(),
                reason: e.to_string(),
            })
    }

    async fn connect(&self) -> Result<(), ProbeError> {
        self.checkpoint(Step::Connect)?;
        let version = self.ledger.handshake().await.map_err(|e| self.connection_error(e))?;
        info!(endpoint = %self.config.rpc_url, %version, "connected");
        Ok(())
    }

    async fn estimate_airdrop(&self) -> Result<u64, ProbeError> {
        self.checkpoint(Step::QueryFees)?;
        let per_signature = self
            .ledger
            .lamports_per_signature()
            .await
            .map_err(|e| self.connection_error(e))?;

        let multiplier = self.config.fee_multiplier;
        let lamports = airdrop_lamports(per_signature, multiplier).ok_or(ProbeError::FeeOverflow {
            lamports_per_signature: per_signature,
            multiplier,
        })?;
        debug!(per_signature, multiplier, lamports, "sized airdrop");
        Ok(lamports)
    }

    async fn fund(&self, payer: &Keypair, lamports: u64) -> Result<Signature, ProbeError> {
        self.checkpoint(Step::RequestAirdrop)?;
        let signature = self
            .ledger
            .request_airdrop(&payer.pubkey(), lamports)
            .await
            .map_err(|source| ProbeError::AirdropNotConfirmed {
                lamports,
                signature: None,
                source,
            })?;
        info!(%signature, lamports, "airdrop requested");

        self.checkpoint(Step::ConfirmAirdrop)?;
        self.ledger.confirm(&signature).await.map_err(|source| {
            let err = ProbeError::AirdropNotConfirmed {
                lamports,
                signature: Some(signature),
                source,
            };
            self.waited(Step::ConfirmAirdrop, err)
        })?;
        info!(%signature, "airdrop confirmed");
        Ok(signature)
    }

    async fn submit(&self, payer: &Keypair, instruction: Instruction) -> Result<Signature, ProbeError> {
        self.checkpoint(Step::SubmitTransaction)?;
        let blockhash = self
            .ledger
            .latest_blockhash()
            .await
            .map_err(|e| self.connection_error(e))?;
        let transaction = probe_transaction(instruction, payer, blockhash);

        let signature = self
            .ledger
            .send_transaction(&transaction)
            .await
            .map_err(|source| ProbeError::TransactionNotConfirmed {
                signature: None,
                source,
            })?;
        info!(%signature, "transaction submitted");

        self.checkpoint(Step::ConfirmTransaction)?;
        self.ledger.confirm(&signature).await.map_err(|source| {
            let err = ProbeError::TransactionNotConfirmed {
                signature: Some(signature),
                source,
            };
            self.waited(Step::ConfirmTransaction, err)
        })?;
        info!(%signature, "transaction confirmed");
        Ok(signature)
    }
}
