use solana_sdk::hash::Hash;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use solana_sdk::transaction::Transaction;

/// Instruction data sent to the target program. Opaque: the program is
/// expected to accept or reject it, nothing here interprets it.
pub const PROBE_PAYLOAD: [u8; 1] = [0];

/// No accounts, one byte of data.
pub fn probe_instruction(program_id: Pubkey) -> Instruction {
    Instruction::new_with_bytes(program_id, &PROBE_PAYLOAD, vec![])
}

/// Wraps `instruction` in a transaction paid for and signed by `payer` alone.
pub fn probe_transaction(instruction: Instruction, payer: &Keypair, blockhash: Hash) -> Transaction {
    Transaction::new_signed_with_payer(&[instruction], Some(&payer.pubkey()), &[payer], blockhash)
}

/// Lamports to request so the payer can cover `multiplier` single-signature fees.
pub fn airdrop_lamports(lamports_per_signature: u64, multiplier: u64) -> Option<u64> {
    lamports_per_signature.checked_mul(multiplier)
}
