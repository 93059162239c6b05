use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod probe;
mod rpc;
mod workflow;

use config::{Args, ProbeConfig};
use rpc::RpcLedger;
use workflow::Probe;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ProbeConfig::from(Args::parse());

    let term = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&term))?;
    signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(&term))?;

    let ledger = RpcLedger::new(&config, Arc::clone(&term));
    println!("[RUN] Probing {} via {}", config.program_id, ledger.url());

    let receipt = Probe::new(&config, &ledger, term)
        .run()
        .await
        .context("airdrop-and-submit probe failed")?;

    match receipt.airdrop_signature {
        Some(airdrop) => println!(
            "[FUND] payer {} airdropped {} lamports ({})",
            receipt.payer, receipt.airdrop_lamports, airdrop
        ),
        None => println!("[FUND] payer {} supplied, no airdrop", receipt.payer),
    }
    println!(
        "[DONE] probe tx {} landed on {}",
        receipt.transaction_signature, receipt.program_id
    );
    println!("success!");
    Ok(())
}
