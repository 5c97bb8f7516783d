// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 QXB Gateway Contributors

//! Operator tool: publish the on-chain resume document.
//!
//! Usage: `PRIVATE_KEY=<owner key> set-resume <resume.md>`
//!
//! Reads the markdown file, sends `setResume(text)` from the contract owner
//! key, and waits for confirmation.

use std::env;
use std::process::ExitCode;

use qxb_gateway::blockchain::{parse_address, ChainClient, TxSender, SEPOLIA};
use qxb_gateway::config::{Config, PRIVATE_KEY_ENV};

#[tokio::main]
async fn main() -> ExitCode {
    let Some(file) = env::args().nth(1) else {
        eprintln!("usage: set-resume <resume.md>");
        return ExitCode::FAILURE;
    };

    let resume = match std::fs::read_to_string(&file) {
        Ok(text) => text.trim().to_string(),
        Err(e) => {
            eprintln!("failed to read {file}: {e}");
            return ExitCode::FAILURE;
        }
    };
    if resume.is_empty() {
        eprintln!("resume file is empty");
        return ExitCode::FAILURE;
    }
    println!("resume length: {} chars", resume.len());

    let Ok(private_key) = env::var(PRIVATE_KEY_ENV) else {
        eprintln!("{PRIVATE_KEY_ENV} environment variable is required (contract owner key)");
        return ExitCode::FAILURE;
    };

    let config = Config::from_env();

    let signer = match ChainClient::create_signer(&private_key) {
        Ok(signer) => signer,
        Err(e) => {
            eprintln!("invalid private key: {e}");
            return ExitCode::FAILURE;
        }
    };
    let from = signer.address();

    let contract_address = match parse_address(&config.contract_address) {
        Ok(addr) => addr,
        Err(e) => {
            eprintln!("invalid contract address: {e}");
            return ExitCode::FAILURE;
        }
    };

    println!("contract: {contract_address:?}");
    println!("sender:   {from:?}");

    let sender = match TxSender::new(
        &config.rpc_url,
        SEPOLIA,
        contract_address,
        ChainClient::create_wallet(signer),
    ) {
        Ok(sender) => sender,
        Err(e) => {
            eprintln!("failed to connect: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = match sender.send_set_resume(from, resume).await {
        Ok(result) => result,
        Err(e) => {
            eprintln!("failed to send transaction: {e}");
            return ExitCode::FAILURE;
        }
    };
    println!("transaction sent: {}", result.tx_hash);
    println!("waiting for confirmation...");

    match sender.wait_for_confirmation(&result.tx_hash).await {
        Ok(receipt) if receipt.success => {
            println!("resume published");
            println!("block:    {}", receipt.block_number);
            println!("gas used: {}", receipt.gas_used);
            println!("explorer: {}", result.explorer_url);
            ExitCode::SUCCESS
        }
        Ok(_) => {
            eprintln!("transaction reverted");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("confirmation failed: {e}");
            ExitCode::FAILURE
        }
    }
}
