// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 QXB Gateway Contributors

//! Operator tool: transfer tokens from the contract owner account.
//!
//! Usage: `PRIVATE_KEY=<owner key> owner-transfer <recipient> <amount>`
//!
//! The amount is a base-10 integer in the token's smallest units.

use std::env;
use std::process::ExitCode;

use qxb_gateway::blockchain::{
    parse_address, parse_base_units, ChainClient, TxSender, SEPOLIA,
};
use qxb_gateway::config::{Config, PRIVATE_KEY_ENV};

#[tokio::main]
async fn main() -> ExitCode {
    let mut args = env::args().skip(1);
    let (Some(recipient), Some(amount_arg)) = (args.next(), args.next()) else {
        eprintln!("usage: owner-transfer <recipient> <amount-in-base-units>");
        return ExitCode::FAILURE;
    };

    let to = match parse_address(&recipient) {
        Ok(addr) => addr,
        Err(e) => {
            eprintln!("invalid recipient address: {e}");
            return ExitCode::FAILURE;
        }
    };

    let amount = match parse_base_units(&amount_arg) {
        Ok(amount) => amount,
        Err(e) => {
            eprintln!("invalid amount: {e}");
            return ExitCode::FAILURE;
        }
    };

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

    println!("contract:  {contract_address:?}");
    println!("sender:    {from:?}");
    println!("recipient: {to:?}");
    println!("amount:    {amount} base units");

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

    let result = match sender.send_transfer(from, to, amount).await {
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
            println!("transfer confirmed");
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
