// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 QXB Gateway Contributors

//! Ethereum Sepolia integration: RPC client, fixed-contract bindings, and
//! transaction submission.

pub mod client;
pub mod contract;
pub mod tx;
pub mod types;

pub use client::{format_units, parse_address, parse_base_units, ChainClient, ChainError};
pub use contract::{QxbContract, RewardEligibility};
pub use tx::{SendResult, TxReceipt, TxSender};
pub use types::{explorer_tx_url, network_name, NetworkConfig, ETHEREUM_MAINNET, SEPOLIA};
