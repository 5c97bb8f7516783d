// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 QXB Gateway Contributors

//! Transaction building and broadcasting.
//!
//! All write operations target the fixed QXB contract: EIP-1559 fee
//! computation, explicit gas estimation, then signed submission through a
//! wallet-bound provider.

use std::time::Duration;

use alloy::{
    network::EthereumWallet,
    primitives::{Address, U256},
    providers::{Provider, ProviderBuilder},
    rpc::types::TransactionRequest,
    sol_types::SolCall,
};

use super::client::ChainError;
use super::contract::IQxbToken;
use super::types::{explorer_tx_url, NetworkConfig};

/// Transaction send result.
#[derive(Debug, Clone)]
pub struct SendResult {
    /// Transaction hash
    pub tx_hash: String,
    /// Explorer URL for the transaction
    pub explorer_url: String,
}

/// Transaction receipt after confirmation.
#[derive(Debug, Clone)]
pub struct TxReceipt {
    /// Transaction hash
    pub tx_hash: String,
    /// Block number where transaction was included
    pub block_number: u64,
    /// Gas actually used
    pub gas_used: u64,
    /// Whether the transaction was successful
    pub success: bool,
}

/// Receipt polling interval for [`TxSender::wait_for_confirmation`].
const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Maximum receipt polls before giving up.
const RECEIPT_POLL_ATTEMPTS: u32 = 60;

/// Signing transaction sender bound to the fixed contract.
pub struct TxSender {
    network: NetworkConfig,
    contract_address: Address,
    provider: alloy::providers::fillers::FillProvider<
        alloy::providers::fillers::JoinFill<
            alloy::providers::fillers::JoinFill<
                alloy::providers::Identity,
                alloy::providers::fillers::JoinFill<
                    alloy::providers::fillers::GasFiller,
                    alloy::providers::fillers::JoinFill<
                        alloy::providers::fillers::BlobGasFiller,
                        alloy::providers::fillers::JoinFill<
                            alloy::providers::fillers::NonceFiller,
                            alloy::providers::fillers::ChainIdFiller,
                        >,
                    >,
                >,
            >,
            alloy::providers::fillers::WalletFiller<EthereumWallet>,
        >,
        alloy::providers::RootProvider<alloy::network::Ethereum>,
    >,
}

impl TxSender {
    /// Create a new sender with signing capabilities.
    pub fn new(
        rpc_url: &str,
        network: NetworkConfig,
        contract_address: Address,
        wallet: EthereumWallet,
    ) -> Result<Self, ChainError> {
        let url: url::Url = rpc_url
            .parse()
            .map_err(|e: url::ParseError| ChainError::InvalidRpcUrl(e.to_string()))?;

        let provider = ProviderBuilder::new().wallet(wallet).connect_http(url);

        Ok(Self {
            network,
            contract_address,
            provider,
        })
    }

    /// Submit a `claimDailyReward()` call from the given address.
    pub async fn send_claim(&self, from: Address) -> Result<SendResult, ChainError> {
        let data = IQxbToken::claimDailyRewardCall {}.abi_encode();
        self.send_calldata(from, data).await
    }

    /// Submit a `transfer(to, amount)` call from the given address.
    pub async fn send_transfer(
        &self,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<SendResult, ChainError> {
        let data = IQxbToken::transferCall { to, amount }.abi_encode();
        self.send_calldata(from, data).await
    }

    /// Submit a `setResume(text)` call (contract owner only).
    pub async fn send_set_resume(
        &self,
        from: Address,
        resume: String,
    ) -> Result<SendResult, ChainError> {
        let data = IQxbToken::setResumeCall { resume }.abi_encode();
        self.send_calldata(from, data).await
    }

    /// Internal helper: estimate, price, and broadcast a contract call.
    async fn send_calldata(&self, from: Address, data: Vec<u8>) -> Result<SendResult, ChainError> {
        let (max_fee_per_gas, priority_fee) = self.get_gas_prices().await?;

        let estimate_tx = TransactionRequest::default()
            .from(from)
            .to(self.contract_address)
            .input(data.clone().into());

        let gas_limit = self
            .provider
            .estimate_gas(estimate_tx)
            .await
            .map_err(|e| ChainError::Rpc(format!("Gas estimation failed: {}", e)))?;

        let tx = TransactionRequest::default()
            .from(from)
            .to(self.contract_address)
            .input(data.into())
            .gas_limit(gas_limit)
            .max_fee_per_gas(max_fee_per_gas)
            .max_priority_fee_per_gas(priority_fee);

        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| ChainError::TransactionFailed(format!("Failed to send: {}", e)))?;

        let tx_hash = format!("{:?}", pending.tx_hash());
        let explorer_url = explorer_tx_url(&self.network, &tx_hash);

        tracing::info!(tx_hash = %tx_hash, gas_limit, "transaction broadcast");

        Ok(SendResult {
            tx_hash,
            explorer_url,
        })
    }

    /// Get current gas prices from the network.
    async fn get_gas_prices(&self) -> Result<(u128, u128), ChainError> {
        // Base fee from latest block
        let block = self
            .provider
            .get_block_by_number(alloy::eips::BlockNumberOrTag::Latest)
            .await
            .map_err(|e| ChainError::Rpc(format!("Failed to get block: {}", e)))?
            .ok_or_else(|| ChainError::Rpc("No latest block".to_string()))?;

        let base_fee: u128 = block
            .header
            .base_fee_per_gas
            .map(|f| f as u128)
            .unwrap_or(10_000_000_000u128); // 10 gwei default

        let priority_fee: u128 = 1_500_000_000; // 1.5 gwei

        // Max fee = 2 * base_fee + priority_fee (allows for base fee increase)
        let max_fee = base_fee.saturating_mul(2).saturating_add(priority_fee);

        Ok((max_fee, priority_fee))
    }

    /// Get the transaction status by checking for a receipt.
    pub async fn get_transaction_status(
        &self,
        tx_hash: &str,
    ) -> Result<Option<TxReceipt>, ChainError> {
        let hash = tx_hash
            .parse()
            .map_err(|e| ChainError::InvalidAddress(format!("Invalid tx hash: {}", e)))?;

        let receipt = self
            .provider
            .get_transaction_receipt(hash)
            .await
            .map_err(|e| ChainError::Rpc(format!("Failed to get receipt: {}", e)))?;

        Ok(receipt.map(|r| TxReceipt {
            tx_hash: tx_hash.to_string(),
            block_number: r.block_number.unwrap_or(0),
            gas_used: r.gas_used as u64,
            success: r.status(),
        }))
    }

    /// Poll until a transaction is confirmed and return the receipt.
    ///
    /// Used by the operator binaries after publishing a transaction.
    pub async fn wait_for_confirmation(&self, tx_hash: &str) -> Result<TxReceipt, ChainError> {
        for _ in 0..RECEIPT_POLL_ATTEMPTS {
            if let Some(receipt) = self.get_transaction_status(tx_hash).await? {
                return Ok(receipt);
            }
            tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
        }

        Err(ChainError::Rpc(format!(
            "Transaction {tx_hash} not confirmed after {RECEIPT_POLL_ATTEMPTS} polls"
        )))
    }
}
