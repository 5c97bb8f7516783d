// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 QXB Gateway Contributors

use std::path::PathBuf;
use std::sync::Arc;

use alloy::{network::EthereumWallet, primitives::Address};

use crate::auth::JwtKeys;
use crate::blockchain::{
    client::HttpProvider, parse_address, ChainClient, ChainError, QxbContract, TxSender, SEPOLIA,
};
use crate::config::Config;
use crate::storage::GatewayDb;

/// Shared application state, cheap to clone into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Embedded user database
    pub db: Arc<GatewayDb>,
    /// Read-only RPC client
    pub chain: Arc<ChainClient>,
    /// JWT signing/verification keys
    pub jwt: JwtKeys,
    /// The fixed token contract address
    pub contract_address: Address,
    /// RPC endpoint, used to build per-request signing providers
    pub rpc_url: String,
    /// Data directory, reported by health checks
    pub data_dir: PathBuf,
}

impl AppState {
    /// Build the application state from configuration and an opened database.
    pub fn new(config: &Config, db: GatewayDb) -> Result<Self, ChainError> {
        let contract_address = parse_address(&config.contract_address)?;
        let chain = ChainClient::new(&config.rpc_url, SEPOLIA)?;

        Ok(Self {
            db: Arc::new(db),
            chain: Arc::new(chain),
            jwt: JwtKeys::from_secret(&config.jwt_secret),
            contract_address,
            rpc_url: config.rpc_url.clone(),
            data_dir: config.data_dir.clone(),
        })
    }

    /// Bind the fixed contract against the read-only provider.
    pub fn contract(&self) -> QxbContract<HttpProvider> {
        QxbContract::new(self.chain.provider(), self.contract_address)
    }

    /// Build a signing transaction sender for the given wallet.
    pub fn tx_sender(&self, wallet: EthereumWallet) -> Result<TxSender, ChainError> {
        TxSender::new(
            &self.rpc_url,
            self.chain.network().clone(),
            self.contract_address,
            wallet,
        )
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_builds_from_default_config() {
        let (state, _dir) = test_support::test_state();
        assert_eq!(
            format!("{:?}", state.contract_address).to_lowercase(),
            crate::config::DEFAULT_CONTRACT_ADDRESS.to_lowercase()
        );
        assert_eq!(state.chain.network().chain_id, 11155111);
    }

    #[test]
    fn invalid_contract_address_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let db = GatewayDb::open(&dir.path().join("test.redb")).unwrap();

        let config = Config {
            contract_address: "not-an-address".to_string(),
            ..Config::default()
        };

        assert!(AppState::new(&config, db).is_err());
    }
}
