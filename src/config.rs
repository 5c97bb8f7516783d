// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 QXB Gateway Contributors

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment at startup. Every variable has
//! a compiled-in default so the service runs against Sepolia out of the box.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `RPC_URL` | Ethereum JSON-RPC endpoint | public Sepolia node |
//! | `CONTRACT_ADDRESS` | QXB token contract address | Sepolia deployment |
//! | `DATA_DIR` | Directory for the embedded database | `data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `JWT_SECRET` | HMAC secret for issued bearer tokens | dev-only default |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::env;
use std::path::PathBuf;

/// Default JSON-RPC endpoint (public Sepolia node, no API key required).
pub const DEFAULT_RPC_URL: &str = "https://ethereum-sepolia-rpc.publicnode.com";

/// QXB token contract on Sepolia. The gateway serves exactly one contract.
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x5068a014aC8e691Be53848FE5872cbA9f8C4dA17";

/// Default directory for the embedded database file.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Development-only JWT secret. Override with `JWT_SECRET` in any real
/// deployment.
pub const DEFAULT_JWT_SECRET: &str = "qxb-dev-secret-change-in-production";

/// Environment variable names.
pub const RPC_URL_ENV: &str = "RPC_URL";
pub const CONTRACT_ADDRESS_ENV: &str = "CONTRACT_ADDRESS";
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Environment variable holding the contract owner key for operator binaries.
pub const PRIVATE_KEY_ENV: &str = "PRIVATE_KEY";

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,
    /// Fixed token contract address (0x-prefixed hex).
    pub contract_address: String,
    /// Directory holding the embedded database.
    pub data_dir: PathBuf,
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Secret used to sign issued JWTs.
    pub jwt_secret: String,
}

impl Config {
    /// Load configuration from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            rpc_url: env::var(RPC_URL_ENV).unwrap_or_else(|_| DEFAULT_RPC_URL.to_string()),
            contract_address: env::var(CONTRACT_ADDRESS_ENV)
                .unwrap_or_else(|_| DEFAULT_CONTRACT_ADDRESS.to_string()),
            data_dir: env::var(DATA_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR)),
            host: env::var(HOST_ENV).unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var(PORT_ENV)
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            jwt_secret: env::var(JWT_SECRET_ENV)
                .unwrap_or_else(|_| DEFAULT_JWT_SECRET.to_string()),
        }
    }

    /// Path to the embedded database file.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("gateway.redb")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            contract_address: DEFAULT_CONTRACT_ADDRESS.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
        }
    }
}
