// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 QXB Gateway Contributors

//! Token query endpoints: metadata, balances, and the on-chain resume.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    blockchain::{format_units, parse_address},
    error::ApiError,
    state::AppState,
};

use super::validate_address;

/// Token metadata response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TokenInfoResponse {
    /// Token name
    pub name: String,
    /// Token symbol
    pub symbol: String,
    /// Token decimals
    pub decimals: u8,
    /// Total supply formatted with decimals
    pub total_supply: String,
    /// Contract version, if the deployment exposes one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Balance response for a single address.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BalanceResponse {
    /// Queried address
    pub address: String,
    /// Balance formatted with decimals
    pub balance: String,
    /// Token symbol
    pub symbol: String,
}

/// On-chain resume document.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ResumeResponse {
    /// Resume markdown as stored in the contract
    pub resume: String,
}

/// Get token metadata from the fixed contract.
#[utoipa::path(
    get,
    path = "/api/token/info",
    tag = "Token",
    responses(
        (status = 200, description = "Token metadata", body = TokenInfoResponse),
        (status = 503, description = "Blockchain network unavailable")
    )
)]
pub async fn token_info(State(state): State<AppState>) -> Result<Json<TokenInfoResponse>, ApiError> {
    let contract = state.contract();

    let name = contract
        .name()
        .await
        .map_err(|e| ApiError::service_unavailable(format!("Failed to query name: {}", e)))?;

    let symbol = contract
        .symbol()
        .await
        .map_err(|e| ApiError::service_unavailable(format!("Failed to query symbol: {}", e)))?;

    let decimals = contract
        .decimals()
        .await
        .map_err(|e| ApiError::service_unavailable(format!("Failed to query decimals: {}", e)))?;

    let total_supply = contract.total_supply().await.map_err(|e| {
        ApiError::service_unavailable(format!("Failed to query total supply: {}", e))
    })?;

    // Version is optional; older deployments do not expose it
    let version = contract.version().await.ok();

    Ok(Json(TokenInfoResponse {
        name,
        symbol,
        decimals,
        total_supply: format_units(total_supply, decimals),
        version,
    }))
}

/// Get the token balance for an address.
#[utoipa::path(
    get,
    path = "/api/token/balance/{address}",
    tag = "Token",
    params(
        ("address" = String, Path, description = "Address to query (0x + 40 hex chars)")
    ),
    responses(
        (status = 200, description = "Balance", body = BalanceResponse),
        (status = 400, description = "Invalid address"),
        (status = 503, description = "Blockchain network unavailable")
    )
)]
pub async fn token_balance(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<BalanceResponse>, ApiError> {
    validate_address(&address)?;
    let addr = parse_address(&address)
        .map_err(|e| ApiError::bad_request(format!("Invalid address: {}", e)))?;

    let contract = state.contract();

    let balance = contract
        .balance_of(addr)
        .await
        .map_err(|e| ApiError::service_unavailable(format!("Failed to query balance: {}", e)))?;

    // Decimals and symbol are best-effort; fall back rather than fail the
    // balance query
    let decimals = contract.decimals().await.unwrap_or(18);
    let symbol = contract.symbol().await.unwrap_or_default();

    Ok(Json(BalanceResponse {
        address,
        balance: format_units(balance, decimals),
        symbol,
    }))
}

/// Get the resume document stored in the contract.
#[utoipa::path(
    get,
    path = "/api/resume",
    tag = "Token",
    responses(
        (status = 200, description = "Resume document", body = ResumeResponse),
        (status = 503, description = "Blockchain network unavailable")
    )
)]
pub async fn resume(State(state): State<AppState>) -> Result<Json<ResumeResponse>, ApiError> {
    let resume = state
        .contract()
        .resume()
        .await
        .map_err(|e| ApiError::service_unavailable(format!("Failed to query resume: {}", e)))?;

    Ok(Json(ResumeResponse { resume }))
}
