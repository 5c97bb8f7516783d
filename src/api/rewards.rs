// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 QXB Gateway Contributors

//! Daily reward endpoints.
//!
//! Claim submission holds a per-user per-day lock so the pending window
//! between broadcast and confirmation cannot produce duplicate claims. The
//! lock is released if anything after acquisition fails, and kept for the
//! rest of the UTC day once the transaction is broadcast.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    auth::{unwrap_key, OptionalAuth},
    blockchain::{parse_address, ChainClient, SendResult},
    error::ApiError,
    state::AppState,
};

use super::validate_address;

/// Reward eligibility for an address.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RewardStatusResponse {
    /// Queried address
    pub address: String,
    /// Whether the address may claim today
    pub can_claim: bool,
    /// UTC day index of the last successful claim (0 if never)
    pub last_claim_day: u64,
    /// Next UTC day index on which a claim becomes possible
    pub next_claim_day: u64,
}

/// Request to claim the daily reward.
///
/// Authenticated users supply their password to unlock the stored custodial
/// key. The raw private key field is a stateless compatibility path and skips
/// the claim lock.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ClaimRequest {
    /// Hex private key (0x prefix tolerated); used when not relying on the
    /// stored custodial key
    #[serde(default)]
    pub private_key: Option<String>,
    /// Account password, to decrypt the stored custodial key
    #[serde(default)]
    pub password: Option<String>,
}

/// Submission result for claim and transfer transactions.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SubmissionResponse {
    /// Transaction hash
    pub tx_hash: String,
    /// Submission status (always "pending" at this point)
    pub status: String,
    /// Block explorer URL
    pub explorer_url: String,
}

impl From<SendResult> for SubmissionResponse {
    fn from(result: SendResult) -> Self {
        Self {
            tx_hash: result.tx_hash,
            status: "pending".to_string(),
            explorer_url: result.explorer_url,
        }
    }
}

/// Current UTC day index (Unix time / 86400).
fn current_claim_day() -> u64 {
    (Utc::now().timestamp() / 86_400) as u64
}

/// Get the daily reward status for an address.
#[utoipa::path(
    get,
    path = "/api/reward/status/{address}",
    tag = "Rewards",
    params(
        ("address" = String, Path, description = "Address to query (0x + 40 hex chars)")
    ),
    responses(
        (status = 200, description = "Reward status", body = RewardStatusResponse),
        (status = 400, description = "Invalid address"),
        (status = 503, description = "Blockchain network unavailable")
    )
)]
pub async fn reward_status(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<RewardStatusResponse>, ApiError> {
    validate_address(&address)?;
    let addr = parse_address(&address)
        .map_err(|e| ApiError::bad_request(format!("Invalid address: {}", e)))?;

    let contract = state.contract();

    let eligibility = contract.can_claim_daily_reward(addr).await.map_err(|e| {
        ApiError::service_unavailable(format!("Failed to query reward status: {}", e))
    })?;

    // Last claim day is informational; fall back to 0 rather than fail
    let last_claim_day = contract.last_claim_day(addr).await.unwrap_or(0);

    Ok(Json(RewardStatusResponse {
        address,
        can_claim: eligibility.can_claim,
        last_claim_day,
        next_claim_day: eligibility.next_claim_day,
    }))
}

/// Claim the daily reward.
///
/// Authenticated callers use their stored custodial key (password required);
/// anonymous callers may supply a raw private key.
#[utoipa::path(
    post,
    path = "/api/reward/claim",
    tag = "Rewards",
    request_body = ClaimRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Claim submitted", body = SubmissionResponse),
        (status = 400, description = "Invalid request, wrong password, or claim already submitted today"),
        (status = 503, description = "Blockchain network unavailable")
    )
)]
pub async fn claim_reward(
    OptionalAuth(user): OptionalAuth,
    State(state): State<AppState>,
    Json(request): Json<ClaimRequest>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    let password = request.password.as_deref().filter(|p| !p.is_empty());

    // Preferred path: authenticated user with stored custodial key
    if let (Some(user), Some(password)) = (&user, password) {
        let claim_day = current_claim_day();

        if state
            .db
            .is_claim_locked(user.user_id, claim_day)
            .map_err(|e| ApiError::internal(format!("Failed to check claim lock: {}", e)))?
        {
            return Err(already_submitted());
        }

        if !state
            .db
            .try_acquire_claim_lock(user.user_id, claim_day)
            .map_err(|e| ApiError::internal(format!("Failed to acquire claim lock: {}", e)))?
        {
            return Err(already_submitted());
        }

        // Lock held from here on: release on any failure, keep on success so
        // the same day cannot be submitted twice while the tx is pending.
        return match claim_with_stored_key(&state, user.user_id, password).await {
            Ok(result) => Ok(Json(result.into())),
            Err(err) => {
                if let Err(release_err) = state.db.release_claim_lock(user.user_id, claim_day) {
                    tracing::warn!(
                        user_id = user.user_id,
                        claim_day,
                        error = %release_err,
                        "failed to release claim lock after error"
                    );
                }
                Err(err)
            }
        };
    }

    // Compatibility path: caller supplies the private key directly
    if let Some(private_key) = request.private_key.as_deref().filter(|k| !k.is_empty()) {
        let signer = ChainClient::create_signer(private_key)
            .map_err(|e| ApiError::bad_request(format!("Invalid private key: {}", e)))?;

        let from = signer.address();
        let sender = state
            .tx_sender(ChainClient::create_wallet(signer))
            .map_err(|e| ApiError::service_unavailable(format!("Failed to connect: {}", e)))?;

        let result = sender
            .send_claim(from)
            .await
            .map_err(|e| ApiError::service_unavailable(format!("Claim failed: {}", e)))?;

        return Ok(Json(result.into()));
    }

    Err(ApiError::bad_request(
        "Either a password (logged-in users) or a private key must be provided",
    ))
}

fn already_submitted() -> ApiError {
    ApiError::bad_request("Reward already submitted today; wait for on-chain confirmation")
}

/// Decrypt the stored key and submit the claim. The caller owns the lock.
async fn claim_with_stored_key(
    state: &AppState,
    user_id: u64,
    password: &str,
) -> Result<SendResult, ApiError> {
    let stored = state
        .db
        .get_user(user_id)
        .map_err(|e| ApiError::internal(format!("Failed to load user: {}", e)))?
        .ok_or_else(|| ApiError::internal("User record missing"))?;

    let key_bytes = unwrap_key(password, &stored.enc_priv_key_b64, &stored.enc_salt_b64)
        .map_err(|_| ApiError::bad_request("Wrong password or decryption failed"))?;

    let signer = alloy::signers::local::PrivateKeySigner::from_slice(&key_bytes)
        .map_err(|e| ApiError::internal(format!("Failed to parse stored key: {}", e)))?;

    let from = signer.address();
    let sender = state
        .tx_sender(ChainClient::create_wallet(signer))
        .map_err(|e| ApiError::service_unavailable(format!("Failed to connect: {}", e)))?;

    sender
        .send_claim(from)
        .await
        .map_err(|e| ApiError::service_unavailable(format!("Claim failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::test_state;

    #[tokio::test]
    async fn claim_without_credentials_is_rejected() {
        let (state, _dir) = test_state();

        let result = claim_reward(
            OptionalAuth(None),
            State(state),
            Json(ClaimRequest {
                private_key: None,
                password: None,
            }),
        )
        .await;

        let err = result.err().unwrap();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn claim_with_garbage_private_key_is_rejected() {
        let (state, _dir) = test_state();

        let result = claim_reward(
            OptionalAuth(None),
            State(state),
            Json(ClaimRequest {
                private_key: Some("zzzz".to_string()),
                password: None,
            }),
        )
        .await;

        let err = result.err().unwrap();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn second_claim_same_day_hits_the_lock() {
        let (state, _dir) = test_state();
        let day = current_claim_day();

        // Simulate a successful earlier submission holding the lock
        assert!(state.db.try_acquire_claim_lock(1, day).unwrap());

        let user = crate::auth::AuthenticatedUser {
            user_id: 1,
            email: "t@example.com".to_string(),
        };
        let result = claim_reward(
            OptionalAuth(Some(user)),
            State(state),
            Json(ClaimRequest {
                private_key: None,
                password: Some("pw".to_string()),
            }),
        )
        .await;

        let err = result.err().unwrap();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
        assert!(err.message.contains("already submitted"));
    }

    #[tokio::test]
    async fn failed_decrypt_releases_the_lock() {
        let (state, _dir) = test_state();

        // Register a user through the db layer with a wrapped key
        let wrapped = crate::auth::wrap_key("right-password", &[9u8; 32]).unwrap();
        let record = crate::auth::hash_password("right-password").unwrap();
        let user = state
            .db
            .create_user(crate::storage::NewUser {
                email: "claim@example.com".to_string(),
                address: "0x405e2ea956ea490bf3d4bd734dc334a1d42b35b9".to_string(),
                enc_priv_key_b64: wrapped.ciphertext_b64,
                enc_salt_b64: wrapped.salt_b64,
                pass_salt_b64: record.salt_b64,
                password_hash_b64: record.hash_b64,
            })
            .unwrap();

        let auth_user = crate::auth::AuthenticatedUser {
            user_id: user.user_id,
            email: user.email.clone(),
        };
        let result = claim_reward(
            OptionalAuth(Some(auth_user)),
            State(state.clone()),
            Json(ClaimRequest {
                private_key: None,
                password: Some("wrong-password".to_string()),
            }),
        )
        .await;

        let err = result.err().unwrap();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);

        // The lock must have been rolled back so a retry is possible
        let day = current_claim_day();
        assert!(!state.db.is_claim_locked(user.user_id, day).unwrap());
    }

    #[test]
    fn submission_response_is_pending() {
        let result = SendResult {
            tx_hash: "0xabc".to_string(),
            explorer_url: "https://sepolia.etherscan.io/tx/0xabc".to_string(),
        };
        let response: SubmissionResponse = result.into();
        assert_eq!(response.status, "pending");
        assert_eq!(response.tx_hash, "0xabc");
    }

    #[test]
    fn claim_day_matches_unix_day_arithmetic() {
        let day = current_claim_day();
        let expected = (Utc::now().timestamp() / 86_400) as u64;
        // Equal unless the test straddles a day boundary
        assert!(day == expected || day + 1 == expected);
    }
}
