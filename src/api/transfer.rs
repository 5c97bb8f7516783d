// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 QXB Gateway Contributors

//! Authenticated token transfers from the custodial wallet.

use axum::{extract::State, Json};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    auth::{unwrap_key, Auth},
    blockchain::{parse_address, parse_base_units, ChainClient},
    error::ApiError,
    state::AppState,
};

use super::rewards::SubmissionResponse;
use super::validate_address;

/// Transfer request. The amount is a base-10 integer in the token's smallest
/// units.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TransferRequest {
    /// Recipient address (0x + 40 hex chars)
    pub to: String,
    /// Amount in base units (decimal integer string)
    pub amount: String,
    /// Account password, to decrypt the stored custodial key
    pub password: String,
}

/// Transfer tokens from the authenticated user's custodial wallet.
#[utoipa::path(
    post,
    path = "/api/token/transfer",
    tag = "Token",
    request_body = TransferRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Transfer submitted", body = SubmissionResponse),
        (status = 400, description = "Invalid request or wrong password"),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "Insufficient balance"),
        (status = 503, description = "Blockchain network unavailable")
    )
)]
pub async fn transfer(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    if request.to.is_empty() || request.amount.is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request(
            "Recipient, amount, and password are required",
        ));
    }

    validate_address(&request.to)?;
    let to = parse_address(&request.to)
        .map_err(|e| ApiError::bad_request(format!("Invalid recipient address: {}", e)))?;

    let amount = parse_base_units(&request.amount)
        .map_err(|_| ApiError::bad_request("Invalid amount format"))?;

    // Decrypt the custodial key
    let stored = state
        .db
        .get_user(user.user_id)
        .map_err(|e| ApiError::internal(format!("Failed to load user: {}", e)))?
        .ok_or_else(|| ApiError::internal("User record missing"))?;

    let key_bytes = unwrap_key(
        &request.password,
        &stored.enc_priv_key_b64,
        &stored.enc_salt_b64,
    )
    .map_err(|_| ApiError::bad_request("Wrong password or decryption failed"))?;

    let signer = alloy::signers::local::PrivateKeySigner::from_slice(&key_bytes)
        .map_err(|e| ApiError::internal(format!("Failed to parse stored key: {}", e)))?;

    let from = signer.address();
    if from == to {
        return Err(ApiError::bad_request("Cannot transfer to yourself"));
    }

    // Balance pre-check so obviously doomed transfers fail before broadcast
    let token_balance = state
        .contract()
        .balance_of(from)
        .await
        .map_err(|e| ApiError::service_unavailable(format!("Failed to query balance: {}", e)))?;

    if token_balance < amount {
        return Err(ApiError::unprocessable("Insufficient balance"));
    }

    let sender = state
        .tx_sender(ChainClient::create_wallet(signer))
        .map_err(|e| ApiError::service_unavailable(format!("Failed to connect: {}", e)))?;

    let result = sender.send_transfer(from, to, amount).await.map_err(|e| {
        let msg = e.to_string();
        if msg.contains("insufficient funds") {
            ApiError::unprocessable("Insufficient balance for transaction fees")
        } else {
            ApiError::service_unavailable(format!("Transfer failed: {}", e))
        }
    })?;

    tracing::info!(
        user_id = user.user_id,
        tx_hash = %result.tx_hash,
        "transfer submitted"
    );

    Ok(Json(result.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthenticatedUser;
    use crate::state::test_support::test_state;

    fn auth(user_id: u64) -> Auth {
        Auth(AuthenticatedUser {
            user_id,
            email: "t@example.com".to_string(),
        })
    }

    #[tokio::test]
    async fn transfer_rejects_missing_fields() {
        let (state, _dir) = test_state();

        let result = transfer(
            auth(1),
            State(state),
            Json(TransferRequest {
                to: String::new(),
                amount: "100".to_string(),
                password: "pw".to_string(),
            }),
        )
        .await;

        let err = result.err().unwrap();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn transfer_rejects_bad_address() {
        let (state, _dir) = test_state();

        let result = transfer(
            auth(1),
            State(state),
            Json(TransferRequest {
                to: "0x1234".to_string(),
                amount: "100".to_string(),
                password: "pw".to_string(),
            }),
        )
        .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn transfer_rejects_non_integer_amount() {
        let (state, _dir) = test_state();

        let result = transfer(
            auth(1),
            State(state),
            Json(TransferRequest {
                to: "0x2222222222222222222222222222222222222222".to_string(),
                amount: "1.5".to_string(),
                password: "pw".to_string(),
            }),
        )
        .await;

        let err = result.err().unwrap();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn transfer_rejects_wrong_password_and_self_transfer() {
        let (state, _dir) = test_state();

        let registered = crate::api::users::register(
            State(state.clone()),
            Json(crate::api::users::RegisterRequest {
                email: "sender@example.com".to_string(),
                password: "pw".to_string(),
            }),
        )
        .await
        .unwrap()
        .0;

        // Wrong password fails before any chain interaction
        let result = transfer(
            auth(registered.user_id),
            State(state.clone()),
            Json(TransferRequest {
                to: "0x2222222222222222222222222222222222222222".to_string(),
                amount: "100".to_string(),
                password: "wrong".to_string(),
            }),
        )
        .await;
        let err = result.err().unwrap();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);

        // Sending to the custodial wallet's own address is rejected
        let result = transfer(
            auth(registered.user_id),
            State(state),
            Json(TransferRequest {
                to: registered.address.clone(),
                amount: "100".to_string(),
                password: "pw".to_string(),
            }),
        )
        .await;
        let err = result.err().unwrap();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
        assert!(err.message.contains("yourself"));
    }
}
