// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 QXB Gateway Contributors

//! User registration, login, and profile endpoints.
//!
//! Registration generates a custodial secp256k1 keypair. The private key is
//! wrapped under the user's password before it touches storage; losing the
//! password means losing the key.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    auth::{hash_password, verify_password, wrap_key, Auth},
    error::ApiError,
    state::AppState,
    storage::{DbError, NewUser},
};

/// Registration request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// User email (unique, case-insensitive)
    pub email: String,
    /// Account password
    pub password: String,
}

/// Login request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// User email
    pub email: String,
    /// Account password
    pub password: String,
}

/// Response for register and login.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthResponse {
    /// User id
    pub user_id: u64,
    /// User email
    pub email: String,
    /// Custodial on-chain address
    pub address: String,
    /// Bearer token for subsequent requests
    pub token: String,
}

/// Response for GET /api/auth/me.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserInfoResponse {
    /// User id
    pub user_id: u64,
    /// User email
    pub email: String,
    /// Custodial on-chain address
    pub address: String,
}

/// Register a new user.
///
/// Generates a custodial keypair and wraps the private key under the
/// password.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "User created", body = AuthResponse),
        (status = 400, description = "Missing email or password"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    if request.email.is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }

    // Generate the custodial keypair
    let (key_bytes, address) = generate_keypair();

    let password_record = hash_password(&request.password)
        .map_err(|e| ApiError::internal(format!("Password hashing failed: {}", e)))?;

    let wrapped = wrap_key(&request.password, &key_bytes)
        .map_err(|e| ApiError::internal(format!("Key wrapping failed: {}", e)))?;

    let user = state
        .db
        .create_user(NewUser {
            email: request.email,
            address,
            enc_priv_key_b64: wrapped.ciphertext_b64,
            enc_salt_b64: wrapped.salt_b64,
            pass_salt_b64: password_record.salt_b64,
            password_hash_b64: password_record.hash_b64,
        })
        .map_err(|e| match e {
            DbError::AlreadyExists(_) => ApiError::conflict("Email already registered"),
            _ => ApiError::internal(format!("Failed to create user: {}", e)),
        })?;

    let token = state
        .jwt
        .issue(user.user_id, &user.email)
        .map_err(|e| ApiError::internal(format!("Failed to issue token: {}", e)))?;

    tracing::info!(user_id = user.user_id, address = %user.address, "user registered");

    Ok(Json(AuthResponse {
        user_id: user.user_id,
        email: user.email,
        address: user.address,
        token,
    }))
}

/// Log in with email and password.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Missing email or password"),
        (status = 401, description = "Invalid email or password")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    if request.email.is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }

    // Unknown email and wrong password are deliberately indistinguishable
    let user = state
        .db
        .get_user_by_email(&request.email)
        .map_err(|e| ApiError::internal(format!("Failed to load user: {}", e)))?
        .ok_or_else(invalid_credentials)?;

    if !verify_password(
        &request.password,
        &user.password_hash_b64,
        &user.pass_salt_b64,
    ) {
        return Err(invalid_credentials());
    }

    let token = state
        .jwt
        .issue(user.user_id, &user.email)
        .map_err(|e| ApiError::internal(format!("Failed to issue token: {}", e)))?;

    Ok(Json(AuthResponse {
        user_id: user.user_id,
        email: user.email,
        address: user.address,
        token,
    }))
}

fn invalid_credentials() -> ApiError {
    ApiError::unauthorized("Invalid email or password")
}

/// Generate a secp256k1 keypair and derive the Ethereum address.
///
/// Ethereum addresses are derived by:
/// 1. Generate secp256k1 private key
/// 2. Get uncompressed public key (65 bytes: 0x04 || x || y)
/// 3. Take keccak256 hash of the public key (without 0x04 prefix, so 64 bytes)
/// 4. Take the last 20 bytes of the hash
/// 5. Encode as hex with 0x prefix (42 characters total)
///
/// Returns `(private_key_bytes, address)`; the raw key bytes go straight to
/// the key-wrapping layer.
fn generate_keypair() -> (Vec<u8>, String) {
    use alloy::primitives::keccak256;
    use k256::ecdsa::SigningKey;
    use k256::elliptic_curve::rand_core::OsRng;

    let signing_key = SigningKey::random(&mut OsRng);
    let verifying_key = signing_key.verifying_key();

    // Uncompressed public key bytes (65 bytes: 0x04 prefix + x,y coordinates)
    let public_key_uncompressed = verifying_key.to_encoded_point(false);
    let public_key_bytes = public_key_uncompressed.as_bytes();

    // Hash the public key coordinates (skip 0x04 prefix)
    let hash = keccak256(&public_key_bytes[1..]);
    let address = format!("0x{}", alloy::hex::encode(&hash[12..]));

    (signing_key.to_bytes().to_vec(), address)
}

/// Get the current authenticated user's information.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User information", body = UserInfoResponse),
        (status = 401, description = "Unauthorized - invalid or missing token")
    )
)]
pub async fn me(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<UserInfoResponse>, ApiError> {
    let stored = state
        .db
        .get_user(user.user_id)
        .map_err(|e| ApiError::internal(format!("Failed to load user: {}", e)))?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(UserInfoResponse {
        user_id: stored.user_id,
        email: stored.email,
        address: stored.address,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{unwrap_key, AuthenticatedUser};
    use crate::state::test_support::test_state;

    async fn register_user(state: &AppState, email: &str, password: &str) -> AuthResponse {
        let response = register(
            State(state.clone()),
            Json(RegisterRequest {
                email: email.to_string(),
                password: password.to_string(),
            }),
        )
        .await
        .unwrap();
        response.0
    }

    #[tokio::test]
    async fn register_creates_user_with_custodial_key() {
        let (state, _dir) = test_state();
        let response = register_user(&state, "alice@example.com", "hunter2").await;

        assert_eq!(response.user_id, 1);
        assert!(response.address.starts_with("0x"));
        assert!(!response.token.is_empty());

        // The issued token is immediately usable
        let claims = state.jwt.verify(&response.token).unwrap();
        assert_eq!(claims.user_id, 1);

        // The stored wrapped key opens with the password and derives the
        // advertised address
        let stored = state.db.get_user(1).unwrap().unwrap();
        let key_bytes =
            unwrap_key("hunter2", &stored.enc_priv_key_b64, &stored.enc_salt_b64).unwrap();
        let signer = alloy::signers::local::PrivateKeySigner::from_slice(&key_bytes).unwrap();
        assert_eq!(
            format!("{:?}", signer.address()).to_lowercase(),
            stored.address.to_lowercase()
        );
    }

    #[test]
    fn generate_keypair_produces_valid_ethereum_address() {
        let (key_bytes, address) = generate_keypair();

        assert_eq!(key_bytes.len(), 32);
        assert!(address.starts_with("0x"));
        assert_eq!(address.len(), 42);
        assert!(address[2..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generate_keypair_produces_unique_addresses() {
        let (_, a) = generate_keypair();
        let (_, b) = generate_keypair();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn register_rejects_missing_fields() {
        let (state, _dir) = test_state();

        let result = register(
            State(state.clone()),
            Json(RegisterRequest {
                email: String::new(),
                password: "pw".to_string(),
            }),
        )
        .await;
        assert!(result.is_err());

        let result = register(
            State(state),
            Json(RegisterRequest {
                email: "a@b.c".to_string(),
                password: String::new(),
            }),
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn register_duplicate_email_conflicts() {
        let (state, _dir) = test_state();
        register_user(&state, "dup@example.com", "pw1").await;

        let result = register(
            State(state),
            Json(RegisterRequest {
                email: "dup@example.com".to_string(),
                password: "pw2".to_string(),
            }),
        )
        .await;

        let err = result.err().unwrap();
        assert_eq!(err.status, axum::http::StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn login_roundtrip() {
        let (state, _dir) = test_state();
        let registered = register_user(&state, "bob@example.com", "s3cret").await;

        let response = login(
            State(state),
            Json(LoginRequest {
                email: "bob@example.com".to_string(),
                password: "s3cret".to_string(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.0.user_id, registered.user_id);
        assert_eq!(response.0.address, registered.address);
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let (state, _dir) = test_state();
        register_user(&state, "carol@example.com", "right").await;

        let wrong_password = login(
            State(state.clone()),
            Json(LoginRequest {
                email: "carol@example.com".to_string(),
                password: "wrong".to_string(),
            }),
        )
        .await
        .err()
        .unwrap();

        let unknown_email = login(
            State(state),
            Json(LoginRequest {
                email: "nobody@example.com".to_string(),
                password: "whatever".to_string(),
            }),
        )
        .await
        .err()
        .unwrap();

        assert_eq!(wrong_password.status, axum::http::StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_email.status, axum::http::StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_password.message, unknown_email.message);
    }

    #[tokio::test]
    async fn me_returns_profile() {
        let (state, _dir) = test_state();
        let registered = register_user(&state, "dave@example.com", "pw").await;

        let response = me(
            Auth(AuthenticatedUser {
                user_id: registered.user_id,
                email: registered.email.clone(),
            }),
            State(state),
        )
        .await
        .unwrap();

        assert_eq!(response.0.user_id, registered.user_id);
        assert_eq!(response.0.email, "dave@example.com");
        assert_eq!(response.0.address, registered.address);
    }
}
