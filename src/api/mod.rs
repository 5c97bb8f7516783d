// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 QXB Gateway Contributors

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{error::ApiError, state::AppState};

pub mod health;
pub mod rewards;
pub mod token;
pub mod transfer;
pub mod users;

/// Validate an Ethereum address string (0x + 40 hex chars).
pub(crate) fn validate_address(address: &str) -> Result<(), ApiError> {
    if !address.starts_with("0x") {
        return Err(ApiError::bad_request("Address must start with 0x"));
    }
    if address.len() != 42 {
        return Err(ApiError::bad_request(
            "Address must be 42 characters (0x + 40 hex)",
        ));
    }
    if !address[2..].chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ApiError::bad_request(
            "Address must contain only hex characters",
        ));
    }
    Ok(())
}

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/token/info", get(token::token_info))
        .route("/token/balance/{address}", get(token::token_balance))
        .route("/token/transfer", post(transfer::transfer))
        .route("/resume", get(token::resume))
        .route("/reward/status/{address}", get(rewards::reward_status))
        .route("/reward/claim", post(rewards::claim_reward))
        .route("/auth/register", post(users::register))
        .route("/auth/login", post(users::login))
        .route("/auth/me", get(users::me));

    let routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api_routes)
        .with_state(state);

    Router::new()
        .merge(routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        token::token_info,
        token::token_balance,
        token::resume,
        rewards::reward_status,
        rewards::claim_reward,
        users::register,
        users::login,
        users::me,
        transfer::transfer
    ),
    components(
        schemas(
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse,
            token::TokenInfoResponse,
            token::BalanceResponse,
            token::ResumeResponse,
            rewards::RewardStatusResponse,
            rewards::ClaimRequest,
            rewards::SubmissionResponse,
            users::RegisterRequest,
            users::LoginRequest,
            users::AuthResponse,
            users::UserInfoResponse,
            transfer::TransferRequest
        )
    ),
    tags(
        (name = "Health", description = "Service health probes"),
        (name = "Token", description = "Token state queries and transfers"),
        (name = "Rewards", description = "Daily reward status and claims"),
        (name = "Auth", description = "Registration, login, and profile")
    )
)]
struct ApiDoc;
