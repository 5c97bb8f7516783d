// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 QXB Gateway Contributors

use std::env;
use std::net::SocketAddr;

use qxb_gateway::api::router;
use qxb_gateway::blockchain::network_name;
use qxb_gateway::config::{Config, LOG_FORMAT_ENV};
use qxb_gateway::state::AppState;
use qxb_gateway::storage::GatewayDb;

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=debug"));

    let json = env::var(LOG_FORMAT_ENV)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    let config = Config::from_env();

    let db = GatewayDb::open(&config.db_path()).expect("Failed to open database");

    let state = AppState::new(&config, db).expect("Failed to initialize application state");

    // Probe the RPC endpoint so misconfiguration is visible at startup; the
    // service still comes up if the node is briefly unreachable.
    match state.chain.verify_connection().await {
        Ok(chain_id) => {
            tracing::info!(chain_id, network = network_name(chain_id), "connected to RPC node")
        }
        Err(e) => tracing::warn!(error = %e, "RPC node unreachable at startup"),
    }

    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Failed to parse bind address");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind server address");

    tracing::info!(%addr, "QXB gateway listening (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("HTTP server failed");

    tracing::info!("server stopped");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install shutdown signal handler");
    tracing::info!("shutdown signal received");
}
