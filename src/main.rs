// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Rupee Ramp

use std::net::SocketAddr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rupeeramp_server::{
    api::router,
    config::{Config, LOG_FORMAT_ENV},
    kyc::KycGate,
    poller::RelayPoller,
    providers::aggregator::AggregatorClient,
    providers::gasless::GaslessRelayClient,
    providers::kyc::KycClient,
    providers::settlement::SettlementClient,
    session::SessionStore,
    settlement::SettlementInitiator,
    state::AppState,
    swap::SwapExecutor,
    wallet::LocalSigner,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = Config::from_env()?;

    let quotes = Arc::new(AggregatorClient::new(
        config.aggregator_base_url.clone(),
        config.aggregator_api_key.clone(),
    )?);
    let relay = Arc::new(GaslessRelayClient::new(
        config.gasless_relay_base_url.clone(),
    )?);
    let kyc_client = Arc::new(KycClient::new(config.kyc_base_url.clone())?);
    let settlement_client = Arc::new(SettlementClient::new(config.settlement_base_url.clone())?);
    let signer = Arc::new(LocalSigner::connect(
        &config.rpc_url,
        &config.dev_signer_key,
    )?);

    let state = AppState::new(
        SessionStore::new(config.session_cache_capacity),
        quotes,
        SwapExecutor::new(relay.clone()),
        KycGate::new(kyc_client, config.pan_name_match_threshold),
        SettlementInitiator::new(settlement_client),
        signer,
    );

    let shutdown = CancellationToken::new();
    let poller = RelayPoller::new(
        state.sessions.clone(),
        relay,
        config.relay_poll_interval,
        config.relay_max_poll_attempts,
    );
    let poller_handle = tokio::spawn(poller.run(shutdown.clone()));

    let app = router(state);
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Rupee Ramp server listening (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown.cancel();
    let _ = poller_handle.await;
    info!("shutdown complete");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    let json_logs = std::env::var(LOG_FORMAT_ENV)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install ctrl-c handler");
    info!("shutdown signal received");
}
