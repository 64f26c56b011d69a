// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SensorHub: IoT device fleet management hub.
//!
//! Ingests high-rate device telemetry behind sliding-window rate limits and
//! queue-depth backpressure, evaluates alert rules synchronously on the
//! ingest path, orchestrates firmware updates as compensating sagas, and
//! serves fleet analytics — all over a linearizable-per-key shared store.

pub mod config;
pub mod error;
pub mod model;
pub mod runtime;
pub mod service;
pub mod state;
pub mod store;
pub mod transport;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::HubConfig;
use crate::state::HubState;
use crate::store::kv::{Kv, MemoryStore};
use crate::transport::build_router;

/// Run the hub until shutdown.
pub async fn run(config: HubConfig) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let shutdown = CancellationToken::new();

    let kv: Arc<dyn Kv> = Arc::new(MemoryStore::new());
    let state = Arc::new(HubState::new(config, kv, shutdown.clone()));
    state.bus.start().await;

    // Ctrl-C triggers the same graceful path as an orchestrated stop.
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("shutdown signal received");
                shutdown.cancel();
            }
        });
    }

    tracing::info!("sensorhub listening on {addr}");
    let router = build_router(Arc::clone(&state));
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .await?;

    state.bus.stop().await;
    Ok(())
}
