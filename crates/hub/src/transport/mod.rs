// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP transport for the hub.

pub mod alerts;
pub mod analytics;
pub mod devices;
pub mod firmware;
pub mod guard;
pub mod telemetry;

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::HubState;

/// Build the axum `Router` with all hub routes. The telemetry ingress
/// guards wrap the router so the global rate gate runs before the
/// queue-depth shed, and both run before any handler.
pub fn build_router(state: Arc<HubState>) -> Router {
    Router::new()
        // Health (no gating)
        .route("/health", get(health))
        // Devices
        .route("/devices", post(devices::register).get(devices::list))
        .route("/devices/{id}", get(devices::get).patch(devices::update))
        // Telemetry
        .route("/telemetry/point", post(telemetry::ingest_point))
        .route("/telemetry/batch", post(telemetry::ingest_batch))
        .route("/telemetry/{device_id}", get(telemetry::query))
        .route("/telemetry/{device_id}/{metric}/latest", get(telemetry::latest))
        // Alert rules and alerts
        .route("/alerts/rules", post(alerts::create_rule).get(alerts::list_rules))
        .route("/alerts/rules/{id}", get(alerts::get_rule))
        .route("/alerts", get(alerts::list))
        .route("/alerts/{id}/acknowledge", post(alerts::acknowledge))
        .route("/alerts/{id}/resolve", post(alerts::resolve))
        // Firmware
        .route("/firmware/register", post(firmware::register))
        .route("/firmware/versions", get(firmware::versions))
        .route("/firmware/updates", post(firmware::initiate_update))
        .route("/firmware/updates/{id}", get(firmware::get_update))
        // Analytics
        .route("/analytics/devices/{id}", get(analytics::device))
        .route("/analytics/fleet", get(analytics::fleet))
        .route("/analytics/groups/{id}", get(analytics::group))
        // Ingress guards (outermost layer runs first)
        .layer(middleware::from_fn_with_state(state.clone(), guard::backpressure_guard))
        .layer(middleware::from_fn_with_state(state.clone(), guard::global_rate_guard))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// `GET /health`
async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "healthy", "service": "sensorhub" }))
}
