// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test harness for end-to-end scenario tests.
//!
//! Builds the full hub — composition root, router, in-memory store — and
//! serves it through `axum_test::TestServer`. The `HubState` handle stays
//! available so scenarios can read the durable event streams the way an
//! operator would replay them.

use std::sync::Arc;

use axum_test::TestServer;
use tokio_util::sync::CancellationToken;

use sensorhub::config::HubConfig;
use sensorhub::state::{epoch_ms, HubState};
use sensorhub::store::kv::MemoryStore;
use sensorhub::transport::build_router;

pub struct TestHub {
    pub state: Arc<HubState>,
    pub server: TestServer,
}

impl TestHub {
    pub fn new(config: HubConfig) -> anyhow::Result<Self> {
        let state =
            Arc::new(HubState::new(config, Arc::new(MemoryStore::new()), CancellationToken::new()));
        let server = TestServer::new(build_router(Arc::clone(&state)))
            .map_err(|e| anyhow::anyhow!("test server: {e}"))?;
        Ok(Self { state, server })
    }

    pub fn with_defaults() -> anyhow::Result<Self> {
        Self::new(HubConfig::default())
    }

    /// Register a device and return its id.
    pub async fn register_device(
        &self,
        serial: &str,
        idempotency_key: &str,
    ) -> anyhow::Result<String> {
        let resp = self
            .server
            .post("/devices")
            .add_header("idempotency-key", idempotency_key)
            .json(&serde_json::json!({
                "serial_number": serial,
                "device_type": "sensor",
                "firmware_version": "1.0.0",
            }))
            .await;
        anyhow::ensure!(
            resp.status_code() == axum::http::StatusCode::CREATED,
            "registration failed: {}",
            resp.status_code()
        );
        let body = resp.json::<serde_json::Value>();
        body["id"]
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| anyhow::anyhow!("registration response missing id"))
    }

    /// A telemetry point body stamped with the current time.
    pub fn point(device_id: &str, metric: &str, value: f64) -> serde_json::Value {
        serde_json::json!({
            "device_id": device_id,
            "timestamp_ms": epoch_ms(),
            "metric": metric,
            "value": value,
        })
    }

    /// Count durable events of one type on a topic.
    pub async fn event_count(&self, topic: &str, event_type: &str) -> anyhow::Result<usize> {
        let events = self
            .state
            .events
            .events(topic, None, 10_000)
            .await
            .map_err(|e| anyhow::anyhow!("event replay: {e}"))?;
        Ok(events.iter().filter(|e| e.event_type == event_type).count())
    }
}
