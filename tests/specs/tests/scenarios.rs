// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end scenarios over the full router and composition root.

use axum::http::StatusCode;

use hub_specs::TestHub;
use sensorhub::config::HubConfig;
use sensorhub::state::epoch_ms;

#[tokio::test]
async fn idempotent_registration_yields_one_identity_and_one_event() -> anyhow::Result<()> {
    let hub = TestHub::with_defaults()?;

    let first = hub.register_device("SN-A", "key-1").await?;
    let second = hub.register_device("SN-A", "key-2").await?;
    assert_eq!(first, second);

    assert_eq!(hub.event_count("device.lifecycle", "device.registered").await?, 1);
    Ok(())
}

#[tokio::test]
async fn rule_triggers_alert_on_ingest() -> anyhow::Result<()> {
    let hub = TestHub::with_defaults()?;
    let device_id = hub.register_device("SN-ALERT", "key").await?;

    let resp = hub
        .server
        .post("/alerts/rules")
        .json(&serde_json::json!({
            "device_id": device_id,
            "metric": "temperature",
            "operator": "gt",
            "threshold": 30.0,
            "severity": "critical",
        }))
        .await;
    assert_eq!(resp.status_code(), StatusCode::CREATED);

    let resp = hub
        .server
        .post("/telemetry/point")
        .json(&TestHub::point(&device_id, "temperature", 35.0))
        .await;
    assert_eq!(resp.status_code(), StatusCode::ACCEPTED);

    // Evaluation is synchronous with the request: the alert is queryable
    // as soon as the 202 lands.
    let alerts = hub.server.get("/alerts").await.json::<Vec<serde_json::Value>>();
    assert!(!alerts.is_empty());
    assert_eq!(alerts[0]["device_id"].as_str(), Some(device_id.as_str()));
    assert_eq!(alerts[0]["status"], "open");

    assert_eq!(hub.event_count("alert.triggered", "alert.new").await?, 1);
    Ok(())
}

#[tokio::test]
async fn acknowledge_stamps_and_removes_from_open_set() -> anyhow::Result<()> {
    let hub = TestHub::with_defaults()?;
    let device_id = hub.register_device("SN-ACK", "key").await?;

    hub.server
        .post("/alerts/rules")
        .json(&serde_json::json!({
            "device_id": device_id,
            "metric": "pressure",
            "operator": "lt",
            "threshold": 10.0,
            "severity": "warning",
        }))
        .await;
    hub.server
        .post("/telemetry/point")
        .json(&TestHub::point(&device_id, "pressure", 3.0))
        .await;

    let open = hub
        .server
        .get("/alerts")
        .add_query_param("status", "open")
        .await
        .json::<Vec<serde_json::Value>>();
    assert_eq!(open.len(), 1);
    let alert_id = open[0]["id"].as_str().map(str::to_owned).unwrap_or_default();

    let resp = hub.server.post(&format!("/alerts/{alert_id}/acknowledge")).await;
    assert_eq!(resp.status_code(), StatusCode::OK);
    let body = resp.json::<serde_json::Value>();
    assert_eq!(body["status"], "acknowledged");
    assert!(body["acknowledged_at_ms"].is_u64());

    let open = hub
        .server
        .get("/alerts")
        .add_query_param("status", "open")
        .await
        .json::<Vec<serde_json::Value>>();
    assert!(open.is_empty());
    Ok(())
}

#[tokio::test]
async fn fast_device_is_shed_within_budget_bounds() -> anyhow::Result<()> {
    let hub = TestHub::with_defaults()?;
    let device_id = hub.register_device("SN-FAST", "key").await?;

    let mut accepted = 0;
    let mut limited = 0;
    for i in 0..150 {
        let resp = hub
            .server
            .post("/telemetry/point")
            .json(&TestHub::point(&device_id, "temperature", i as f64))
            .await;
        match resp.status_code() {
            StatusCode::ACCEPTED => accepted += 1,
            StatusCode::TOO_MANY_REQUESTS => limited += 1,
            other => anyhow::bail!("unexpected status {other}"),
        }
    }

    assert!(accepted >= 1);
    assert!(limited >= 1);
    // The per-device budget is 100/60 s; allow a little slew for windows
    // sliding during the loop.
    assert!(accepted <= 105, "{accepted} accepted");
    Ok(())
}

#[tokio::test]
async fn firmware_saga_failure_rolls_back_and_publishes() -> anyhow::Result<()> {
    let hub = TestHub::with_defaults()?;
    let device_id = hub.register_device("SN-FW", "key").await?;

    let resp = hub
        .server
        .post("/firmware/register")
        .json(&serde_json::json!({
            "version": "2.0.0",
            "size_bytes": 8192,
            "checksum": "feedbeef",
            "release_notes": "new radio stack",
            "min_compatible_version": "1.0.0",
            "created_at_ms": epoch_ms(),
        }))
        .await;
    assert_eq!(resp.status_code(), StatusCode::CREATED);

    let resp = hub
        .server
        .post("/firmware/updates")
        .json(&serde_json::json!({ "device_id": device_id, "to_version": "2.0.0" }))
        .await;
    assert_eq!(resp.status_code(), StatusCode::CREATED);
    let update = resp.json::<serde_json::Value>();
    let update_id = update["id"].as_str().map(str::to_owned).unwrap_or_default();

    let stored = hub
        .server
        .get(&format!("/firmware/updates/{update_id}"))
        .await
        .json::<serde_json::Value>();
    let status = stored["status"].as_str().unwrap_or_default();
    assert!(status == "rolled_back" || status == "failed", "terminal status, got {status}");
    assert!(stored["error"].as_str().is_some());

    // The device kept its pre-saga firmware.
    let device = hub
        .server
        .get(&format!("/devices/{device_id}"))
        .await
        .json::<serde_json::Value>();
    assert_eq!(device["firmware_version"], "1.0.0");

    assert_eq!(hub.event_count("firmware.updates", "update.failed").await?, 1);
    assert_eq!(hub.event_count("firmware.updates", "update.completed").await?, 0);
    Ok(())
}

#[tokio::test]
async fn notifier_outage_never_blocks_alerting() -> anyhow::Result<()> {
    // No notifier URL configured: every dispatch attempt fails, and after
    // the threshold the breaker stops calling out entirely. Alert creation
    // must be unaffected throughout.
    let config = HubConfig { circuit_breaker_failure_threshold: 3, ..HubConfig::default() };
    let hub = TestHub::new(config)?;
    let device_id = hub.register_device("SN-CB", "key").await?;

    hub.server
        .post("/alerts/rules")
        .json(&serde_json::json!({
            "device_id": device_id,
            "metric": "temperature",
            "operator": "gt",
            "threshold": 30.0,
            "severity": "critical",
        }))
        .await;

    for i in 0..6 {
        let resp = hub
            .server
            .post("/telemetry/point")
            .json(&TestHub::point(&device_id, "temperature", 31.0 + i as f64))
            .await;
        assert_eq!(resp.status_code(), StatusCode::ACCEPTED);
    }

    let open = hub
        .server
        .get("/alerts")
        .add_query_param("status", "open")
        .await
        .json::<Vec<serde_json::Value>>();
    assert_eq!(open.len(), 6);
    assert_eq!(hub.event_count("alert.triggered", "alert.new").await?, 6);
    Ok(())
}

#[tokio::test]
async fn device_lifecycle_end_to_end() -> anyhow::Result<()> {
    let hub = TestHub::with_defaults()?;
    let device_id = hub.register_device("SN-LIFE", "key").await?;

    hub.server
        .post("/telemetry/point")
        .json(&TestHub::point(&device_id, "temperature", 25.5))
        .await;

    let device = hub
        .server
        .get(&format!("/devices/{device_id}"))
        .await
        .json::<serde_json::Value>();
    assert_eq!(device["status"], "active");

    let resp = hub
        .server
        .patch(&format!("/devices/{device_id}"))
        .json(&serde_json::json!({ "status": "decommissioned" }))
        .await;
    assert_eq!(resp.status_code(), StatusCode::OK);
    assert_eq!(resp.json::<serde_json::Value>()["status"], "decommissioned");

    let fleet = hub.server.get("/analytics/fleet").await.json::<serde_json::Value>();
    assert_eq!(fleet["total_devices"], 1);
    assert_eq!(fleet["active_devices"], 0);
    Ok(())
}
