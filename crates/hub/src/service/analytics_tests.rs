// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use super::AnalyticsService;
use crate::error::HubError;
use crate::model::{Alert, AlertSeverity, AlertStatus, Device, DeviceStatus, DeviceType, TelemetryPoint};
use crate::state::epoch_ms;
use crate::store::kv::MemoryStore;
use crate::store::{AlertStore, DeviceStore, FirmwareStore, TelemetryStore};

struct Fixture {
    analytics: AnalyticsService,
    devices: Arc<DeviceStore>,
    telemetry: Arc<TelemetryStore>,
    alerts: Arc<AlertStore>,
}

fn fixture() -> Fixture {
    let kv = Arc::new(MemoryStore::new());
    let devices = Arc::new(DeviceStore::new(kv.clone(), 64));
    let telemetry = Arc::new(TelemetryStore::new(kv.clone(), 86400));
    let alerts = Arc::new(AlertStore::new(kv.clone()));
    let firmware = Arc::new(FirmwareStore::new(kv));
    let analytics = AnalyticsService::new(
        Arc::clone(&devices),
        Arc::clone(&telemetry),
        Arc::clone(&alerts),
        firmware,
    );
    Fixture { analytics, devices, telemetry, alerts }
}

fn device(id: &str, status: DeviceStatus, group: Option<&str>, uptime_s: u64) -> Device {
    let registered = epoch_ms().saturating_sub(uptime_s * 1000);
    Device {
        id: id.to_owned(),
        serial_number: format!("SN-{id}"),
        device_type: DeviceType::Sensor,
        status,
        firmware_version: "1.0.0".to_owned(),
        metadata: serde_json::Value::Null,
        registered_at_ms: registered,
        last_seen_ms: if uptime_s > 0 { Some(registered + uptime_s * 1000) } else { None },
        location: None,
        group_id: group.map(str::to_owned),
    }
}

async fn ingest(telemetry: &TelemetryStore, device_id: &str, n: usize) -> Result<(), HubError> {
    for i in 0..n {
        telemetry
            .save_point(&TelemetryPoint {
                device_id: device_id.to_owned(),
                timestamp_ms: epoch_ms(),
                metric: "temperature".to_owned(),
                value: i as f64,
                unit: String::new(),
                metadata: serde_json::Value::Null,
            })
            .await?;
    }
    Ok(())
}

#[tokio::test]
async fn device_metrics_roll_up_counts_and_uptime() -> Result<(), HubError> {
    let f = fixture();
    f.devices.save(&device("d-1", DeviceStatus::Active, None, 120)).await?;
    ingest(&f.telemetry, "d-1", 3).await?;

    let metrics = f.analytics.device_metrics("d-1").await?;
    assert_eq!(metrics.message_count, 3);
    assert_eq!(metrics.uptime_seconds, 120);
    assert!(metrics.last_seen_ms.is_some());

    let err = f.analytics.device_metrics("missing").await.err();
    assert!(matches!(err, Some(HubError::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn fleet_counts_active_and_open_alerts() -> Result<(), HubError> {
    let f = fixture();
    f.devices.save(&device("d-1", DeviceStatus::Active, None, 100)).await?;
    f.devices.save(&device("d-2", DeviceStatus::Inactive, None, 0)).await?;
    ingest(&f.telemetry, "d-1", 2).await?;
    ingest(&f.telemetry, "d-2", 1).await?;

    f.alerts
        .save_alert(&Alert {
            id: "a-1".to_owned(),
            rule_id: "r-1".to_owned(),
            device_id: "d-1".to_owned(),
            severity: AlertSeverity::Warning,
            status: AlertStatus::Open,
            message: "m".to_owned(),
            value: 1.0,
            threshold: 0.0,
            triggered_at_ms: epoch_ms(),
            acknowledged_at_ms: None,
            resolved_at_ms: None,
        })
        .await?;

    let fleet = f.analytics.fleet().await?;
    assert_eq!(fleet.total_devices, 2);
    assert_eq!(fleet.active_devices, 1);
    assert_eq!(fleet.inactive_devices, 1);
    assert_eq!(fleet.total_messages, 3);
    assert_eq!(fleet.active_alerts, 1);
    assert_eq!(fleet.pending_updates, 0);
    assert_eq!(fleet.average_uptime_seconds, 50.0);
    Ok(())
}

#[tokio::test]
async fn group_rollup_only_counts_members() -> Result<(), HubError> {
    let f = fixture();
    f.devices.save(&device("d-1", DeviceStatus::Active, Some("g-1"), 60)).await?;
    f.devices.save(&device("d-2", DeviceStatus::Active, Some("g-2"), 60)).await?;
    ingest(&f.telemetry, "d-1", 5).await?;
    ingest(&f.telemetry, "d-2", 7).await?;

    let group = f.analytics.group("g-1").await?;
    assert_eq!(group.device_count, 1);
    assert_eq!(group.active_count, 1);
    assert_eq!(group.total_messages, 5);

    let empty = f.analytics.group("g-none").await?;
    assert_eq!(empty.device_count, 0);
    assert_eq!(empty.average_uptime_seconds, 0.0);
    Ok(())
}
