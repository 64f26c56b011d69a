// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use super::TelemetryStore;
use crate::error::HubError;
use crate::model::TelemetryPoint;
use crate::store::kv::MemoryStore;

fn point(device_id: &str, metric: &str, timestamp_ms: u64, value: f64) -> TelemetryPoint {
    TelemetryPoint {
        device_id: device_id.to_owned(),
        timestamp_ms,
        metric: metric.to_owned(),
        value,
        unit: String::new(),
        metadata: serde_json::Value::Null,
    }
}

#[tokio::test]
async fn save_point_bumps_count_and_stores_latest() -> Result<(), HubError> {
    let kv = Arc::new(MemoryStore::new());
    let store = TelemetryStore::new(kv, 86400);

    store.save_point(&point("d-1", "temperature", 1_000_000, 21.5)).await?;
    store.save_point(&point("d-1", "temperature", 2_000_000, 22.5)).await?;

    assert_eq!(store.message_count("d-1").await?, 2);
    let latest = store.latest("d-1", "temperature").await?;
    assert_eq!(latest.map(|p| p.value), Some(22.5));
    assert!(store.latest("d-1", "humidity").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn batch_counts_once_per_point() -> Result<(), HubError> {
    let kv = Arc::new(MemoryStore::new());
    let store = TelemetryStore::new(kv, 86400);

    let points =
        vec![point("d-1", "temperature", 1_000_000, 20.0), point("d-1", "humidity", 1_000_000, 55.0)];
    store.save_batch("d-1", &points).await?;

    assert_eq!(store.message_count("d-1").await?, 2);
    Ok(())
}

#[tokio::test]
async fn query_merges_metrics_newest_first() -> Result<(), HubError> {
    let kv = Arc::new(MemoryStore::new());
    let store = TelemetryStore::new(kv, 86400);

    store.save_point(&point("d-1", "temperature", 1_000_000, 20.0)).await?;
    store.save_point(&point("d-1", "temperature", 3_000_000, 22.0)).await?;
    store.save_point(&point("d-1", "humidity", 2_000_000, 55.0)).await?;

    let all = store.query("d-1", None, None, None, 100).await?;
    let timestamps: Vec<u64> = all.iter().map(|p| p.timestamp_ms).collect();
    assert_eq!(timestamps, vec![3_000_000, 2_000_000, 1_000_000]);

    let temps = store.query("d-1", Some("temperature"), None, None, 100).await?;
    assert_eq!(temps.len(), 2);

    let windowed = store.query("d-1", None, Some(1_500_000), Some(2_500_000), 100).await?;
    assert_eq!(windowed.len(), 1);
    assert_eq!(windowed[0].metric, "humidity");

    let limited = store.query("d-1", None, None, None, 1).await?;
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].timestamp_ms, 3_000_000);
    Ok(())
}

#[tokio::test]
async fn count_defaults_to_zero() -> Result<(), HubError> {
    let kv = Arc::new(MemoryStore::new());
    let store = TelemetryStore::new(kv, 86400);
    assert_eq!(store.message_count("missing").await?, 0);
    Ok(())
}
