// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Telemetry streams: per-(device, metric) sorted sets scored by whole
//! seconds, with a configured retention TTL and a per-device running count.

use std::sync::Arc;
use std::time::Duration;

use crate::error::HubError;
use crate::model::TelemetryPoint;
use crate::store::keys;
use crate::store::kv::{Kv, KvOp};

pub struct TelemetryStore {
    kv: Arc<dyn Kv>,
    retention: Duration,
}

impl TelemetryStore {
    pub fn new(kv: Arc<dyn Kv>, retention_seconds: u64) -> Self {
        Self { kv, retention: Duration::from_secs(retention_seconds) }
    }

    fn point_ops(&self, point: &TelemetryPoint) -> Result<Vec<KvOp>, HubError> {
        let record = serde_json::to_string(point)
            .map_err(|e| HubError::Transient(format!("encode telemetry point: {e}")))?;
        let stream = keys::telemetry(&point.device_id, &point.metric);
        Ok(vec![
            KvOp::ZAdd { key: stream.clone(), member: record, score: point.score() },
            KvOp::Expire { key: stream, ttl: self.retention },
            KvOp::SAdd {
                key: keys::telemetry_metrics(&point.device_id),
                member: point.metric.clone(),
            },
        ])
    }

    pub async fn save_point(&self, point: &TelemetryPoint) -> Result<(), HubError> {
        let mut ops = self.point_ops(point)?;
        ops.push(KvOp::IncrBy { key: keys::telemetry_count(&point.device_id), delta: 1 });
        self.kv.pipeline(ops).await
    }

    /// Persist a whole batch in one pipeline; the count is bumped once.
    pub async fn save_batch(
        &self,
        device_id: &str,
        points: &[TelemetryPoint],
    ) -> Result<(), HubError> {
        let mut ops = Vec::with_capacity(points.len() * 3 + 1);
        for point in points {
            ops.extend(self.point_ops(point)?);
        }
        if !points.is_empty() {
            ops.push(KvOp::IncrBy {
                key: keys::telemetry_count(device_id),
                delta: points.len() as i64,
            });
        }
        self.kv.pipeline(ops).await
    }

    /// Range query, newest first. With no metric, all of the device's
    /// streams are merged.
    pub async fn query(
        &self,
        device_id: &str,
        metric: Option<&str>,
        start_ms: Option<u64>,
        end_ms: Option<u64>,
        limit: usize,
    ) -> Result<Vec<TelemetryPoint>, HubError> {
        let metrics = match metric {
            Some(m) => vec![m.to_owned()],
            None => self.kv.smembers(&keys::telemetry_metrics(device_id)).await?,
        };

        let min = start_ms.map_or(0, |ms| ms / 1000);
        let max = end_ms.map_or(u64::MAX, |ms| ms / 1000);

        let mut points = Vec::new();
        for m in metrics {
            let raw = self
                .kv
                .zrange_by_score(&keys::telemetry(device_id, &m), min, max, limit)
                .await?;
            for record in raw {
                let point: TelemetryPoint = serde_json::from_str(&record)
                    .map_err(|e| HubError::Transient(format!("decode telemetry point: {e}")))?;
                points.push(point);
            }
        }

        points.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms));
        points.truncate(limit);
        Ok(points)
    }

    pub async fn latest(
        &self,
        device_id: &str,
        metric: &str,
    ) -> Result<Option<TelemetryPoint>, HubError> {
        let raw = self.kv.zrange(&keys::telemetry(device_id, metric), -1, -1).await?;
        match raw.into_iter().next() {
            Some(record) => serde_json::from_str(&record)
                .map(Some)
                .map_err(|e| HubError::Transient(format!("decode telemetry point: {e}"))),
            None => Ok(None),
        }
    }

    pub async fn message_count(&self, device_id: &str) -> Result<u64, HubError> {
        match self.kv.get(&keys::telemetry_count(device_id)).await? {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| HubError::Transient(format!("non-numeric count for {device_id}"))),
            None => Ok(0),
        }
    }
}

#[cfg(test)]
#[path = "telemetry_tests.rs"]
mod tests;
