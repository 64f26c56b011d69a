// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The telemetry ingest pipeline.
//!
//! Per point: per-device rate gate, durable persist, liveness touch,
//! synchronous alert evaluation, then event publish. The global rate gate
//! and queue-depth backpressure run earlier, as ingress filters in the
//! transport layer. A 202 is only ever returned after the point is
//! durably persisted.

use std::sync::Arc;

use crate::config::HubConfig;
use crate::error::HubError;
use crate::model::{TelemetryBatch, TelemetryPoint};
use crate::runtime::{EventBus, RateLimiter};
use crate::service::alert::AlertEngine;
use crate::service::device::DeviceRegistry;
use crate::store::TelemetryStore;

pub struct TelemetryPipeline {
    store: Arc<TelemetryStore>,
    registry: Arc<DeviceRegistry>,
    alerts: Arc<AlertEngine>,
    bus: Arc<EventBus>,
    limiter: Arc<RateLimiter>,
    batch_max_size: usize,
}

impl TelemetryPipeline {
    pub fn new(
        store: Arc<TelemetryStore>,
        registry: Arc<DeviceRegistry>,
        alerts: Arc<AlertEngine>,
        bus: Arc<EventBus>,
        limiter: Arc<RateLimiter>,
        config: &HubConfig,
    ) -> Self {
        Self { store, registry, alerts, bus, limiter, batch_max_size: config.telemetry_batch_max_size }
    }

    pub async fn ingest_point(&self, point: TelemetryPoint) -> Result<(), HubError> {
        let decision = self.limiter.check_device(&point.device_id).await?;
        if !decision.allowed {
            return Err(HubError::RateLimited(format!(
                "Rate limit exceeded for device {}",
                point.device_id
            )));
        }

        self.store.save_point(&point).await?;
        self.registry.mark_active(&point.device_id).await?;
        self.alerts.check_point(&point).await?;

        self.bus
            .publish(
                "telemetry.ingested",
                "telemetry.point",
                serde_json::json!({
                    "device_id": point.device_id,
                    "metric": point.metric,
                    "value": point.value,
                }),
            )
            .await
    }

    /// One rate probe covers the whole batch; points persist in a single
    /// pipeline and alerts are still evaluated per point.
    pub async fn ingest_batch(&self, batch: TelemetryBatch) -> Result<(), HubError> {
        if batch.points.is_empty() {
            return Err(HubError::Invalid("batch contains no points".into()));
        }
        if batch.points.len() > self.batch_max_size {
            return Err(HubError::Invalid(format!(
                "batch of {} points exceeds maximum of {}",
                batch.points.len(),
                self.batch_max_size
            )));
        }
        if let Some(stray) = batch.points.iter().find(|p| p.device_id != batch.device_id) {
            return Err(HubError::Invalid(format!(
                "point for device {} in batch for device {}",
                stray.device_id, batch.device_id
            )));
        }

        let decision = self.limiter.check_device(&batch.device_id).await?;
        if !decision.allowed {
            return Err(HubError::RateLimited(format!(
                "Rate limit exceeded for device {}",
                batch.device_id
            )));
        }

        self.store.save_batch(&batch.device_id, &batch.points).await?;
        self.registry.mark_active(&batch.device_id).await?;
        for point in &batch.points {
            self.alerts.check_point(point).await?;
        }

        self.bus
            .publish(
                "telemetry.ingested",
                "telemetry.batch",
                serde_json::json!({
                    "device_id": batch.device_id,
                    "point_count": batch.points.len(),
                }),
            )
            .await
    }

    pub async fn query(
        &self,
        device_id: &str,
        metric: Option<&str>,
        start_ms: Option<u64>,
        end_ms: Option<u64>,
        limit: usize,
    ) -> Result<Vec<TelemetryPoint>, HubError> {
        self.store.query(device_id, metric, start_ms, end_ms, limit).await
    }

    pub async fn latest(
        &self,
        device_id: &str,
        metric: &str,
    ) -> Result<Option<TelemetryPoint>, HubError> {
        self.store.latest(device_id, metric).await
    }
}

#[cfg(test)]
#[path = "telemetry_tests.rs"]
mod tests;
