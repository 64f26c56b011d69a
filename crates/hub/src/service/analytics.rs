// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only roll-ups over stored state. No caching, no derived writes.

use std::sync::Arc;

use crate::error::HubError;
use crate::model::{Device, DeviceMetrics, DeviceStatus, FleetAnalytics, GroupAnalytics};
use crate::store::{AlertStore, DeviceStore, FirmwareStore, TelemetryStore};

const ROLLUP_DEVICE_LIMIT: usize = 10_000;

pub struct AnalyticsService {
    devices: Arc<DeviceStore>,
    telemetry: Arc<TelemetryStore>,
    alerts: Arc<AlertStore>,
    firmware: Arc<FirmwareStore>,
}

fn uptime_seconds(device: &Device) -> u64 {
    match device.last_seen_ms {
        Some(last_seen) => last_seen.saturating_sub(device.registered_at_ms) / 1000,
        None => 0,
    }
}

impl AnalyticsService {
    pub fn new(
        devices: Arc<DeviceStore>,
        telemetry: Arc<TelemetryStore>,
        alerts: Arc<AlertStore>,
        firmware: Arc<FirmwareStore>,
    ) -> Self {
        Self { devices, telemetry, alerts, firmware }
    }

    pub async fn device_metrics(&self, device_id: &str) -> Result<DeviceMetrics, HubError> {
        let device = self
            .devices
            .get(device_id)
            .await?
            .ok_or_else(|| HubError::NotFound(format!("device {device_id} not found")))?;

        Ok(DeviceMetrics {
            device_id: device_id.to_owned(),
            uptime_seconds: uptime_seconds(&device),
            message_count: self.telemetry.message_count(device_id).await?,
            last_seen_ms: device.last_seen_ms,
            error_count: 0,
        })
    }

    pub async fn fleet(&self) -> Result<FleetAnalytics, HubError> {
        let devices = self.devices.list(None, ROLLUP_DEVICE_LIMIT).await?;

        let total_devices = devices.len() as u64;
        let active_devices =
            devices.iter().filter(|d| d.status == DeviceStatus::Active).count() as u64;

        let mut total_messages = 0u64;
        let mut total_uptime = 0u64;
        for device in &devices {
            total_messages += self.telemetry.message_count(&device.id).await?;
            total_uptime += uptime_seconds(device);
        }

        Ok(FleetAnalytics {
            total_devices,
            active_devices,
            inactive_devices: total_devices - active_devices,
            total_messages,
            active_alerts: self.alerts.count_open().await?,
            pending_updates: self.firmware.list_pending().await?.len() as u64,
            average_uptime_seconds: if total_devices > 0 {
                total_uptime as f64 / total_devices as f64
            } else {
                0.0
            },
        })
    }

    pub async fn group(&self, group_id: &str) -> Result<GroupAnalytics, HubError> {
        let devices = self.devices.list(Some(group_id), ROLLUP_DEVICE_LIMIT).await?;

        let device_count = devices.len() as u64;
        let active_count =
            devices.iter().filter(|d| d.status == DeviceStatus::Active).count() as u64;

        let mut total_messages = 0u64;
        let mut total_uptime = 0u64;
        let mut alert_count = 0u64;
        for device in &devices {
            total_messages += self.telemetry.message_count(&device.id).await?;
            total_uptime += uptime_seconds(device);
            alert_count += self.alerts.list_alerts(Some(&device.id), None, usize::MAX).await?.len()
                as u64;
        }

        Ok(GroupAnalytics {
            group_id: group_id.to_owned(),
            device_count,
            active_count,
            total_messages,
            alert_count,
            average_uptime_seconds: if device_count > 0 {
                total_uptime as f64 / device_count as f64
            } else {
                0.0
            },
        })
    }
}

#[cfg(test)]
#[path = "analytics_tests.rs"]
mod tests;
