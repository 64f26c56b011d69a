// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

/// Per-device roll-up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceMetrics {
    pub device_id: String,
    pub uptime_seconds: u64,
    pub message_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen_ms: Option<u64>,
    pub error_count: u64,
}

/// Fleet-wide roll-up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetAnalytics {
    pub total_devices: u64,
    pub active_devices: u64,
    pub inactive_devices: u64,
    pub total_messages: u64,
    pub active_alerts: u64,
    pub pending_updates: u64,
    pub average_uptime_seconds: f64,
}

/// Per-group roll-up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupAnalytics {
    pub group_id: String,
    pub device_count: u64,
    pub active_count: u64,
    pub total_messages: u64,
    pub alert_count: u64,
    pub average_uptime_seconds: f64,
}
