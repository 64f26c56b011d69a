// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

/// A single telemetry reading. Stored in the per-(device, metric) sorted
/// stream scored by whole seconds of `timestamp_ms`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryPoint {
    pub device_id: String,
    pub timestamp_ms: u64,
    pub metric: String,
    pub value: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl TelemetryPoint {
    /// Sorted-set score for this point: whole seconds since epoch.
    pub fn score(&self) -> u64 {
        self.timestamp_ms / 1000
    }
}

/// A batch of points from one device. One rate-limit probe covers the whole
/// batch; all points must carry the batch's device id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryBatch {
    pub device_id: String,
    pub points: Vec<TelemetryPoint>,
}
