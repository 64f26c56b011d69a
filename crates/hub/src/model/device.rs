// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

/// Lifecycle status of a device. Devices are never deleted; decommission is
/// a terminal status, not a removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    Registered,
    Active,
    Inactive,
    Maintenance,
    Decommissioned,
}

impl DeviceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Maintenance => "maintenance",
            Self::Decommissioned => "decommissioned",
        }
    }
}

/// Hardware class of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    Sensor,
    Gateway,
    Actuator,
    Hybrid,
}

/// A registered device. The serial number uniquely determines the id via the
/// `device:serial:{s}` index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub serial_number: String,
    pub device_type: DeviceType,
    pub status: DeviceStatus,
    pub firmware_version: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
    pub registered_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
}

/// Registration request body. The serial number is the natural idempotency
/// key; concurrent registrations of the same serial resolve to one id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceRegistration {
    pub serial_number: String,
    pub device_type: DeviceType,
    pub firmware_version: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub group_id: Option<String>,
}

/// Partial device update — only present fields are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DevicePatch {
    #[serde(default)]
    pub status: Option<DeviceStatus>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub group_id: Option<String>,
}
