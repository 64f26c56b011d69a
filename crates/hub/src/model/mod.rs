// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistent entity records and their wire representations.
//!
//! All entities are identified by opaque UUID strings and serialized as
//! self-describing JSON in the store. Timestamps are milliseconds since the
//! Unix epoch, fields suffixed `_ms`.

pub mod alert;
pub mod analytics;
pub mod device;
pub mod event;
pub mod firmware;
pub mod telemetry;

pub use alert::{Alert, AlertRule, AlertRuleCreate, AlertSeverity, AlertStatus, RuleOperator};
pub use analytics::{DeviceMetrics, FleetAnalytics, GroupAnalytics};
pub use device::{Device, DevicePatch, DeviceRegistration, DeviceStatus, DeviceType};
pub use event::Event;
pub use firmware::{FirmwareMetadata, FirmwareUpdate, FirmwareUpdateRequest, UpdateStatus};
pub use telemetry::{TelemetryBatch, TelemetryPoint};
