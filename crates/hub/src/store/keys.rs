// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The stable, observable key layout. Every key the hub touches is built
//! here.

pub fn device(id: &str) -> String {
    format!("device:{id}")
}

pub const DEVICE_ALL: &str = "device:all";

pub fn device_group(group_id: &str) -> String {
    format!("device:group:{group_id}")
}

pub fn device_serial(serial: &str) -> String {
    format!("device:serial:{serial}")
}

pub fn telemetry(device_id: &str, metric: &str) -> String {
    format!("telemetry:{device_id}:{metric}")
}

pub fn telemetry_count(device_id: &str) -> String {
    format!("telemetry:count:{device_id}")
}

/// Set of metric names seen for a device; lets range queries cover all
/// metrics without a keyspace scan.
pub fn telemetry_metrics(device_id: &str) -> String {
    format!("telemetry:metrics:{device_id}")
}

pub fn alert_rule(rule_id: &str) -> String {
    format!("alert:rule:{rule_id}")
}

pub const ALERT_RULES_ALL: &str = "alert:rules:all";

pub fn alert_rules_device(device_id: &str) -> String {
    format!("alert:rules:device:{device_id}")
}

pub fn alert_rules_group(group_id: &str) -> String {
    format!("alert:rules:group:{group_id}")
}

pub fn alert(alert_id: &str) -> String {
    format!("alert:{alert_id}")
}

pub const ALERT_TIMELINE: &str = "alert:timeline";

pub fn alert_device(device_id: &str) -> String {
    format!("alert:device:{device_id}")
}

pub const ALERT_OPEN: &str = "alert:open";

pub fn firmware_update(update_id: &str) -> String {
    format!("firmware:update:{update_id}")
}

pub fn firmware_device(device_id: &str) -> String {
    format!("firmware:device:{device_id}")
}

pub const FIRMWARE_PENDING: &str = "firmware:pending";

pub fn firmware_metadata(version: &str) -> String {
    format!("firmware:metadata:{version}")
}

pub const FIRMWARE_VERSIONS: &str = "firmware:versions";

pub fn events(topic: &str) -> String {
    format!("events:{topic}")
}

pub fn lock(resource: &str) -> String {
    format!("lock:{resource}")
}

pub fn ratelimit(identifier: &str) -> String {
    format!("ratelimit:{identifier}")
}
