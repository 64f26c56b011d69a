// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Alert rules and alerts, with the timeline / per-device / open indexes.
//!
//! An alert is a member of `alert:open` iff its stored status is `open`;
//! every write path here maintains that together with the record itself.

use std::sync::Arc;

use crate::error::HubError;
use crate::model::{Alert, AlertRule, AlertStatus};
use crate::state::epoch_ms;
use crate::store::keys;
use crate::store::kv::{Kv, KvOp};

pub struct AlertStore {
    kv: Arc<dyn Kv>,
}

impl AlertStore {
    pub fn new(kv: Arc<dyn Kv>) -> Self {
        Self { kv }
    }

    pub async fn save_rule(&self, rule: &AlertRule) -> Result<(), HubError> {
        let record = serde_json::to_string(rule)
            .map_err(|e| HubError::Transient(format!("encode rule {}: {e}", rule.id)))?;

        let mut ops = vec![
            KvOp::Set { key: keys::alert_rule(&rule.id), value: record },
            KvOp::SAdd { key: keys::ALERT_RULES_ALL.to_owned(), member: rule.id.clone() },
        ];
        if let Some(ref device_id) = rule.device_id {
            ops.push(KvOp::SAdd { key: keys::alert_rules_device(device_id), member: rule.id.clone() });
        }
        if let Some(ref group_id) = rule.group_id {
            ops.push(KvOp::SAdd { key: keys::alert_rules_group(group_id), member: rule.id.clone() });
        }
        self.kv.pipeline(ops).await
    }

    pub async fn get_rule(&self, rule_id: &str) -> Result<Option<AlertRule>, HubError> {
        match self.kv.get(&keys::alert_rule(rule_id)).await? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| HubError::Transient(format!("decode rule {rule_id}: {e}"))),
            None => Ok(None),
        }
    }

    /// Rules for a device (or every rule when `device_id` is `None`),
    /// optionally restricted to enabled rules.
    pub async fn list_rules(
        &self,
        device_id: Option<&str>,
        enabled_only: bool,
    ) -> Result<Vec<AlertRule>, HubError> {
        let index = match device_id {
            Some(d) => keys::alert_rules_device(d),
            None => keys::ALERT_RULES_ALL.to_owned(),
        };
        let ids = self.kv.smembers(&index).await?;

        let mut rules = Vec::new();
        for id in ids {
            if let Some(rule) = self.get_rule(&id).await? {
                if !enabled_only || rule.enabled {
                    rules.push(rule);
                }
            }
        }
        Ok(rules)
    }

    pub async fn save_alert(&self, alert: &Alert) -> Result<(), HubError> {
        let record = serde_json::to_string(alert)
            .map_err(|e| HubError::Transient(format!("encode alert {}: {e}", alert.id)))?;

        let mut ops = vec![
            KvOp::Set { key: keys::alert(&alert.id), value: record },
            KvOp::ZAdd {
                key: keys::ALERT_TIMELINE.to_owned(),
                member: alert.id.clone(),
                score: alert.triggered_at_ms / 1000,
            },
            KvOp::SAdd { key: keys::alert_device(&alert.device_id), member: alert.id.clone() },
        ];
        if alert.status == AlertStatus::Open {
            ops.push(KvOp::SAdd { key: keys::ALERT_OPEN.to_owned(), member: alert.id.clone() });
        }
        self.kv.pipeline(ops).await
    }

    pub async fn get_alert(&self, alert_id: &str) -> Result<Option<Alert>, HubError> {
        match self.kv.get(&keys::alert(alert_id)).await? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| HubError::Transient(format!("decode alert {alert_id}: {e}"))),
            None => Ok(None),
        }
    }

    pub async fn list_alerts(
        &self,
        device_id: Option<&str>,
        status: Option<AlertStatus>,
        limit: usize,
    ) -> Result<Vec<Alert>, HubError> {
        let ids = if status == Some(AlertStatus::Open) {
            self.kv.smembers(keys::ALERT_OPEN).await?
        } else if let Some(d) = device_id {
            self.kv.smembers(&keys::alert_device(d)).await?
        } else {
            self.kv.zrange(keys::ALERT_TIMELINE, 0, limit as i64 - 1).await?
        };

        let mut alerts = Vec::new();
        for id in ids.into_iter().take(limit) {
            if let Some(alert) = self.get_alert(&id).await? {
                if let Some(want) = status {
                    if alert.status != want {
                        continue;
                    }
                }
                if let Some(d) = device_id {
                    if alert.device_id != d {
                        continue;
                    }
                }
                alerts.push(alert);
            }
        }
        alerts.sort_by(|a, b| b.triggered_at_ms.cmp(&a.triggered_at_ms));
        Ok(alerts)
    }

    /// Apply a forward-only status transition, stamping the matching
    /// timestamp and maintaining the open index.
    pub async fn update_status(
        &self,
        alert_id: &str,
        status: AlertStatus,
    ) -> Result<Alert, HubError> {
        let mut alert = self
            .get_alert(alert_id)
            .await?
            .ok_or_else(|| HubError::NotFound(format!("alert {alert_id} not found")))?;

        let allowed = match status {
            AlertStatus::Acknowledged => alert.status == AlertStatus::Open,
            AlertStatus::Resolved => {
                matches!(alert.status, AlertStatus::Open | AlertStatus::Acknowledged)
            }
            AlertStatus::Open => false,
        };
        if !allowed {
            return Err(HubError::Invalid(format!(
                "cannot transition alert {alert_id} from {} to {}",
                alert.status.as_str(),
                status.as_str()
            )));
        }

        alert.status = status;
        match status {
            AlertStatus::Acknowledged => alert.acknowledged_at_ms = Some(epoch_ms()),
            AlertStatus::Resolved => alert.resolved_at_ms = Some(epoch_ms()),
            AlertStatus::Open => {}
        }

        self.save_alert(&alert).await?;
        self.kv.srem(keys::ALERT_OPEN, alert_id).await?;
        Ok(alert)
    }

    pub async fn count_open(&self) -> Result<u64, HubError> {
        self.kv.scard(keys::ALERT_OPEN).await
    }
}

#[cfg(test)]
#[path = "alert_tests.rs"]
mod tests;
