// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Alert rules, synchronous evaluation on the ingest path, and alert
//! lifecycle.
//!
//! Evaluation is part of the telemetry request: a matching rule creates and
//! persists the alert before the request is acknowledged. The notifier call
//! rides behind the circuit breaker and is always swallowed — alert
//! creation must not fail because the notifier is down.

use std::sync::Arc;

use crate::error::HubError;
use crate::model::{Alert, AlertRule, AlertRuleCreate, AlertStatus, TelemetryPoint};
use crate::runtime::{CircuitBreaker, EventBus};
use crate::service::notify::Notifier;
use crate::state::epoch_ms;
use crate::store::AlertStore;

pub struct AlertEngine {
    store: Arc<AlertStore>,
    bus: Arc<EventBus>,
    breaker: Arc<CircuitBreaker>,
    notifier: Arc<dyn Notifier>,
}

impl AlertEngine {
    pub fn new(
        store: Arc<AlertStore>,
        bus: Arc<EventBus>,
        breaker: Arc<CircuitBreaker>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self { store, bus, breaker, notifier }
    }

    pub async fn create_rule(&self, create: AlertRuleCreate) -> Result<AlertRule, HubError> {
        let rule = AlertRule {
            id: uuid::Uuid::new_v4().to_string(),
            device_id: create.device_id,
            group_id: create.group_id,
            metric: create.metric,
            operator: create.operator,
            threshold: create.threshold,
            severity: create.severity,
            enabled: true,
            created_at_ms: epoch_ms(),
        };

        self.store.save_rule(&rule).await?;
        self.bus
            .publish("alert.rules", "rule.created", serde_json::json!({ "rule_id": rule.id }))
            .await?;
        Ok(rule)
    }

    pub async fn get_rule(&self, rule_id: &str) -> Result<AlertRule, HubError> {
        self.store
            .get_rule(rule_id)
            .await?
            .ok_or_else(|| HubError::NotFound(format!("rule {rule_id} not found")))
    }

    pub async fn list_rules(&self, device_id: Option<&str>) -> Result<Vec<AlertRule>, HubError> {
        self.store.list_rules(device_id, true).await
    }

    /// Evaluate every enabled rule for the point's device; trigger an alert
    /// for each rule whose metric and comparison match.
    pub async fn check_point(&self, point: &TelemetryPoint) -> Result<(), HubError> {
        let rules = self.store.list_rules(Some(&point.device_id), true).await?;

        for rule in rules {
            if rule.metric != point.metric {
                continue;
            }
            if rule.operator.evaluate(point.value, rule.threshold) {
                self.trigger(&rule, point).await?;
            }
        }
        Ok(())
    }

    async fn trigger(&self, rule: &AlertRule, point: &TelemetryPoint) -> Result<(), HubError> {
        let alert = Alert {
            id: uuid::Uuid::new_v4().to_string(),
            rule_id: rule.id.clone(),
            device_id: point.device_id.clone(),
            severity: rule.severity,
            // Materialized explicitly so the open-index invariant holds.
            status: AlertStatus::Open,
            message: format!("{} {} {}", point.metric, rule.operator.as_str(), rule.threshold),
            value: point.value,
            threshold: rule.threshold,
            triggered_at_ms: epoch_ms(),
            acknowledged_at_ms: None,
            resolved_at_ms: None,
        };

        self.store.save_alert(&alert).await?;

        self.bus
            .publish(
                "alert.triggered",
                "alert.new",
                serde_json::json!({
                    "alert_id": alert.id,
                    "device_id": alert.device_id,
                    "severity": alert.severity.as_str(),
                }),
            )
            .await?;

        let notifier = Arc::clone(&self.notifier);
        let rule_id = rule.id.clone();
        let outcome =
            self.breaker.call(move || async move { notifier.notify(&alert).await }).await;
        if let Err(e) = outcome {
            tracing::warn!(rule_id = %rule_id, err = %e, "alert notification failed");
        }
        Ok(())
    }

    pub async fn list_alerts(
        &self,
        device_id: Option<&str>,
        status: Option<AlertStatus>,
        limit: usize,
    ) -> Result<Vec<Alert>, HubError> {
        self.store.list_alerts(device_id, status, limit).await
    }

    pub async fn acknowledge(&self, alert_id: &str) -> Result<Alert, HubError> {
        self.store.update_status(alert_id, AlertStatus::Acknowledged).await
    }

    pub async fn resolve(&self, alert_id: &str) -> Result<Alert, HubError> {
        self.store.update_status(alert_id, AlertStatus::Resolved).await
    }

    pub async fn count_open(&self) -> Result<u64, HubError> {
        self.store.count_open().await
    }
}

#[cfg(test)]
#[path = "alert_tests.rs"]
mod tests;
