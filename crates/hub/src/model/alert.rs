// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

/// Alert lifecycle. Transitions are forward-only:
/// `open -> acknowledged -> resolved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Open,
    Acknowledged,
    Resolved,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Acknowledged => "acknowledged",
            Self::Resolved => "resolved",
        }
    }
}

/// Comparison applied to a telemetry value against a rule threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleOperator {
    Gt,
    Lt,
    Eq,
    Ne,
}

impl RuleOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gt => "gt",
            Self::Lt => "lt",
            Self::Eq => "eq",
            Self::Ne => "ne",
        }
    }

    /// Evaluate `value <op> threshold`.
    pub fn evaluate(&self, value: f64, threshold: f64) -> bool {
        match self {
            Self::Gt => value > threshold,
            Self::Lt => value < threshold,
            Self::Eq => value == threshold,
            Self::Ne => value != threshold,
        }
    }
}

/// A stored alert rule. Rules are toggled via `enabled`, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRule {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    pub metric: String,
    pub operator: RuleOperator,
    pub threshold: f64,
    pub severity: AlertSeverity,
    pub enabled: bool,
    pub created_at_ms: u64,
}

/// Rule creation request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRuleCreate {
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub group_id: Option<String>,
    pub metric: String,
    pub operator: RuleOperator,
    pub threshold: f64,
    pub severity: AlertSeverity,
}

/// A triggered alert. `status == open` iff the alert is a member of the
/// `alert:open` index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub rule_id: String,
    pub device_id: String,
    pub severity: AlertSeverity,
    pub status: AlertStatus,
    pub message: String,
    pub value: f64,
    pub threshold: f64,
    pub triggered_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acknowledged_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at_ms: Option<u64>,
}
