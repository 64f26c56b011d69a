// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use super::AlertStore;
use crate::error::HubError;
use crate::model::{Alert, AlertRule, AlertSeverity, AlertStatus, RuleOperator};
use crate::state::epoch_ms;
use crate::store::keys;
use crate::store::kv::{Kv, MemoryStore};

fn rule(id: &str, device_id: Option<&str>, enabled: bool) -> AlertRule {
    AlertRule {
        id: id.to_owned(),
        device_id: device_id.map(str::to_owned),
        group_id: None,
        metric: "temperature".to_owned(),
        operator: RuleOperator::Gt,
        threshold: 30.0,
        severity: AlertSeverity::Critical,
        enabled,
        created_at_ms: epoch_ms(),
    }
}

fn alert(id: &str, device_id: &str) -> Alert {
    Alert {
        id: id.to_owned(),
        rule_id: "r-1".to_owned(),
        device_id: device_id.to_owned(),
        severity: AlertSeverity::Critical,
        status: AlertStatus::Open,
        message: "temperature gt 30".to_owned(),
        value: 35.0,
        threshold: 30.0,
        triggered_at_ms: epoch_ms(),
        acknowledged_at_ms: None,
        resolved_at_ms: None,
    }
}

#[tokio::test]
async fn list_rules_honors_device_index_and_enabled_flag() -> Result<(), HubError> {
    let kv = Arc::new(MemoryStore::new());
    let store = AlertStore::new(kv);

    store.save_rule(&rule("r-1", Some("d-1"), true)).await?;
    store.save_rule(&rule("r-2", Some("d-1"), false)).await?;
    store.save_rule(&rule("r-3", Some("d-2"), true)).await?;

    let enabled = store.list_rules(Some("d-1"), true).await?;
    assert_eq!(enabled.len(), 1);
    assert_eq!(enabled[0].id, "r-1");

    let all_for_device = store.list_rules(Some("d-1"), false).await?;
    assert_eq!(all_for_device.len(), 2);

    let everything = store.list_rules(None, false).await?;
    assert_eq!(everything.len(), 3);
    Ok(())
}

#[tokio::test]
async fn open_alert_is_member_of_open_index() -> Result<(), HubError> {
    let kv = Arc::new(MemoryStore::new());
    let store = AlertStore::new(kv.clone());

    store.save_alert(&alert("a-1", "d-1")).await?;

    assert!(kv.smembers(keys::ALERT_OPEN).await?.contains(&"a-1".to_owned()));
    assert_eq!(store.count_open().await?, 1);
    Ok(())
}

#[tokio::test]
async fn acknowledge_stamps_and_leaves_open_index() -> Result<(), HubError> {
    let kv = Arc::new(MemoryStore::new());
    let store = AlertStore::new(kv.clone());
    store.save_alert(&alert("a-1", "d-1")).await?;

    let acked = store.update_status("a-1", AlertStatus::Acknowledged).await?;
    assert_eq!(acked.status, AlertStatus::Acknowledged);
    assert!(acked.acknowledged_at_ms.is_some());
    assert!(!kv.smembers(keys::ALERT_OPEN).await?.contains(&"a-1".to_owned()));
    assert_eq!(store.count_open().await?, 0);

    let resolved = store.update_status("a-1", AlertStatus::Resolved).await?;
    assert_eq!(resolved.status, AlertStatus::Resolved);
    assert!(resolved.resolved_at_ms.is_some());
    Ok(())
}

#[tokio::test]
async fn backward_transitions_are_rejected() -> Result<(), HubError> {
    let kv = Arc::new(MemoryStore::new());
    let store = AlertStore::new(kv);
    store.save_alert(&alert("a-1", "d-1")).await?;

    store.update_status("a-1", AlertStatus::Resolved).await?;
    let err = store.update_status("a-1", AlertStatus::Acknowledged).await.err();
    assert!(matches!(err, Some(HubError::Invalid(_))));

    let err = store.update_status("a-1", AlertStatus::Resolved).await.err();
    assert!(matches!(err, Some(HubError::Invalid(_))));
    Ok(())
}

#[tokio::test]
async fn update_status_on_missing_alert_is_not_found() {
    let kv = Arc::new(MemoryStore::new());
    let store = AlertStore::new(kv);
    let err = store.update_status("missing", AlertStatus::Acknowledged).await.err();
    assert!(matches!(err, Some(HubError::NotFound(_))));
}

#[tokio::test]
async fn list_alerts_filters_by_status_and_device() -> Result<(), HubError> {
    let kv = Arc::new(MemoryStore::new());
    let store = AlertStore::new(kv);

    store.save_alert(&alert("a-1", "d-1")).await?;
    store.save_alert(&alert("a-2", "d-1")).await?;
    store.save_alert(&alert("a-3", "d-2")).await?;
    store.update_status("a-2", AlertStatus::Resolved).await?;

    let open = store.list_alerts(None, Some(AlertStatus::Open), 100).await?;
    assert_eq!(open.len(), 2);

    let for_device = store.list_alerts(Some("d-1"), None, 100).await?;
    assert_eq!(for_device.len(), 2);

    let open_for_device = store.list_alerts(Some("d-1"), Some(AlertStatus::Open), 100).await?;
    assert_eq!(open_for_device.len(), 1);
    assert_eq!(open_for_device[0].id, "a-1");
    Ok(())
}
