// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Alert rule and alert lifecycle handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::error::HubError;
use crate::model::{Alert, AlertRule, AlertRuleCreate, AlertStatus};
use crate::state::HubState;

#[derive(Debug, Deserialize)]
pub struct RulesQuery {
    #[serde(default)]
    pub device_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AlertsQuery {
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub status: Option<AlertStatus>,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// `POST /alerts/rules`
pub async fn create_rule(
    State(s): State<Arc<HubState>>,
    Json(create): Json<AlertRuleCreate>,
) -> Result<(StatusCode, Json<AlertRule>), HubError> {
    let rule = s.alerts.create_rule(create).await?;
    Ok((StatusCode::CREATED, Json(rule)))
}

/// `GET /alerts/rules/{id}`
pub async fn get_rule(
    State(s): State<Arc<HubState>>,
    Path(id): Path<String>,
) -> Result<Json<AlertRule>, HubError> {
    Ok(Json(s.alerts.get_rule(&id).await?))
}

/// `GET /alerts/rules`
pub async fn list_rules(
    State(s): State<Arc<HubState>>,
    Query(query): Query<RulesQuery>,
) -> Result<Json<Vec<AlertRule>>, HubError> {
    Ok(Json(s.alerts.list_rules(query.device_id.as_deref()).await?))
}

/// `GET /alerts`
pub async fn list(
    State(s): State<Arc<HubState>>,
    Query(query): Query<AlertsQuery>,
) -> Result<Json<Vec<Alert>>, HubError> {
    let alerts = s
        .alerts
        .list_alerts(query.device_id.as_deref(), query.status, query.limit.unwrap_or(100))
        .await?;
    Ok(Json(alerts))
}

/// `POST /alerts/{id}/acknowledge`
pub async fn acknowledge(
    State(s): State<Arc<HubState>>,
    Path(id): Path<String>,
) -> Result<Json<Alert>, HubError> {
    Ok(Json(s.alerts.acknowledge(&id).await?))
}

/// `POST /alerts/{id}/resolve`
pub async fn resolve(
    State(s): State<Arc<HubState>>,
    Path(id): Path<String>,
) -> Result<Json<Alert>, HubError> {
    Ok(Json(s.alerts.resolve(&id).await?))
}
