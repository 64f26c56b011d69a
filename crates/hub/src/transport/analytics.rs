// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only analytics handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;

use crate::error::HubError;
use crate::model::{DeviceMetrics, FleetAnalytics, GroupAnalytics};
use crate::state::HubState;

/// `GET /analytics/devices/{id}`
pub async fn device(
    State(s): State<Arc<HubState>>,
    Path(id): Path<String>,
) -> Result<Json<DeviceMetrics>, HubError> {
    Ok(Json(s.analytics.device_metrics(&id).await?))
}

/// `GET /analytics/fleet`
pub async fn fleet(State(s): State<Arc<HubState>>) -> Result<Json<FleetAnalytics>, HubError> {
    Ok(Json(s.analytics.fleet().await?))
}

/// `GET /analytics/groups/{id}`
pub async fn group(
    State(s): State<Arc<HubState>>,
    Path(id): Path<String>,
) -> Result<Json<GroupAnalytics>, HubError> {
    Ok(Json(s.analytics.group(&id).await?))
}
