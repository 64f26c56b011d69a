// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Device registry handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;

use crate::error::HubError;
use crate::model::{Device, DevicePatch, DeviceRegistration};
use crate::state::HubState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// `POST /devices` — idempotent registration keyed by serial number.
pub async fn register(
    State(s): State<Arc<HubState>>,
    headers: HeaderMap,
    Json(registration): Json<DeviceRegistration>,
) -> Result<(StatusCode, Json<Device>), HubError> {
    let idempotency_key = headers
        .get("idempotency-key")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| HubError::Invalid("missing idempotency-key header".into()))?;

    let device = s.registry.register(registration, idempotency_key).await?;
    Ok((StatusCode::CREATED, Json(device)))
}

/// `GET /devices/{id}`
pub async fn get(
    State(s): State<Arc<HubState>>,
    Path(id): Path<String>,
) -> Result<Json<Device>, HubError> {
    Ok(Json(s.registry.get(&id).await?))
}

/// `PATCH /devices/{id}`
pub async fn update(
    State(s): State<Arc<HubState>>,
    Path(id): Path<String>,
    Json(patch): Json<DevicePatch>,
) -> Result<Json<Device>, HubError> {
    Ok(Json(s.registry.update(&id, patch).await?))
}

/// `GET /devices`
pub async fn list(
    State(s): State<Arc<HubState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Device>>, HubError> {
    let devices =
        s.registry.list(query.group_id.as_deref(), query.limit.unwrap_or(100)).await?;
    Ok(Json(devices))
}
