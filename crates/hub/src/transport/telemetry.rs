// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Telemetry ingestion and query handlers. Ingestion acknowledges with 202
//! only after durable persistence.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::error::HubError;
use crate::model::{TelemetryBatch, TelemetryPoint};
use crate::state::HubState;

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    #[serde(default)]
    pub metric: Option<String>,
    #[serde(default)]
    pub start_ms: Option<u64>,
    #[serde(default)]
    pub end_ms: Option<u64>,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// `POST /telemetry/point`
pub async fn ingest_point(
    State(s): State<Arc<HubState>>,
    Json(point): Json<TelemetryPoint>,
) -> Result<(StatusCode, Json<serde_json::Value>), HubError> {
    s.telemetry.ingest_point(point).await?;
    Ok((StatusCode::ACCEPTED, Json(serde_json::json!({ "status": "accepted" }))))
}

/// `POST /telemetry/batch`
pub async fn ingest_batch(
    State(s): State<Arc<HubState>>,
    Json(batch): Json<TelemetryBatch>,
) -> Result<(StatusCode, Json<serde_json::Value>), HubError> {
    let count = batch.points.len();
    s.telemetry.ingest_batch(batch).await?;
    Ok((StatusCode::ACCEPTED, Json(serde_json::json!({ "status": "accepted", "count": count }))))
}

/// `GET /telemetry/{device_id}`
pub async fn query(
    State(s): State<Arc<HubState>>,
    Path(device_id): Path<String>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<Vec<TelemetryPoint>>, HubError> {
    let points = s
        .telemetry
        .query(
            &device_id,
            range.metric.as_deref(),
            range.start_ms,
            range.end_ms,
            range.limit.unwrap_or(100),
        )
        .await?;
    Ok(Json(points))
}

/// `GET /telemetry/{device_id}/{metric}/latest`
pub async fn latest(
    State(s): State<Arc<HubState>>,
    Path((device_id, metric)): Path<(String, String)>,
) -> Result<Json<TelemetryPoint>, HubError> {
    let point = s
        .telemetry
        .latest(&device_id, &metric)
        .await?
        .ok_or_else(|| HubError::NotFound(format!("no telemetry for {device_id}/{metric}")))?;
    Ok(Json(point))
}
