// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Firmware catalog and update handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::error::HubError;
use crate::model::{FirmwareMetadata, FirmwareUpdate, FirmwareUpdateRequest};
use crate::state::HubState;

/// `POST /firmware/register`
pub async fn register(
    State(s): State<Arc<HubState>>,
    Json(metadata): Json<FirmwareMetadata>,
) -> Result<(StatusCode, Json<serde_json::Value>), HubError> {
    let version = metadata.version.clone();
    s.firmware.register_firmware(metadata).await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "status": "registered", "version": version })),
    ))
}

/// `GET /firmware/versions`
pub async fn versions(
    State(s): State<Arc<HubState>>,
) -> Result<Json<Vec<String>>, HubError> {
    Ok(Json(s.firmware.list_versions().await?))
}

/// `POST /firmware/updates`
pub async fn initiate_update(
    State(s): State<Arc<HubState>>,
    Json(request): Json<FirmwareUpdateRequest>,
) -> Result<(StatusCode, Json<FirmwareUpdate>), HubError> {
    let update = s.firmware.initiate_update(request).await?;
    Ok((StatusCode::CREATED, Json(update)))
}

/// `GET /firmware/updates/{id}`
pub async fn get_update(
    State(s): State<Arc<HubState>>,
    Path(id): Path<String>,
) -> Result<Json<FirmwareUpdate>, HubError> {
    Ok(Json(s.firmware.get_update(&id).await?))
}
