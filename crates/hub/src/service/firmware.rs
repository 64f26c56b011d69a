// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Firmware catalog and update initiation.

use std::sync::Arc;

use crate::error::HubError;
use crate::model::{FirmwareMetadata, FirmwareUpdate, FirmwareUpdateRequest, UpdateStatus};
use crate::runtime::EventBus;
use crate::service::device::DeviceRegistry;
use crate::service::orchestrator::UpdateOrchestrator;
use crate::state::epoch_ms;
use crate::store::FirmwareStore;

pub struct FirmwareService {
    store: Arc<FirmwareStore>,
    registry: Arc<DeviceRegistry>,
    orchestrator: Arc<UpdateOrchestrator>,
    bus: Arc<EventBus>,
}

impl FirmwareService {
    pub fn new(
        store: Arc<FirmwareStore>,
        registry: Arc<DeviceRegistry>,
        orchestrator: Arc<UpdateOrchestrator>,
        bus: Arc<EventBus>,
    ) -> Self {
        Self { store, registry, orchestrator, bus }
    }

    pub async fn register_firmware(&self, metadata: FirmwareMetadata) -> Result<(), HubError> {
        self.store.save_metadata(&metadata).await?;
        self.bus
            .publish(
                "firmware.catalog",
                "firmware.registered",
                serde_json::json!({ "version": metadata.version }),
            )
            .await
    }

    pub async fn list_versions(&self) -> Result<Vec<String>, HubError> {
        self.store.list_versions().await
    }

    /// Start an update and drive its saga to a terminal state. A device
    /// with an update already in flight gets that record back unless
    /// `force` is set.
    pub async fn initiate_update(
        &self,
        request: FirmwareUpdateRequest,
    ) -> Result<FirmwareUpdate, HubError> {
        let device = self.registry.get(&request.device_id).await?;

        if let Some(existing) = self.store.get_device_update(&request.device_id).await? {
            if !existing.status.is_terminal() && !request.force {
                return Ok(existing);
            }
        }

        if self.store.get_metadata(&request.to_version).await?.is_none() {
            return Err(HubError::Invalid(format!(
                "firmware version {} not found",
                request.to_version
            )));
        }

        let update = FirmwareUpdate {
            id: uuid::Uuid::new_v4().to_string(),
            device_id: request.device_id,
            from_version: device.firmware_version,
            to_version: request.to_version,
            status: UpdateStatus::Pending,
            progress: 0,
            started_at_ms: epoch_ms(),
            completed_at_ms: None,
            error: None,
        };
        self.store.save_update(&update).await?;

        self.orchestrator.run(&update.id).await?;

        // The saga already moved the record; return what is stored now.
        self.get_update(&update.id).await
    }

    pub async fn get_update(&self, update_id: &str) -> Result<FirmwareUpdate, HubError> {
        self.store
            .get_update(update_id)
            .await?
            .ok_or_else(|| HubError::NotFound(format!("update {update_id} not found")))
    }
}

#[cfg(test)]
#[path = "firmware_tests.rs"]
mod tests;
