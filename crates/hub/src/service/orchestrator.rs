// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Saga-driven firmware update execution.
//!
//! Four steps: download, set_maintenance, install, verify. Each step writes
//! the update's status/progress to the store, so compensations read live
//! entity state rather than a saga log. The device status to restore is
//! captured before the saga starts. A failure after at least one completed
//! step ends as `rolled_back`; a failure on the very first step ends as
//! `failed` (terminal, locked).

use std::sync::Arc;
use std::time::Duration;

use crate::error::HubError;
use crate::model::{DeviceStatus, FirmwareUpdate, UpdateStatus};
use crate::runtime::{EventBus, Saga};
use crate::state::epoch_ms;
use crate::store::{DeviceStore, FirmwareStore};

pub struct UpdateOrchestrator {
    firmware: Arc<FirmwareStore>,
    devices: Arc<DeviceStore>,
    bus: Arc<EventBus>,
}

impl UpdateOrchestrator {
    pub fn new(firmware: Arc<FirmwareStore>, devices: Arc<DeviceStore>, bus: Arc<EventBus>) -> Self {
        Self { firmware, devices, bus }
    }

    /// Drive the update saga to a terminal state. Saga failure is recorded
    /// on the update and published, not returned; only infrastructure
    /// errors propagate.
    pub async fn run(&self, update_id: &str) -> Result<(), HubError> {
        let update = self.load_update(update_id).await?;
        let device = self
            .devices
            .get(&update.device_id)
            .await?
            .ok_or_else(|| HubError::NotFound(format!("device {} not found", update.device_id)))?;

        // Captured before the saga so compensation restores the pre-saga
        // state, not the maintenance state the saga itself wrote.
        let pre_saga_status = device.status;
        let device_id = update.device_id.clone();
        let from_version = update.from_version.clone();
        let to_version = update.to_version.clone();

        let saga = Saga::new(format!("firmware_update_{update_id}"))
            .step(
                "download",
                {
                    let firmware = Arc::clone(&self.firmware);
                    let update_id = update_id.to_owned();
                    move || {
                        let firmware = Arc::clone(&firmware);
                        let update_id = update_id.clone();
                        Box::pin(async move {
                            set_update_state(&firmware, &update_id, UpdateStatus::Downloading, 0)
                                .await?;
                            tokio::time::sleep(Duration::from_millis(100)).await;
                            set_update_state(&firmware, &update_id, UpdateStatus::Downloaded, 30)
                                .await
                        })
                    }
                },
                {
                    let firmware = Arc::clone(&self.firmware);
                    let update_id = update_id.to_owned();
                    move || {
                        let firmware = Arc::clone(&firmware);
                        let update_id = update_id.clone();
                        Box::pin(async move { mark_rolled_back(&firmware, &update_id).await })
                    }
                },
            )
            .step(
                "set_maintenance",
                {
                    let devices = Arc::clone(&self.devices);
                    let device_id = device_id.clone();
                    move || {
                        let devices = Arc::clone(&devices);
                        let device_id = device_id.clone();
                        Box::pin(async move {
                            set_device_status(&devices, &device_id, DeviceStatus::Maintenance).await
                        })
                    }
                },
                {
                    let devices = Arc::clone(&self.devices);
                    let device_id = device_id.clone();
                    move || {
                        let devices = Arc::clone(&devices);
                        let device_id = device_id.clone();
                        Box::pin(async move {
                            set_device_status(&devices, &device_id, pre_saga_status).await
                        })
                    }
                },
            )
            .step(
                "install",
                {
                    let firmware = Arc::clone(&self.firmware);
                    let devices = Arc::clone(&self.devices);
                    let update_id = update_id.to_owned();
                    let device_id = device_id.clone();
                    let to_version = to_version.clone();
                    move || {
                        let firmware = Arc::clone(&firmware);
                        let devices = Arc::clone(&devices);
                        let update_id = update_id.clone();
                        let device_id = device_id.clone();
                        let to_version = to_version.clone();
                        Box::pin(async move {
                            set_update_state(&firmware, &update_id, UpdateStatus::Installing, 50)
                                .await?;
                            tokio::time::sleep(Duration::from_millis(100)).await;
                            set_device_version(&devices, &device_id, &to_version).await?;
                            set_update_state(&firmware, &update_id, UpdateStatus::Installing, 80)
                                .await
                        })
                    }
                },
                {
                    let firmware = Arc::clone(&self.firmware);
                    let devices = Arc::clone(&self.devices);
                    let update_id = update_id.to_owned();
                    let device_id = device_id.clone();
                    let from_version = from_version.clone();
                    move || {
                        let firmware = Arc::clone(&firmware);
                        let devices = Arc::clone(&devices);
                        let update_id = update_id.clone();
                        let device_id = device_id.clone();
                        let from_version = from_version.clone();
                        Box::pin(async move {
                            set_device_version(&devices, &device_id, &from_version).await?;
                            mark_rolled_back(&firmware, &update_id).await
                        })
                    }
                },
            )
            .step(
                "verify",
                || {
                    Box::pin(async {
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Err(HubError::Transient(
                            "installation verification failed: checksum mismatch".into(),
                        ))
                    })
                },
                || Box::pin(async { Ok(()) }),
            );

        match saga.execute().await {
            Ok(()) => self.record_success(update_id, &device_id, &to_version).await,
            Err(failure) => {
                let status = if failure.compensated_steps > 0 {
                    UpdateStatus::RolledBack
                } else {
                    UpdateStatus::Failed
                };
                let error: HubError = failure.into();
                self.record_failure(update_id, status, &error).await
            }
        }
    }

    async fn load_update(&self, update_id: &str) -> Result<FirmwareUpdate, HubError> {
        self.firmware
            .get_update(update_id)
            .await?
            .ok_or_else(|| HubError::NotFound(format!("update {update_id} not found")))
    }

    async fn record_success(
        &self,
        update_id: &str,
        device_id: &str,
        to_version: &str,
    ) -> Result<(), HubError> {
        let mut update = self.load_update(update_id).await?;
        update.status = UpdateStatus::Installed;
        update.progress = 100;
        update.completed_at_ms = Some(epoch_ms());
        self.firmware.save_update(&update).await?;

        if let Some(mut device) = self.devices.get(device_id).await? {
            device.firmware_version = to_version.to_owned();
            device.status = DeviceStatus::Active;
            self.devices.save(&device).await?;
        }

        self.bus
            .publish(
                "firmware.updates",
                "update.completed",
                serde_json::json!({ "update_id": update_id, "device_id": device_id }),
            )
            .await
    }

    async fn record_failure(
        &self,
        update_id: &str,
        status: UpdateStatus,
        error: &HubError,
    ) -> Result<(), HubError> {
        let mut update = self.load_update(update_id).await?;
        update.status = status;
        update.error = Some(error.message());
        update.completed_at_ms = Some(epoch_ms());
        self.firmware.save_update(&update).await?;

        self.bus
            .publish(
                "firmware.updates",
                "update.failed",
                serde_json::json!({ "update_id": update_id, "error": error.message() }),
            )
            .await
    }
}

async fn set_update_state(
    firmware: &FirmwareStore,
    update_id: &str,
    status: UpdateStatus,
    progress: u8,
) -> Result<(), HubError> {
    let mut update = firmware
        .get_update(update_id)
        .await?
        .ok_or_else(|| HubError::NotFound(format!("update {update_id} not found")))?;
    update.status = status;
    update.progress = progress;
    firmware.save_update(&update).await
}

async fn mark_rolled_back(firmware: &FirmwareStore, update_id: &str) -> Result<(), HubError> {
    let mut update = firmware
        .get_update(update_id)
        .await?
        .ok_or_else(|| HubError::NotFound(format!("update {update_id} not found")))?;
    update.status = UpdateStatus::RolledBack;
    firmware.save_update(&update).await
}

async fn set_device_status(
    devices: &DeviceStore,
    device_id: &str,
    status: DeviceStatus,
) -> Result<(), HubError> {
    let mut device = devices
        .get(device_id)
        .await?
        .ok_or_else(|| HubError::NotFound(format!("device {device_id} not found")))?;
    device.status = status;
    devices.save(&device).await
}

async fn set_device_version(
    devices: &DeviceStore,
    device_id: &str,
    version: &str,
) -> Result<(), HubError> {
    let mut device = devices
        .get(device_id)
        .await?
        .ok_or_else(|| HubError::NotFound(format!("device {device_id} not found")))?;
    device.firmware_version = version.to_owned();
    devices.save(&device).await
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
