// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Device registry: idempotent registration, partial updates, liveness
//! touches.
//!
//! Registration resolves concurrent attempts for one serial number to a
//! single identity with a set-if-absent loop on the serial index — no lock,
//! and livelock-free: a loser either observes the winner's index entry on
//! re-read or gives up after a bounded number of attempts.

use std::sync::Arc;
use std::time::Duration;

use crate::config::HubConfig;
use crate::error::HubError;
use crate::model::{Device, DevicePatch, DeviceRegistration, DeviceStatus};
use crate::runtime::EventBus;
use crate::state::epoch_ms;
use crate::store::keys;
use crate::store::kv::Kv;
use crate::store::DeviceStore;

pub struct DeviceRegistry {
    store: Arc<DeviceStore>,
    kv: Arc<dyn Kv>,
    bus: Arc<EventBus>,
    serial_index_ttl: Duration,
    register_attempts: u32,
}

impl DeviceRegistry {
    pub fn new(
        store: Arc<DeviceStore>,
        kv: Arc<dyn Kv>,
        bus: Arc<EventBus>,
        config: &HubConfig,
    ) -> Self {
        Self {
            store,
            kv,
            bus,
            serial_index_ttl: Duration::from_secs(config.serial_index_ttl_seconds),
            register_attempts: config.register_retry_attempts,
        }
    }

    /// Register a device, resolving races on the serial number to one id.
    pub async fn register(
        &self,
        registration: DeviceRegistration,
        idempotency_key: &str,
    ) -> Result<Device, HubError> {
        let serial_key = keys::device_serial(&registration.serial_number);
        tracing::debug!(
            serial = %registration.serial_number,
            idempotency_key = %idempotency_key,
            "registering device"
        );

        for attempt in 0..self.register_attempts {
            if let Some(device) = self.lookup_serial(&serial_key).await? {
                return Ok(device);
            }

            let device = Device {
                id: uuid::Uuid::new_v4().to_string(),
                serial_number: registration.serial_number.clone(),
                device_type: registration.device_type,
                status: DeviceStatus::Registered,
                firmware_version: registration.firmware_version.clone(),
                metadata: registration.metadata.clone(),
                registered_at_ms: epoch_ms(),
                last_seen_ms: None,
                location: registration.location.clone(),
                group_id: registration.group_id.clone(),
            };

            if self.kv.set_nx_ex(&serial_key, &device.id, self.serial_index_ttl).await? {
                self.store.save(&device).await?;
                self.bus
                    .publish(
                        "device.lifecycle",
                        "device.registered",
                        serde_json::json!({
                            "device_id": device.id,
                            "serial_number": device.serial_number,
                        }),
                    )
                    .await?;
                return Ok(device);
            }

            // Someone raced us to the serial index; back off and re-read.
            tokio::time::sleep(Duration::from_millis(10 * (attempt as u64 + 1))).await;
        }

        // The winner may still be mid-save; one last consult before failing.
        if let Some(device) = self.lookup_serial(&serial_key).await? {
            return Ok(device);
        }
        Err(HubError::Transient(format!(
            "failed to register device {} after {} attempts",
            registration.serial_number, self.register_attempts
        )))
    }

    async fn lookup_serial(&self, serial_key: &str) -> Result<Option<Device>, HubError> {
        match self.kv.get(serial_key).await? {
            Some(device_id) => self.store.get(&device_id).await,
            None => Ok(None),
        }
    }

    pub async fn get(&self, device_id: &str) -> Result<Device, HubError> {
        self.store
            .get(device_id)
            .await?
            .ok_or_else(|| HubError::NotFound(format!("device {device_id} not found")))
    }

    /// Apply the present fields of the patch, save, and publish the update.
    pub async fn update(&self, device_id: &str, patch: DevicePatch) -> Result<Device, HubError> {
        let mut device = self.get(device_id).await?;

        if let Some(status) = patch.status {
            device.status = status;
        }
        if let Some(ref location) = patch.location {
            device.location = Some(location.clone());
        }
        if let Some(ref metadata) = patch.metadata {
            device.metadata = metadata.clone();
        }
        if let Some(ref group_id) = patch.group_id {
            device.group_id = Some(group_id.clone());
        }

        self.store.invalidate(device_id);
        self.store.save(&device).await?;

        self.bus
            .publish(
                "device.lifecycle",
                "device.updated",
                serde_json::json!({
                    "device_id": device_id,
                    "updates": patch,
                }),
            )
            .await?;
        Ok(device)
    }

    pub async fn list(
        &self,
        group_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Device>, HubError> {
        self.store.list(group_id, limit).await
    }

    /// Touch `last_seen` and flip to active; called on every ingestion.
    /// Unknown devices are ignored — telemetry is not rejected for them.
    pub async fn mark_active(&self, device_id: &str) -> Result<(), HubError> {
        let Some(mut device) = self.store.get(device_id).await? else {
            return Ok(());
        };
        device.last_seen_ms = Some(epoch_ms());
        device.status = DeviceStatus::Active;
        self.store.save(&device).await
    }
}

#[cfg(test)]
#[path = "device_tests.rs"]
mod tests;
