// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Firmware catalog and update records.
//!
//! `save_update` enforces two persistence-level invariants: a stored
//! `failed` record is locked against rewrites, and `progress` never moves
//! backwards.

use std::sync::Arc;

use crate::error::HubError;
use crate::model::{FirmwareMetadata, FirmwareUpdate, UpdateStatus};
use crate::store::keys;
use crate::store::kv::{Kv, KvOp};

pub struct FirmwareStore {
    kv: Arc<dyn Kv>,
}

impl FirmwareStore {
    pub fn new(kv: Arc<dyn Kv>) -> Self {
        Self { kv }
    }

    pub async fn save_update(&self, update: &FirmwareUpdate) -> Result<(), HubError> {
        let mut update = update.clone();
        if let Some(existing) = self.get_update(&update.id).await? {
            if existing.status == UpdateStatus::Failed {
                return Ok(());
            }
            if update.progress < existing.progress {
                update.progress = existing.progress;
            }
        }

        let record = serde_json::to_string(&update)
            .map_err(|e| HubError::Transient(format!("encode update {}: {e}", update.id)))?;

        let mut ops = vec![
            KvOp::Set { key: keys::firmware_update(&update.id), value: record },
            KvOp::Set { key: keys::firmware_device(&update.device_id), value: update.id.clone() },
        ];
        if update.status == UpdateStatus::Pending {
            ops.push(KvOp::SAdd { key: keys::FIRMWARE_PENDING.to_owned(), member: update.id.clone() });
        } else if update.status.is_terminal() {
            ops.push(KvOp::SRem { key: keys::FIRMWARE_PENDING.to_owned(), member: update.id.clone() });
        }
        self.kv.pipeline(ops).await
    }

    pub async fn get_update(&self, update_id: &str) -> Result<Option<FirmwareUpdate>, HubError> {
        match self.kv.get(&keys::firmware_update(update_id)).await? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| HubError::Transient(format!("decode update {update_id}: {e}"))),
            None => Ok(None),
        }
    }

    /// The device's most recent update, via the `firmware:device:{d}`
    /// pointer.
    pub async fn get_device_update(
        &self,
        device_id: &str,
    ) -> Result<Option<FirmwareUpdate>, HubError> {
        match self.kv.get(&keys::firmware_device(device_id)).await? {
            Some(update_id) => self.get_update(&update_id).await,
            None => Ok(None),
        }
    }

    pub async fn list_pending(&self) -> Result<Vec<FirmwareUpdate>, HubError> {
        let ids = self.kv.smembers(keys::FIRMWARE_PENDING).await?;
        let mut updates = Vec::new();
        for id in ids {
            if let Some(update) = self.get_update(&id).await? {
                updates.push(update);
            }
        }
        Ok(updates)
    }

    pub async fn save_metadata(&self, metadata: &FirmwareMetadata) -> Result<(), HubError> {
        let record = serde_json::to_string(metadata)
            .map_err(|e| HubError::Transient(format!("encode firmware {}: {e}", metadata.version)))?;
        self.kv
            .pipeline(vec![
                KvOp::Set { key: keys::firmware_metadata(&metadata.version), value: record },
                KvOp::SAdd {
                    key: keys::FIRMWARE_VERSIONS.to_owned(),
                    member: metadata.version.clone(),
                },
            ])
            .await
    }

    pub async fn get_metadata(&self, version: &str) -> Result<Option<FirmwareMetadata>, HubError> {
        match self.kv.get(&keys::firmware_metadata(version)).await? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| HubError::Transient(format!("decode firmware {version}: {e}"))),
            None => Ok(None),
        }
    }

    pub async fn list_versions(&self) -> Result<Vec<String>, HubError> {
        self.kv.smembers(keys::FIRMWARE_VERSIONS).await
    }
}

#[cfg(test)]
#[path = "firmware_tests.rs"]
mod tests;
