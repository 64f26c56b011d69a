// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Device records, indexes, and the in-process read cache.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::error::HubError;
use crate::model::Device;
use crate::store::keys;
use crate::store::kv::{Kv, KvOp};

/// Bounded LRU of device records.
///
/// Uses `IndexMap` for O(1) insert/remove with insertion-order iteration.
/// Most-recently-touched entries are at the back; eviction pops from the
/// front. The cache is a weak view: writes go to the store first, then
/// refresh the cache, and cross-process staleness is acceptable.
struct DeviceCache {
    map: IndexMap<String, Device>,
    capacity: usize,
}

impl DeviceCache {
    fn new(capacity: usize) -> Self {
        Self { map: IndexMap::with_capacity(capacity), capacity }
    }

    fn get(&mut self, id: &str) -> Option<Device> {
        let device = self.map.shift_remove(id)?;
        self.map.insert(id.to_owned(), device.clone());
        Some(device)
    }

    fn put(&mut self, device: Device) {
        self.map.shift_remove(&device.id);
        self.map.insert(device.id.clone(), device);
        while self.map.len() > self.capacity {
            self.map.shift_remove_index(0);
        }
    }

    fn invalidate(&mut self, id: &str) {
        self.map.shift_remove(id);
    }
}

pub struct DeviceStore {
    kv: Arc<dyn Kv>,
    cache: Mutex<DeviceCache>,
}

impl DeviceStore {
    pub fn new(kv: Arc<dyn Kv>, cache_capacity: usize) -> Self {
        Self { kv, cache: Mutex::new(DeviceCache::new(cache_capacity)) }
    }

    /// Persist a device record and its membership indexes, then refresh the
    /// cache.
    pub async fn save(&self, device: &Device) -> Result<(), HubError> {
        let record = serde_json::to_string(device)
            .map_err(|e| HubError::Transient(format!("encode device {}: {e}", device.id)))?;

        let mut ops = vec![
            KvOp::Set { key: keys::device(&device.id), value: record },
            KvOp::SAdd { key: keys::DEVICE_ALL.to_owned(), member: device.id.clone() },
        ];
        if let Some(ref group_id) = device.group_id {
            ops.push(KvOp::SAdd { key: keys::device_group(group_id), member: device.id.clone() });
        }
        self.kv.pipeline(ops).await?;

        self.cache.lock().put(device.clone());
        Ok(())
    }

    pub async fn get(&self, device_id: &str) -> Result<Option<Device>, HubError> {
        if let Some(device) = self.cache.lock().get(device_id) {
            return Ok(Some(device));
        }

        let Some(raw) = self.kv.get(&keys::device(device_id)).await? else {
            return Ok(None);
        };
        let device: Device = serde_json::from_str(&raw)
            .map_err(|e| HubError::Transient(format!("decode device {device_id}: {e}")))?;
        self.cache.lock().put(device.clone());
        Ok(Some(device))
    }

    /// Resolve a serial number through the `device:serial:{s}` index.
    pub async fn get_by_serial(&self, serial: &str) -> Result<Option<Device>, HubError> {
        let Some(device_id) = self.kv.get(&keys::device_serial(serial)).await? else {
            return Ok(None);
        };
        self.get(&device_id).await
    }

    pub async fn list(
        &self,
        group_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Device>, HubError> {
        let index = match group_id {
            Some(g) => keys::device_group(g),
            None => keys::DEVICE_ALL.to_owned(),
        };
        let ids = self.kv.smembers(&index).await?;

        let mut devices = Vec::new();
        for id in ids.into_iter().take(limit) {
            if let Some(device) = self.get(&id).await? {
                devices.push(device);
            }
        }
        Ok(devices)
    }

    pub fn invalidate(&self, device_id: &str) {
        self.cache.lock().invalidate(device_id);
    }
}

#[cfg(test)]
#[path = "device_tests.rs"]
mod tests;
