// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lease-based distributed mutual exclusion over the shared store.
//!
//! A lock is a `lock:{resource}` key holding an opaque 128-bit fencing
//! token, written set-if-absent with the lease as TTL. Release and extend
//! compare the token first, so a holder whose lease already expired cannot
//! interfere with the next holder.

use std::sync::Arc;
use std::time::Duration;

use crate::error::HubError;
use crate::store::keys;
use crate::store::kv::Kv;

pub struct LockManager {
    kv: Arc<dyn Kv>,
}

/// A currently-held lock. Dropping it without `release` leaves the lease to
/// expire on its own.
pub struct HeldLock {
    kv: Arc<dyn Kv>,
    pub resource: String,
    pub token: String,
}

impl LockManager {
    pub fn new(kv: Arc<dyn Kv>) -> Self {
        Self { kv }
    }

    /// Try to take the lock once. Returns the fencing token on success.
    pub async fn acquire(
        &self,
        resource: &str,
        lease: Duration,
    ) -> Result<Option<String>, HubError> {
        let token = format!("{:032x}", rand::random::<u128>());
        if self.kv.set_nx_ex(&keys::lock(resource), &token, lease).await? {
            Ok(Some(token))
        } else {
            Ok(None)
        }
    }

    /// Release the lock iff `token` still owns it. A release after lease
    /// expiry is a no-op.
    pub async fn release(&self, resource: &str, token: &str) -> Result<bool, HubError> {
        self.kv.compare_and_delete(&keys::lock(resource), token).await
    }

    /// Extend the lease iff `token` still owns the lock.
    pub async fn extend(
        &self,
        resource: &str,
        token: &str,
        lease: Duration,
    ) -> Result<bool, HubError> {
        self.kv.compare_and_expire(&keys::lock(resource), token, lease).await
    }

    /// Acquire with a bounded number of fixed-delay retries. Fails with
    /// `LockUnavailable` once the attempts are exhausted.
    pub async fn acquire_with_retry(
        &self,
        resource: &str,
        lease: Duration,
        attempts: u32,
        retry_delay: Duration,
    ) -> Result<HeldLock, HubError> {
        for attempt in 0..attempts {
            if let Some(token) = self.acquire(resource, lease).await? {
                return Ok(HeldLock {
                    kv: Arc::clone(&self.kv),
                    resource: resource.to_owned(),
                    token,
                });
            }
            if attempt + 1 < attempts {
                tokio::time::sleep(retry_delay).await;
            }
        }
        Err(HubError::LockUnavailable(format!(
            "failed to acquire lock for {resource} after {attempts} attempts"
        )))
    }
}

impl HeldLock {
    pub async fn release(self) -> Result<bool, HubError> {
        self.kv.compare_and_delete(&keys::lock(&self.resource), &self.token).await
    }

    pub async fn extend(&self, lease: Duration) -> Result<bool, HubError> {
        self.kv.compare_and_expire(&keys::lock(&self.resource), &self.token, lease).await
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
