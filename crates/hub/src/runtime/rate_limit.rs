// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sliding-window admission over `ratelimit:{identifier}` sorted sets.
//!
//! Each probe is one atomic store command: expire old entries, compare the
//! window cardinality against the budget, and record the admission. Denied
//! probes consume no slot. Window keys carry a TTL of twice the window so
//! idle identifiers age out.

use std::sync::Arc;
use std::time::Duration;

use crate::config::HubConfig;
use crate::error::HubError;
use crate::state::epoch_ms;
use crate::store::keys;
use crate::store::kv::{Kv, SlidingWindowDecision};

pub struct RateLimiter {
    kv: Arc<dyn Kv>,
    device_budget: u64,
    device_window_seconds: u64,
    global_budget: u64,
}

impl RateLimiter {
    pub fn new(kv: Arc<dyn Kv>, config: &HubConfig) -> Self {
        Self {
            kv,
            device_budget: config.rate_limit_telemetry_per_device,
            device_window_seconds: config.rate_limit_window_seconds,
            global_budget: config.rate_limit_global_per_second,
        }
    }

    /// One admission probe for `identifier` against `budget` per
    /// `window_seconds`.
    pub async fn check(
        &self,
        identifier: &str,
        budget: u64,
        window_seconds: u64,
    ) -> Result<SlidingWindowDecision, HubError> {
        let now_ms = epoch_ms();
        let window_start_ms = now_ms.saturating_sub(window_seconds * 1000);
        self.kv
            .sliding_window(
                &keys::ratelimit(identifier),
                now_ms,
                window_start_ms,
                budget,
                Duration::from_secs(window_seconds * 2),
            )
            .await
    }

    pub async fn check_device(&self, device_id: &str) -> Result<SlidingWindowDecision, HubError> {
        self.check(&format!("device:{device_id}"), self.device_budget, self.device_window_seconds)
            .await
    }

    pub async fn check_global(&self) -> Result<SlidingWindowDecision, HubError> {
        self.check("global", self.global_budget, 1).await
    }
}

#[cfg(test)]
#[path = "rate_limit_tests.rs"]
mod tests;
