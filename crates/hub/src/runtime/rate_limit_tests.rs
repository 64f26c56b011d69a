// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use proptest::prelude::*;

use super::RateLimiter;
use crate::config::HubConfig;
use crate::error::HubError;
use crate::store::kv::MemoryStore;

fn limiter(device_budget: u64, window_seconds: u64) -> RateLimiter {
    let config = HubConfig {
        rate_limit_telemetry_per_device: device_budget,
        rate_limit_window_seconds: window_seconds,
        ..HubConfig::default()
    };
    RateLimiter::new(Arc::new(MemoryStore::new()), &config)
}

#[tokio::test]
async fn admits_up_to_budget_then_denies() -> Result<(), HubError> {
    let limiter = limiter(5, 60);

    for i in 0..5u64 {
        let decision = limiter.check_device("d-1").await?;
        assert!(decision.allowed, "probe {i} should be admitted");
        assert_eq!(decision.remaining, 4 - i);
    }

    let denied = limiter.check_device("d-1").await?;
    assert!(!denied.allowed);
    assert_eq!(denied.remaining, 0);
    Ok(())
}

#[tokio::test]
async fn budget_is_per_identifier() -> Result<(), HubError> {
    let limiter = limiter(1, 60);

    assert!(limiter.check_device("d-1").await?.allowed);
    assert!(!limiter.check_device("d-1").await?.allowed);
    // A different device has its own window.
    assert!(limiter.check_device("d-2").await?.allowed);
    Ok(())
}

#[tokio::test]
async fn global_window_is_separate_from_devices() -> Result<(), HubError> {
    let config = HubConfig {
        rate_limit_telemetry_per_device: 1,
        rate_limit_global_per_second: 2,
        ..HubConfig::default()
    };
    let limiter = RateLimiter::new(Arc::new(MemoryStore::new()), &config);

    assert!(limiter.check_device("d-1").await?.allowed);
    assert!(limiter.check_global().await?.allowed);
    assert!(limiter.check_global().await?.allowed);
    assert!(!limiter.check_global().await?.allowed);
    // The exhausted global window does not affect the device window of
    // another device.
    assert!(limiter.check_device("d-2").await?.allowed);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Admissions within one window never exceed the budget, whatever the
    /// probe count.
    #[test]
    fn admissions_never_exceed_budget(budget in 1u64..20, probes in 1usize..64) {
        let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
            Ok(rt) => rt,
            Err(e) => return Err(TestCaseError::fail(format!("runtime: {e}"))),
        };
        let admitted = rt.block_on(async {
            let limiter = limiter(budget, 60);
            let mut admitted = 0u64;
            for _ in 0..probes {
                if let Ok(decision) = limiter.check_device("d-1").await {
                    if decision.allowed {
                        admitted += 1;
                    }
                }
            }
            admitted
        });
        prop_assert!(admitted <= budget);
        prop_assert_eq!(admitted, budget.min(probes as u64));
    }
}
