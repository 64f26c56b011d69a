// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared hub state, built once by the composition root and injected into
//! handlers. Construction is leaves-first: stores over the raw `Kv`, then
//! the runtime substrate, then the services that combine them.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::HubConfig;
use crate::runtime::{CircuitBreaker, EventBus, LockManager, RateLimiter};
use crate::service::{
    AlertEngine, AnalyticsService, DeviceRegistry, FirmwareService, Notifier, TelemetryPipeline,
    UnavailableNotifier, UpdateOrchestrator, WebhookNotifier,
};
use crate::store::kv::Kv;
use crate::store::{AlertStore, DeviceStore, EventStore, FirmwareStore, TelemetryStore};

pub fn epoch_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

pub struct HubState {
    pub config: HubConfig,
    pub shutdown: CancellationToken,
    pub bus: Arc<EventBus>,
    pub limiter: Arc<RateLimiter>,
    pub locks: Arc<LockManager>,
    pub events: Arc<EventStore>,
    pub registry: Arc<DeviceRegistry>,
    pub telemetry: Arc<TelemetryPipeline>,
    pub alerts: Arc<AlertEngine>,
    pub firmware: Arc<FirmwareService>,
    pub analytics: Arc<AnalyticsService>,
}

impl HubState {
    pub fn new(config: HubConfig, kv: Arc<dyn Kv>, shutdown: CancellationToken) -> Self {
        let events = Arc::new(EventStore::new(kv.clone()));
        let bus = Arc::new(EventBus::new(
            config.event_bus_queue_max_size,
            config.event_bus_worker_count,
            Arc::clone(&events),
            shutdown.child_token(),
        ));

        let device_store = Arc::new(DeviceStore::new(kv.clone(), config.device_cache_capacity));
        let telemetry_store =
            Arc::new(TelemetryStore::new(kv.clone(), config.telemetry_retention_seconds));
        let alert_store = Arc::new(AlertStore::new(kv.clone()));
        let firmware_store = Arc::new(FirmwareStore::new(kv.clone()));

        let limiter = Arc::new(RateLimiter::new(kv.clone(), &config));
        let locks = Arc::new(LockManager::new(kv.clone()));

        let notifier: Arc<dyn Notifier> = match config.notifier_url {
            Some(ref url) => {
                match WebhookNotifier::new(url.clone(), config.notifier_timeout()) {
                    Ok(webhook) => Arc::new(webhook),
                    Err(e) => {
                        tracing::warn!(err = %e, "webhook notifier unavailable, using stand-in");
                        Arc::new(UnavailableNotifier)
                    }
                }
            }
            None => Arc::new(UnavailableNotifier),
        };
        let notifier_breaker = Arc::new(CircuitBreaker::new(
            "notification_service",
            config.circuit_breaker_failure_threshold,
            Duration::from_secs(config.circuit_breaker_timeout_seconds),
            config.circuit_breaker_half_open_max_calls,
        ));

        let registry = Arc::new(DeviceRegistry::new(
            Arc::clone(&device_store),
            kv.clone(),
            Arc::clone(&bus),
            &config,
        ));
        let alerts = Arc::new(AlertEngine::new(
            Arc::clone(&alert_store),
            Arc::clone(&bus),
            notifier_breaker,
            notifier,
        ));
        let telemetry = Arc::new(TelemetryPipeline::new(
            Arc::clone(&telemetry_store),
            Arc::clone(&registry),
            Arc::clone(&alerts),
            Arc::clone(&bus),
            Arc::clone(&limiter),
            &config,
        ));
        let orchestrator = Arc::new(UpdateOrchestrator::new(
            Arc::clone(&firmware_store),
            Arc::clone(&device_store),
            Arc::clone(&bus),
        ));
        let firmware = Arc::new(FirmwareService::new(
            Arc::clone(&firmware_store),
            Arc::clone(&registry),
            orchestrator,
            Arc::clone(&bus),
        ));
        let analytics = Arc::new(AnalyticsService::new(
            device_store,
            telemetry_store,
            alert_store,
            firmware_store,
        ));

        Self {
            config,
            shutdown,
            bus,
            limiter,
            locks,
            events,
            registry,
            telemetry,
            alerts,
            firmware,
            analytics,
        }
    }
}
