// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

/// Configuration for the SensorHub service.
#[derive(Debug, Clone, clap::Args)]
pub struct HubConfig {
    /// Host to bind on.
    #[arg(long, default_value = "127.0.0.1", env = "SENSORHUB_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 9600, env = "SENSORHUB_PORT")]
    pub port: u16,

    /// Per-device telemetry budget per sliding window.
    #[arg(long, default_value_t = 100, env = "SENSORHUB_RATE_LIMIT_TELEMETRY_PER_DEVICE")]
    pub rate_limit_telemetry_per_device: u64,

    /// Sliding window size in seconds for the per-device limiter.
    #[arg(long, default_value_t = 60, env = "SENSORHUB_RATE_LIMIT_WINDOW_SECONDS")]
    pub rate_limit_window_seconds: u64,

    /// Global telemetry admissions per second.
    #[arg(long, default_value_t = 10000, env = "SENSORHUB_RATE_LIMIT_GLOBAL_PER_SECOND")]
    pub rate_limit_global_per_second: u64,

    /// Consecutive failures before a circuit opens.
    #[arg(long, default_value_t = 6, env = "SENSORHUB_CIRCUIT_BREAKER_FAILURE_THRESHOLD")]
    pub circuit_breaker_failure_threshold: u32,

    /// Seconds an open circuit waits before probing half-open.
    #[arg(long, default_value_t = 60, env = "SENSORHUB_CIRCUIT_BREAKER_TIMEOUT_SECONDS")]
    pub circuit_breaker_timeout_seconds: u64,

    /// Admission cap (and required success streak) while half-open.
    #[arg(long, default_value_t = 3, env = "SENSORHUB_CIRCUIT_BREAKER_HALF_OPEN_MAX_CALLS")]
    pub circuit_breaker_half_open_max_calls: u32,

    /// Distributed lock lease in seconds.
    #[arg(long, default_value_t = 10, env = "SENSORHUB_LOCK_TIMEOUT_SECONDS")]
    pub lock_timeout_seconds: u64,

    /// Delay between lock acquire attempts in milliseconds.
    #[arg(long, default_value_t = 50, env = "SENSORHUB_LOCK_RETRY_DELAY_MS")]
    pub lock_retry_delay_ms: u64,

    /// Acquire attempts in the lock convenience wrapper.
    #[arg(long, default_value_t = 3, env = "SENSORHUB_LOCK_RETRY_ATTEMPTS")]
    pub lock_retry_attempts: u32,

    /// Maximum points accepted in one telemetry batch.
    #[arg(long, default_value_t = 1000, env = "SENSORHUB_TELEMETRY_BATCH_MAX_SIZE")]
    pub telemetry_batch_max_size: usize,

    /// Retention TTL in seconds for telemetry streams.
    #[arg(long, default_value_t = 86400, env = "SENSORHUB_TELEMETRY_RETENTION_SECONDS")]
    pub telemetry_retention_seconds: u64,

    /// Bounded in-memory event queue capacity.
    #[arg(long, default_value_t = 10000, env = "SENSORHUB_EVENT_BUS_QUEUE_MAX_SIZE")]
    pub event_bus_queue_max_size: usize,

    /// Event dispatch worker count.
    #[arg(long, default_value_t = 4, env = "SENSORHUB_EVENT_BUS_WORKER_COUNT")]
    pub event_bus_worker_count: usize,

    /// Queue depth at which telemetry requests are shed with 429.
    #[arg(long, default_value_t = 8000, env = "SENSORHUB_BACKPRESSURE_QUEUE_THRESHOLD")]
    pub backpressure_queue_threshold: usize,

    /// Queue depth at which telemetry requests are rejected with 503.
    #[arg(long, default_value_t = 9500, env = "SENSORHUB_BACKPRESSURE_REJECT_THRESHOLD")]
    pub backpressure_reject_threshold: usize,

    /// Webhook target for alert notifications. If unset, the notifier
    /// reports unavailable and the circuit breaker absorbs the failures.
    #[arg(long, env = "SENSORHUB_NOTIFIER_URL")]
    pub notifier_url: Option<String>,

    /// Outbound notifier timeout in seconds.
    #[arg(long, default_value_t = 5, env = "SENSORHUB_NOTIFIER_TIMEOUT_SECONDS")]
    pub notifier_timeout_seconds: u64,

    /// Capacity of the in-process device LRU cache.
    #[arg(long, default_value_t = 1024, env = "SENSORHUB_DEVICE_CACHE_CAPACITY")]
    pub device_cache_capacity: usize,

    /// TTL in seconds on serial-number index reservations.
    #[arg(long, default_value_t = 3600, env = "SENSORHUB_SERIAL_INDEX_TTL_SECONDS")]
    pub serial_index_ttl_seconds: u64,

    /// Set-if-absent attempts during device registration.
    #[arg(long, default_value_t = 10, env = "SENSORHUB_REGISTER_RETRY_ATTEMPTS")]
    pub register_retry_attempts: u32,
}

impl Default for HubConfig {
    /// The documented defaults, for embedding and tests. Kept in agreement
    /// with the clap defaults (asserted in the config tests).
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 9600,
            rate_limit_telemetry_per_device: 100,
            rate_limit_window_seconds: 60,
            rate_limit_global_per_second: 10000,
            circuit_breaker_failure_threshold: 6,
            circuit_breaker_timeout_seconds: 60,
            circuit_breaker_half_open_max_calls: 3,
            lock_timeout_seconds: 10,
            lock_retry_delay_ms: 50,
            lock_retry_attempts: 3,
            telemetry_batch_max_size: 1000,
            telemetry_retention_seconds: 86400,
            event_bus_queue_max_size: 10000,
            event_bus_worker_count: 4,
            backpressure_queue_threshold: 8000,
            backpressure_reject_threshold: 9500,
            notifier_url: None,
            notifier_timeout_seconds: 5,
            device_cache_capacity: 1024,
            serial_index_ttl_seconds: 3600,
            register_retry_attempts: 10,
        }
    }
}

impl HubConfig {
    pub fn lock_lease(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.lock_timeout_seconds)
    }

    pub fn lock_retry_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.lock_retry_delay_ms)
    }

    pub fn breaker_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.circuit_breaker_timeout_seconds)
    }

    pub fn notifier_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.notifier_timeout_seconds)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
