// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-local circuit breaker around a flaky dependency.
//!
//! Closed -> Open after `failure_threshold` consecutive failures.
//! Open -> HalfOpen once `timeout` has passed since the last failure.
//! HalfOpen admits at most `half_open_max_calls` concurrent probes and
//! closes again after that many consecutive successes; any half-open
//! failure reopens immediately. State is process-local by design.

use std::future::Future;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::error::HubError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half_open",
        }
    }
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    half_open_calls: u32,
    last_failure: Option<Instant>,
}

pub struct CircuitBreaker {
    name: String,
    failure_threshold: u32,
    timeout: Duration,
    half_open_max_calls: u32,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(
        name: impl Into<String>,
        failure_threshold: u32,
        timeout: Duration,
        half_open_max_calls: u32,
    ) -> Self {
        Self {
            name: name.into(),
            failure_threshold,
            timeout,
            half_open_max_calls,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                failure_count: 0,
                success_count: 0,
                half_open_calls: 0,
                last_failure: None,
            }),
        }
    }

    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    /// Run `op` through the breaker. Rejections fail with `CircuitOpen`
    /// without invoking `op`; otherwise the wrapped outcome is propagated
    /// and recorded.
    pub async fn call<F, Fut, T>(&self, op: F) -> Result<T, HubError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, HubError>>,
    {
        self.admit()?;

        match op().await {
            Ok(value) => {
                self.on_success();
                Ok(value)
            }
            Err(e) => {
                self.on_failure();
                Err(e)
            }
        }
    }

    fn admit(&self) -> Result<(), HubError> {
        let mut inner = self.inner.lock();

        if inner.state == CircuitState::Open {
            let elapsed = inner.last_failure.map(|at| at.elapsed());
            if elapsed.is_none_or(|e| e > self.timeout) {
                tracing::info!(circuit = %self.name, "circuit half-open, probing");
                inner.state = CircuitState::HalfOpen;
                inner.half_open_calls = 0;
                inner.success_count = 0;
            } else {
                return Err(HubError::CircuitOpen(format!("circuit {} is open", self.name)));
            }
        }

        if inner.state == CircuitState::HalfOpen {
            if inner.half_open_calls >= self.half_open_max_calls {
                return Err(HubError::CircuitOpen(format!(
                    "circuit {} half-open limit reached",
                    self.name
                )));
            }
            inner.half_open_calls += 1;
        }

        Ok(())
    }

    fn on_success(&self) {
        let mut inner = self.inner.lock();
        if inner.state == CircuitState::HalfOpen {
            inner.success_count += 1;
            if inner.success_count >= self.half_open_max_calls {
                tracing::info!(circuit = %self.name, "circuit closed");
                inner.state = CircuitState::Closed;
                inner.success_count = 0;
                inner.failure_count = 0;
            }
        } else {
            inner.failure_count = 0;
        }
    }

    fn on_failure(&self) {
        let mut inner = self.inner.lock();
        inner.failure_count += 1;
        inner.last_failure = Some(Instant::now());

        if inner.state == CircuitState::HalfOpen {
            tracing::warn!(circuit = %self.name, "half-open probe failed, reopening");
            inner.state = CircuitState::Open;
            inner.success_count = 0;
            inner.half_open_calls = 0;
        } else if inner.failure_count >= self.failure_threshold {
            tracing::warn!(
                circuit = %self.name,
                failures = inner.failure_count,
                "failure threshold reached, opening circuit"
            );
            inner.state = CircuitState::Open;
        }
    }
}

#[cfg(test)]
#[path = "breaker_tests.rs"]
mod tests;
