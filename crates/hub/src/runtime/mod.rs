// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The runtime substrate: distributed lock, sliding-window rate limiter,
//! circuit breaker, bounded event bus, and saga engine.

pub mod breaker;
pub mod bus;
pub mod lock;
pub mod rate_limit;
pub mod saga;

pub use breaker::{CircuitBreaker, CircuitState};
pub use bus::{EventBus, EventHandler};
pub use lock::{HeldLock, LockManager};
pub use rate_limit::RateLimiter;
pub use saga::Saga;
