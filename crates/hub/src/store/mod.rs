// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed persistence over the shared key-value store.
//!
//! `Kv` is the black-box store contract: plain keys, sets, sorted sets,
//! counters, a handful of single-round-trip atomic operations, and pipeline
//! batching. The typed stores in this module own serialization and index
//! maintenance; callers never touch raw keys outside `keys`.

pub mod alert;
pub mod device;
pub mod events;
pub mod firmware;
pub mod keys;
pub mod kv;
pub mod telemetry;

pub use alert::AlertStore;
pub use device::DeviceStore;
pub use events::EventStore;
pub use firmware::FirmwareStore;
pub use kv::{Kv, KvOp, MemoryStore, SlidingWindowDecision};
pub use telemetry::TelemetryStore;
