// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Domain services wired by the composition root in `lib.rs`.

pub mod alert;
pub mod analytics;
pub mod device;
pub mod firmware;
pub mod notify;
pub mod orchestrator;
pub mod telemetry;

pub use alert::AlertEngine;
pub use analytics::AnalyticsService;
pub use device::DeviceRegistry;
pub use firmware::FirmwareService;
pub use notify::{Notifier, UnavailableNotifier, WebhookNotifier};
pub use orchestrator::UpdateOrchestrator;
pub use telemetry::TelemetryPipeline;
