// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound alert notification.
//!
//! The notifier sits behind the circuit breaker; its failures are always
//! swallowed by the alert engine, so a down notification endpoint can never
//! fail alert creation.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::HubError;
use crate::model::Alert;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, alert: &Alert) -> Result<(), HubError>;
}

/// POSTs the alert as JSON to a configured webhook.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: String, timeout: Duration) -> Result<Self, HubError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HubError::Transient(format!("notifier client: {e}")))?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, alert: &Alert) -> Result<(), HubError> {
        let resp = self
            .client
            .post(&self.url)
            .json(alert)
            .send()
            .await
            .map_err(|e| HubError::Transient(format!("notifier request: {e}")))?;

        if !resp.status().is_success() {
            return Err(HubError::Transient(format!(
                "notifier returned {}",
                resp.status().as_u16()
            )));
        }
        Ok(())
    }
}

/// Stand-in when no webhook is configured: every call reports the service
/// unavailable, which the breaker absorbs the same way as a real outage.
pub struct UnavailableNotifier;

#[async_trait]
impl Notifier for UnavailableNotifier {
    async fn notify(&self, _alert: &Alert) -> Result<(), HubError> {
        tokio::time::sleep(Duration::from_millis(10)).await;
        Err(HubError::Transient("notification service unavailable".into()))
    }
}
