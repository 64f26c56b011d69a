// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable append-only event streams, one per topic.
//!
//! Streams are sorted sets scored by whole seconds with a 24 h TTL; replay
//! reads a score range. The in-process bus appends here before enqueueing,
//! so a full queue never loses the durable record.

use std::sync::Arc;
use std::time::Duration;

use crate::error::HubError;
use crate::model::Event;
use crate::state::epoch_ms;
use crate::store::keys;
use crate::store::kv::{Kv, KvOp};

const STREAM_TTL: Duration = Duration::from_secs(86400);

pub struct EventStore {
    kv: Arc<dyn Kv>,
}

impl EventStore {
    pub fn new(kv: Arc<dyn Kv>) -> Self {
        Self { kv }
    }

    /// Append an event to its topic stream and return the stored record.
    pub async fn append(
        &self,
        topic: &str,
        event_type: &str,
        payload: serde_json::Value,
    ) -> Result<Event, HubError> {
        let event = Event {
            id: uuid::Uuid::new_v4().to_string(),
            topic: topic.to_owned(),
            event_type: event_type.to_owned(),
            payload,
            timestamp_ms: epoch_ms(),
        };

        let record = serde_json::to_string(&event)
            .map_err(|e| HubError::Transient(format!("encode event {topic}/{event_type}: {e}")))?;
        let stream = keys::events(topic);
        self.kv
            .pipeline(vec![
                KvOp::ZAdd { key: stream.clone(), member: record, score: event.timestamp_ms / 1000 },
                KvOp::Expire { key: stream, ttl: STREAM_TTL },
            ])
            .await?;
        Ok(event)
    }

    /// Replay a topic stream from `since_ms` (inclusive), oldest first.
    pub async fn events(
        &self,
        topic: &str,
        since_ms: Option<u64>,
        limit: usize,
    ) -> Result<Vec<Event>, HubError> {
        let min = since_ms.map_or(0, |ms| ms / 1000);
        let raw = self.kv.zrange_by_score(&keys::events(topic), min, u64::MAX, limit).await?;

        let mut events = Vec::with_capacity(raw.len());
        for record in raw {
            let event: Event = serde_json::from_str(&record)
                .map_err(|e| HubError::Transient(format!("decode event on {topic}: {e}")))?;
            events.push(event);
        }
        Ok(events)
    }
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
