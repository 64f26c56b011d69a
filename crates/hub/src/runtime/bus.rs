// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded in-process event bus with durable topic streams.
//!
//! Publishing appends to the durable `events:{topic}` stream first, then
//! enqueues for in-process dispatch without blocking — a full queue drops
//! the dispatch with a logged error, never the durable record. A fixed
//! worker pool drains the queue; handlers for a topic run in registration
//! order within one worker, and a handler failure is logged without
//! aborting the batch or the worker.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use parking_lot::RwLock;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::HubError;
use crate::model::Event;
use crate::store::EventStore;

pub type EventHandler =
    Arc<dyn Fn(Event) -> BoxFuture<'static, Result<(), HubError>> + Send + Sync>;

type SubscriberMap = Arc<RwLock<HashMap<String, Vec<EventHandler>>>>;

pub struct EventBus {
    tx: mpsc::Sender<Event>,
    rx: Arc<Mutex<mpsc::Receiver<Event>>>,
    subscribers: SubscriberMap,
    event_store: Arc<EventStore>,
    worker_count: usize,
    workers: Mutex<Vec<JoinHandle<()>>>,
    shutdown: CancellationToken,
}

impl EventBus {
    pub fn new(
        queue_max_size: usize,
        worker_count: usize,
        event_store: Arc<EventStore>,
        shutdown: CancellationToken,
    ) -> Self {
        let (tx, rx) = mpsc::channel(queue_max_size.max(1));
        Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
            subscribers: Arc::new(RwLock::new(HashMap::new())),
            event_store,
            worker_count,
            workers: Mutex::new(Vec::new()),
            shutdown,
        }
    }

    /// Register a handler for a topic. Handlers run in registration order.
    pub fn subscribe(&self, topic: &str, handler: EventHandler) {
        self.subscribers.write().entry(topic.to_owned()).or_default().push(handler);
    }

    /// Current depth of the bounded queue.
    pub fn queue_depth(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    /// Append the event durably, then enqueue for dispatch. The enqueue is
    /// non-blocking; on a full queue the event is dropped with an error log.
    pub async fn publish(
        &self,
        topic: &str,
        event_type: &str,
        payload: serde_json::Value,
    ) -> Result<(), HubError> {
        let event = self.event_store.append(topic, event_type, payload).await?;

        if let Err(e) = self.tx.try_send(event) {
            tracing::error!(
                topic = %topic,
                event_type = %event_type,
                err = %e,
                "event queue full, dropping event"
            );
        }
        Ok(())
    }

    /// Spawn the worker pool.
    pub async fn start(&self) {
        let mut workers = self.workers.lock().await;
        for worker_id in 0..self.worker_count {
            workers.push(tokio::spawn(worker_loop(
                worker_id,
                Arc::clone(&self.rx),
                Arc::clone(&self.subscribers),
                self.shutdown.clone(),
            )));
        }
        tracing::info!(workers = self.worker_count, "event bus started");
    }

    /// Stop the workers: cancel blocked dequeues, then give in-flight
    /// handlers a 1 s grace to finish.
    pub async fn stop(&self) {
        self.shutdown.cancel();
        let mut workers = self.workers.lock().await;
        for handle in workers.drain(..) {
            if tokio::time::timeout(Duration::from_secs(1), handle).await.is_err() {
                tracing::warn!("event bus worker did not stop within grace period");
            }
        }
        tracing::info!("event bus stopped");
    }
}

async fn worker_loop(
    worker_id: usize,
    rx: Arc<Mutex<mpsc::Receiver<Event>>>,
    subscribers: SubscriberMap,
    shutdown: CancellationToken,
) {
    tracing::debug!(worker_id, "event bus worker started");

    loop {
        // Hold the receiver lock only across the dequeue so handlers on one
        // worker never block the other workers' dequeues.
        let event = {
            let mut rx = rx.lock().await;
            tokio::select! {
                _ = shutdown.cancelled() => break,
                maybe = rx.recv() => match maybe {
                    Some(event) => event,
                    None => break,
                },
            }
        };
        dispatch(&subscribers, event).await;
    }

    tracing::debug!(worker_id, "event bus worker stopped");
}

async fn dispatch(subscribers: &RwLock<HashMap<String, Vec<EventHandler>>>, event: Event) {
    let handlers: Vec<EventHandler> = {
        let subscribers = subscribers.read();
        subscribers.get(&event.topic).cloned().unwrap_or_default()
    };

    for handler in handlers {
        if let Err(e) = handler(event.clone()).await {
            tracing::error!(
                topic = %event.topic,
                event_type = %event.event_type,
                err = %e,
                "event handler failed"
            );
        }
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
