// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Telemetry ingress filters.
//!
//! Two guards wrap the router, applying only to `/telemetry` paths. The
//! global sliding-window gate sheds with 429 when the fleet-wide budget is
//! exhausted; the queue-depth guard sheds with 429 past the soft threshold
//! and 503 (`Retry-After: 5`) past the hard one.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::HubError;
use crate::state::HubState;

const SHED_RETRY_AFTER_SECONDS: u64 = 5;

fn is_telemetry(req: &Request) -> bool {
    req.uri().path().starts_with("/telemetry")
}

/// Fleet-wide admission gate.
pub async fn global_rate_guard(
    State(state): State<Arc<HubState>>,
    req: Request,
    next: Next,
) -> Response {
    if is_telemetry(&req) {
        match state.limiter.check_global().await {
            Ok(decision) if !decision.allowed => {
                return HubError::RateLimited("Global rate limit exceeded".into())
                    .into_response();
            }
            Ok(_) => {}
            Err(e) => return e.into_response(),
        }
    }
    next.run(req).await
}

/// Queue-depth backpressure gate.
pub async fn backpressure_guard(
    State(state): State<Arc<HubState>>,
    req: Request,
    next: Next,
) -> Response {
    if is_telemetry(&req) {
        let depth = state.bus.queue_depth();

        if depth >= state.config.backpressure_reject_threshold {
            tracing::warn!(depth, "rejecting telemetry, event queue past hard threshold");
            return HubError::Shed { retry_after_seconds: SHED_RETRY_AFTER_SECONDS }
                .into_response();
        }
        if depth >= state.config.backpressure_queue_threshold {
            tracing::warn!(depth, "shedding telemetry, event queue past soft threshold");
            return HubError::RateLimited(format!(
                "Too many requests, queue depth {depth}"
            ))
            .into_response();
        }
    }
    next.run(req).await
}
