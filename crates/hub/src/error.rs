// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error kinds for the hub API and runtime substrate.
///
/// `CircuitOpen` and `LockUnavailable` are internal outcomes — they are
/// swallowed or logged by the core flows and only mapped to a response if a
/// handler lets one escape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HubError {
    NotFound(String),
    Invalid(String),
    RateLimited(String),
    Shed { retry_after_seconds: u64 },
    CircuitOpen(String),
    LockUnavailable(String),
    SagaFailed { step: String, message: String },
    Transient(String),
}

impl HubError {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Invalid(_) => 400,
            Self::RateLimited(_) => 429,
            Self::Shed { .. } => 503,
            Self::CircuitOpen(_) | Self::LockUnavailable(_) => 500,
            Self::SagaFailed { .. } | Self::Transient(_) => 500,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Invalid(_) => "INVALID",
            Self::RateLimited(_) => "RATE_LIMITED",
            Self::Shed { .. } => "SHED",
            Self::CircuitOpen(_) => "CIRCUIT_OPEN",
            Self::LockUnavailable(_) => "LOCK_UNAVAILABLE",
            Self::SagaFailed { .. } => "SAGA_FAILED",
            Self::Transient(_) => "TRANSIENT",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::NotFound(m)
            | Self::Invalid(m)
            | Self::RateLimited(m)
            | Self::CircuitOpen(m)
            | Self::LockUnavailable(m)
            | Self::Transient(m) => m.clone(),
            Self::Shed { retry_after_seconds } => {
                format!("service overloaded, retry after {retry_after_seconds}s")
            }
            Self::SagaFailed { step, message } => format!("step {step}: {message}"),
        }
    }

    pub fn to_error_body(&self) -> ErrorBody {
        ErrorBody { code: self.as_str().to_owned(), message: self.message() }
    }
}

impl fmt::Display for HubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.as_str(), self.message())
    }
}

impl std::error::Error for HubError {}

impl IntoResponse for HubError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse { error: self.to_error_body() };
        let mut resp = (status, Json(body)).into_response();
        if let Self::Shed { retry_after_seconds } = self {
            if let Ok(v) = header::HeaderValue::from_str(&retry_after_seconds.to_string()) {
                resp.headers_mut().insert(header::RETRY_AFTER, v);
            }
        }
        resp
    }
}

/// Top-level error response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error body with machine-readable code and human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
