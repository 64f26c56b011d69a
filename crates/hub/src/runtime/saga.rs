// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Forward-then-compensate transaction pattern.
//!
//! Steps run in order; on the first failure the compensations of the
//! already-completed steps run in reverse order. Compensation failures are
//! logged and never abort the chain. The original step failure is
//! propagated to the caller wrapped as `SagaFailed` after compensation
//! completes.

use futures_util::future::BoxFuture;

use crate::error::HubError;

type StepFn = Box<dyn Fn() -> BoxFuture<'static, Result<(), HubError>> + Send + Sync>;

struct SagaStep {
    name: String,
    action: StepFn,
    compensation: StepFn,
}

pub struct Saga {
    name: String,
    steps: Vec<SagaStep>,
}

/// Outcome detail of a failed saga, for callers that need to know whether
/// any compensation ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SagaFailure {
    pub step: String,
    pub error: HubError,
    pub compensated_steps: usize,
}

impl Saga {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), steps: Vec::new() }
    }

    pub fn step(
        mut self,
        name: impl Into<String>,
        action: impl Fn() -> BoxFuture<'static, Result<(), HubError>> + Send + Sync + 'static,
        compensation: impl Fn() -> BoxFuture<'static, Result<(), HubError>> + Send + Sync + 'static,
    ) -> Self {
        self.steps.push(SagaStep {
            name: name.into(),
            action: Box::new(action),
            compensation: Box::new(compensation),
        });
        self
    }

    /// Run the saga. `Err` carries the failing step and how many
    /// compensations ran.
    pub async fn execute(&self) -> Result<(), SagaFailure> {
        let mut completed: Vec<&SagaStep> = Vec::new();

        for step in &self.steps {
            tracing::info!(saga = %self.name, step = %step.name, "executing step");
            if let Err(e) = (step.action)().await {
                tracing::error!(saga = %self.name, step = %step.name, err = %e, "step failed");
                let compensated_steps = self.compensate(&completed).await;
                return Err(SagaFailure { step: step.name.clone(), error: e, compensated_steps });
            }
            completed.push(step);
        }

        tracing::info!(saga = %self.name, "completed");
        Ok(())
    }

    async fn compensate(&self, completed: &[&SagaStep]) -> usize {
        tracing::info!(saga = %self.name, steps = completed.len(), "starting compensation");

        for step in completed.iter().rev() {
            tracing::info!(saga = %self.name, step = %step.name, "compensating step");
            if let Err(e) = (step.compensation)().await {
                tracing::error!(
                    saga = %self.name,
                    step = %step.name,
                    err = %e,
                    "compensation failed"
                );
            }
        }

        completed.len()
    }
}

impl From<SagaFailure> for HubError {
    fn from(failure: SagaFailure) -> Self {
        HubError::SagaFailed { step: failure.step, message: failure.error.message() }
    }
}

#[cfg(test)]
#[path = "saga_tests.rs"]
mod tests;
