// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use parking_lot::Mutex;

use super::Saga;
use crate::error::HubError;

type Trace = Arc<Mutex<Vec<String>>>;

fn recording_saga(fail_at: Option<usize>, step_count: usize, trace: &Trace) -> Saga {
    let mut saga = Saga::new("test");
    for i in 0..step_count {
        let action_trace = Arc::clone(trace);
        let comp_trace = Arc::clone(trace);
        saga = saga.step(
            format!("step-{i}"),
            move || {
                let trace = Arc::clone(&action_trace);
                Box::pin(async move {
                    if fail_at == Some(i) {
                        return Err(HubError::Transient(format!("step-{i} exploded")));
                    }
                    trace.lock().push(format!("do-{i}"));
                    Ok(())
                })
            },
            move || {
                let trace = Arc::clone(&comp_trace);
                Box::pin(async move {
                    trace.lock().push(format!("undo-{i}"));
                    Ok(())
                })
            },
        );
    }
    saga
}

#[tokio::test]
async fn success_runs_every_step_in_order() {
    let trace: Trace = Arc::new(Mutex::new(Vec::new()));
    let saga = recording_saga(None, 3, &trace);

    assert!(saga.execute().await.is_ok());
    assert_eq!(*trace.lock(), vec!["do-0", "do-1", "do-2"]);
}

#[tokio::test]
async fn failure_compensates_completed_steps_in_reverse() {
    let trace: Trace = Arc::new(Mutex::new(Vec::new()));
    let saga = recording_saga(Some(2), 4, &trace);

    let failure = match saga.execute().await {
        Err(f) => f,
        Ok(()) => panic!("saga should fail"),
    };
    assert_eq!(failure.step, "step-2");
    assert_eq!(failure.compensated_steps, 2);
    assert_eq!(*trace.lock(), vec!["do-0", "do-1", "undo-1", "undo-0"]);
}

#[tokio::test]
async fn first_step_failure_runs_no_compensation() {
    let trace: Trace = Arc::new(Mutex::new(Vec::new()));
    let saga = recording_saga(Some(0), 3, &trace);

    let failure = match saga.execute().await {
        Err(f) => f,
        Ok(()) => panic!("saga should fail"),
    };
    assert_eq!(failure.compensated_steps, 0);
    assert!(trace.lock().is_empty());
}

#[tokio::test]
async fn compensation_failure_does_not_abort_the_chain() {
    let trace: Trace = Arc::new(Mutex::new(Vec::new()));
    let t0 = Arc::clone(&trace);
    let saga = Saga::new("test")
        .step(
            "first",
            move || {
                let trace = Arc::clone(&t0);
                Box::pin(async move {
                    trace.lock().push("do-first".to_owned());
                    Ok(())
                })
            },
            {
                let trace = Arc::clone(&trace);
                move || {
                    let trace = Arc::clone(&trace);
                    Box::pin(async move {
                        trace.lock().push("undo-first".to_owned());
                        Ok(())
                    })
                }
            },
        )
        .step(
            "second",
            || Box::pin(async { Ok(()) }),
            || Box::pin(async { Err(HubError::Transient("undo broke".into())) }),
        )
        .step(
            "third",
            || Box::pin(async { Err(HubError::Transient("boom".into())) }),
            || Box::pin(async { Ok(()) }),
        );

    let failure = match saga.execute().await {
        Err(f) => f,
        Ok(()) => panic!("saga should fail"),
    };
    // Both completed steps were compensated even though one compensation
    // failed, and the original error is the one propagated.
    assert_eq!(failure.compensated_steps, 2);
    assert_eq!(failure.step, "third");
    assert!(failure.error.message().contains("boom"));
    assert_eq!(*trace.lock(), vec!["do-first", "undo-first"]);
}

#[tokio::test]
async fn failure_converts_to_saga_failed_error() {
    let trace: Trace = Arc::new(Mutex::new(Vec::new()));
    let saga = recording_saga(Some(1), 2, &trace);

    let failure = match saga.execute().await {
        Err(f) => f,
        Ok(()) => panic!("saga should fail"),
    };
    let err: HubError = failure.into();
    assert!(matches!(err, HubError::SagaFailed { ref step, .. } if step == "step-1"));
}
