// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;
use std::time::Duration;

use super::LockManager;
use crate::error::HubError;
use crate::store::kv::MemoryStore;

const LEASE: Duration = Duration::from_secs(10);

#[tokio::test]
async fn acquire_release_roundtrip() -> Result<(), HubError> {
    let kv = Arc::new(MemoryStore::new());
    let locks = LockManager::new(kv);

    let token = locks.acquire("fw:d-1", LEASE).await?;
    let token = match token {
        Some(t) => t,
        None => panic!("first acquire should succeed"),
    };

    // Held: a second acquire fails.
    assert!(locks.acquire("fw:d-1", LEASE).await?.is_none());
    // Different resource is independent.
    assert!(locks.acquire("fw:d-2", LEASE).await?.is_some());

    assert!(locks.release("fw:d-1", &token).await?);
    assert!(locks.acquire("fw:d-1", LEASE).await?.is_some());
    Ok(())
}

#[tokio::test]
async fn release_requires_the_fencing_token() -> Result<(), HubError> {
    let kv = Arc::new(MemoryStore::new());
    let locks = LockManager::new(kv);

    let _token = locks.acquire("res", LEASE).await?;
    assert!(!locks.release("res", "not-the-token").await?);
    // Still held.
    assert!(locks.acquire("res", LEASE).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn extend_fails_safely_after_loss() -> Result<(), HubError> {
    let kv = Arc::new(MemoryStore::new());
    let locks = LockManager::new(kv);

    let token = match locks.acquire("res", LEASE).await? {
        Some(t) => t,
        None => panic!("acquire should succeed"),
    };
    assert!(locks.extend("res", &token, LEASE).await?);

    locks.release("res", &token).await?;
    assert!(!locks.extend("res", &token, LEASE).await?);
    Ok(())
}

#[tokio::test]
async fn expired_lease_frees_the_lock() -> Result<(), HubError> {
    let kv = Arc::new(MemoryStore::new());
    let locks = LockManager::new(kv);

    let token = match locks.acquire("res", Duration::from_millis(0)).await? {
        Some(t) => t,
        None => panic!("acquire should succeed"),
    };
    // Lease already expired: the slot is free and the old release is a no-op.
    assert!(locks.acquire("res", LEASE).await?.is_some());
    assert!(!locks.release("res", &token).await?);
    Ok(())
}

#[tokio::test]
async fn acquire_with_retry_gives_up_with_lock_unavailable() -> Result<(), HubError> {
    let kv = Arc::new(MemoryStore::new());
    let locks = LockManager::new(kv);

    let _held = locks.acquire("res", LEASE).await?;
    let err = locks
        .acquire_with_retry("res", LEASE, 3, Duration::from_millis(1))
        .await
        .err();
    assert!(matches!(err, Some(HubError::LockUnavailable(_))));
    Ok(())
}

#[tokio::test]
async fn held_lock_releases_and_extends() -> Result<(), HubError> {
    let kv = Arc::new(MemoryStore::new());
    let locks = LockManager::new(kv);

    let held = locks
        .acquire_with_retry("res", LEASE, 3, Duration::from_millis(1))
        .await?;
    assert!(held.extend(LEASE).await?);
    assert!(held.release().await?);
    assert!(locks.acquire("res", LEASE).await?.is_some());
    Ok(())
}
