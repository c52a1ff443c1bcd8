//  Copyright (c) 2026 Metaform Systems, Inc
//
//  This program and the accompanying materials are made available under the
//  terms of the Apache License, Version 2.0 which is available at
//  https://www.apache.org/licenses/LICENSE-2.0
//
//  SPDX-License-Identifier: Apache-2.0
//
//  Contributors:
//       Metaform Systems, Inc. - initial API and implementation
//

use crate::lock::{LockError, LockGuard, LockManager};
use async_trait::async_trait;
use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

type TargetLock = Arc<tokio::sync::Mutex<()>>;

struct MemoryLockManagerInner {
    locks: Mutex<HashMap<String, TargetLock>>,
}

/// In-process lock manager backed by one fair Tokio mutex per identifier.
///
/// Tokio mutexes grant the lock in FIFO order, so overlapping callers run in submission order.
/// Not suitable for coordination across processes.
///
/// This type is cheaply cloneable - cloning only increments a reference count.
///
/// # Example
///
/// ```
/// # use rulecheck_core::lock::{LockManager, MemoryLockManager};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let manager = MemoryLockManager::new();
/// let _guard = manager.lock("my-project", "run-1").await?;
/// // ... talk to the target ...
/// // Lock is released when _guard is dropped
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct MemoryLockManager {
    inner: Arc<MemoryLockManagerInner>,
}

impl MemoryLockManager {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemoryLockManagerInner {
                locks: Mutex::new(HashMap::new()),
            }),
        }
    }

    fn target_lock(&self, identifier: &str) -> Result<TargetLock, LockError> {
        let mut locks = self
            .inner
            .locks
            .lock()
            .map_err(|e| LockError::internal_error(format!("Failed to acquire lock table: {}", e)))?;

        Ok(locks
            .entry(identifier.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone())
    }
}

impl Default for MemoryLockManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LockManager for MemoryLockManager {
    async fn lock(&self, identifier: &str, owner: &str) -> Result<LockGuard, LockError> {
        let target_lock = self.target_lock(identifier)?;

        debug!("Waiting for lock on '{}' for '{}'", identifier, owner);
        let permit = target_lock.lock_owned().await;
        debug!("Lock on '{}' granted to '{}'", identifier, owner);

        Ok(LockGuard::new(permit, identifier, owner))
    }

    async fn lock_count(&self, identifier: &str) -> Result<u32, LockError> {
        let locks = self
            .inner
            .locks
            .lock()
            .map_err(|e| LockError::internal_error(format!("Failed to acquire lock table: {}", e)))?;

        // The table keeps one reference; every holder or waiter keeps another.
        Ok(locks
            .get(identifier)
            .map(|lock| Arc::strong_count(lock).saturating_sub(1) as u32)
            .unwrap_or(0))
    }

    async fn release_locks(&self) -> Result<(), LockError> {
        let mut locks = self
            .inner
            .locks
            .lock()
            .map_err(|e| LockError::internal_error(format!("Failed to acquire lock table: {}", e)))?;

        locks.clear();

        Ok(())
    }
}
