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

use async_trait::async_trait;
use log::debug;
use thiserror::Error;
use tokio::sync::OwnedMutexGuard;

pub mod mem;
#[cfg(test)]
mod tests;

pub use mem::MemoryLockManager;

/// Serializes work against shared targets.
///
/// Only one owner may hold the lock for a given identifier at any time. Callers that find the lock held wait
/// until it is released and are granted the lock in the order they asked for it.
#[async_trait]
pub trait LockManager: Send + Sync {
    /// Waits for the lock on `identifier` and returns a guard that releases it when dropped.
    ///
    /// # Arguments
    /// * `identifier` - Target identifier
    /// * `owner` - Owner identifier, used for diagnostics
    async fn lock(&self, identifier: &str, owner: &str) -> Result<LockGuard, LockError>;

    /// Number of owners holding or waiting for the lock on `identifier`.
    async fn lock_count(&self, identifier: &str) -> Result<u32, LockError>;

    /// Forgets every lock. Guards handed out earlier stay valid but no longer exclude new owners.
    async fn release_locks(&self) -> Result<(), LockError>;
}

/// Guard that releases a lock when dropped.
///
/// Release is synchronous, so the next waiter is granted the lock as soon as the guard goes out of scope, even
/// when the guarded work failed.
pub struct LockGuard {
    identifier: String,
    owner: String,
    _permit: OwnedMutexGuard<()>,
}

impl LockGuard {
    pub(crate) fn new(permit: OwnedMutexGuard<()>, identifier: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            owner: owner.into(),
            _permit: permit,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        debug!("Releasing lock for '{}' held by '{}'", self.identifier, self.owner);
    }
}

impl std::fmt::Debug for LockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockGuard")
            .field("identifier", &self.identifier)
            .field("owner", &self.owner)
            .finish()
    }
}

/// Errors that can occur during lock operations.
#[derive(Debug, Error)]
pub enum LockError {
    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Internal lock error: {0}")]
    InternalError(String),
}

impl LockError {
    pub fn store_error(message: impl Into<String>) -> Self {
        LockError::StoreError(message.into())
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        LockError::InternalError(message.into())
    }
}
