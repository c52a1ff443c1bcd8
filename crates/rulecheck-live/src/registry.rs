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

use crate::client::RestClient;
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use rulecheck_core::HarnessError;
use rulecheck_core::context::Ruleset;
use rulecheck_core::lock::{LockGuard, LockManager, MemoryLockManager};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

static GLOBAL_REGISTRY: Lazy<Arc<DeploymentRegistry>> = Lazy::new(|| Arc::new(DeploymentRegistry::new()));

/// Result of [`DeploymentRegistry::ensure_rules`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RulesStatus {
    /// The cached hash matched; nothing was sent.
    Current,
    Deployed,
    /// Deployment failed; the previous hash stays cached so the next call tries again.
    Failed,
}

/// Per-target state shared by every live driver: the hash of the last deployed ruleset and the execution lock.
pub struct DeploymentRegistry {
    hashes: Mutex<HashMap<String, String>>,
    locks: Arc<dyn LockManager>,
}

impl DeploymentRegistry {
    pub fn new() -> Self {
        Self::with_lock_manager(Arc::new(MemoryLockManager::new()))
    }

    pub fn with_lock_manager(locks: Arc<dyn LockManager>) -> Self {
        Self {
            hashes: Mutex::new(HashMap::new()),
            locks,
        }
    }

    /// The process-wide registry used by drivers that were not given one.
    pub fn global() -> Arc<DeploymentRegistry> {
        Arc::clone(&GLOBAL_REGISTRY)
    }

    /// Waits for exclusive use of `target`. Waiters are served in submission order; the lock is released when
    /// the guard is dropped.
    pub async fn acquire(&self, target: &str, owner: &str) -> Result<LockGuard, HarnessError> {
        debug!("Waiting for target '{}' as {}", target, owner);
        Ok(self.locks.lock(target, owner).await?)
    }

    /// Number of holders and waiters for `target`.
    pub async fn pending(&self, target: &str) -> Result<u32, HarnessError> {
        Ok(self.locks.lock_count(target).await?)
    }

    /// Deploys `ruleset` to `target` unless its hash matches the last deployed one.
    pub async fn ensure_rules(
        &self,
        target: &str,
        ruleset: &Ruleset,
        client: &dyn RestClient,
        secret: &str,
    ) -> RulesStatus {
        let hash = ruleset.hash();
        if self.deployed_hash(target).as_deref() == Some(hash.as_str()) {
            debug!("Rules of '{}' are current", target);
            return RulesStatus::Current;
        }

        match client.rules(ruleset, secret).await {
            Ok(()) => {
                info!("Deployed rules {} to '{}'", &hash[..12], target);
                self.hashes().insert(target.to_string(), hash);
                RulesStatus::Deployed
            }
            Err(error) => {
                warn!("Failed to deploy rules to '{}': {}", target, error);
                RulesStatus::Failed
            }
        }
    }

    pub fn deployed_hash(&self, target: &str) -> Option<String> {
        self.hashes().get(target).cloned()
    }

    /// Forgets every deployed hash and drops all locks.
    pub async fn reset(&self) -> Result<(), HarnessError> {
        self.hashes().clear();
        Ok(self.locks.release_locks().await?)
    }

    fn hashes(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.hashes.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for DeploymentRegistry {
    fn default() -> Self {
        Self::new()
    }
}
