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

mod identity;
mod operation;
mod ruleset;

#[cfg(test)]
mod tests;

pub use identity::Identity;
pub use operation::{Operation, OperationKind, OperationOptions};
pub use ruleset::Ruleset;

use crate::deferred::Deferred;
use crate::driver::Driver;
use crate::error::HarnessError;
use crate::path::{self, PathSpec};
use bon::{Builder, bon};
use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::{Map, Value};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

pub const DEFAULT_OK_MESSAGE: &str = "Operations should succeed";
pub const DEFAULT_SHOULD_FAIL_MESSAGE: &str = "Operations should fail";

/// Private per-context state a driver attaches during initialization, e.g. compiled rules.
pub type DriverState = Arc<dyn Any + Send + Sync>;

/// A deferred `ok`/`should_fail` check. Await it, or hand a callback to [`Deferred::notify`].
pub type Assertion = Deferred<()>;

/// Custom failure message for an assertion.
#[derive(Builder, Debug, Clone, Default)]
pub struct AssertOptions {
    #[builder(into)]
    pub msg: Option<String>,
}

/// Values applied on top of the inherited ones when forking.
#[derive(Builder, Debug, Clone, Default)]
pub struct ForkOverrides {
    /// `Some(None)` resets to unauthenticated.
    pub identity: Option<Option<Identity>>,
    pub seed: Option<Value>,
}

/// An immutable record of a ruleset, a driver, the current identity, a seed and the operations recorded so far.
///
/// Every chain call returns a new context; the receiver is never modified, so a context built during setup can
/// be shared and extended by several assertions.
///
/// # Example
///
/// ```no_run
/// # use rulecheck_core::context::{Context, Identity};
/// # use rulecheck_core::driver::Driver;
/// # use serde_json::json;
/// # use std::sync::Arc;
/// # async fn example(driver: Arc<dyn Driver>) -> Result<(), Box<dyn std::error::Error>> {
/// let ctx = Context::create(json!({"rules": {".read": "auth != null"}}), driver)?;
///
/// ctx.start_with(json!({"messages": {}}))
///     .as_identity(Identity::new("alice"))
///     .get("/messages")
///     .ok()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Context {
    ruleset: Arc<Ruleset>,
    driver: Arc<dyn Driver>,
    driver_state: Option<DriverState>,
    identity: Option<Identity>,
    seed: Option<Value>,
    operations: Vec<Operation>,
}

#[bon]
impl Context {
    /// Creates a context and lets the driver initialize it.
    ///
    /// # Errors
    /// Returns [`HarnessError::Configuration`] if the ruleset or the driver is missing, or any error raised by the
    /// driver's initialization.
    #[builder]
    pub fn new(ruleset: Option<Ruleset>, driver: Option<Arc<dyn Driver>>) -> Result<Self, HarnessError> {
        let ruleset = ruleset.ok_or_else(|| HarnessError::configuration("A ruleset is required"))?;
        let driver = driver.ok_or_else(|| HarnessError::configuration("A driver is required"))?;

        let mut context = Self {
            ruleset: Arc::new(ruleset),
            driver: Arc::clone(&driver),
            driver_state: None,
            identity: None,
            seed: None,
            operations: Vec::new(),
        };
        driver.initialize(&mut context)?;

        Ok(context)
    }
}

impl Context {
    pub fn create(ruleset: impl Into<Ruleset>, driver: Arc<dyn Driver>) -> Result<Self, HarnessError> {
        Self::builder().ruleset(ruleset.into()).driver(driver).build()
    }

    pub fn ruleset(&self) -> &Ruleset {
        &self.ruleset
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn seed(&self) -> Option<&Value> {
        self.seed.as_ref()
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Attaches driver state. Only meaningful during [`Driver::initialize`]; forks inherit it.
    pub fn set_driver_state(&mut self, state: DriverState) {
        self.driver_state = Some(state);
    }

    pub fn driver_state<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.driver_state.as_ref().and_then(|state| state.downcast_ref::<T>())
    }

    /// Copies this context, operation log included, and applies `overrides`.
    pub fn fork(&self, overrides: ForkOverrides) -> Self {
        let mut child = self.clone();
        if let Some(identity) = overrides.identity {
            child.identity = identity;
        }
        if let Some(seed) = overrides.seed {
            child.seed = Some(seed);
        }
        child
    }

    /// Sets the initial database content. Operations recorded so far are discarded.
    pub fn start_with(&self, seed: impl Into<Value>) -> Self {
        let mut child = self.fork(ForkOverrides::builder().seed(seed.into()).build());
        child.operations.clear();
        child
    }

    /// Switches the identity used by operations recorded from now on. `None` means unauthenticated.
    pub fn as_identity(&self, identity: impl Into<Option<Identity>>) -> Self {
        self.fork(ForkOverrides::builder().identity(identity.into()).build())
    }

    pub fn as_anonymous(&self) -> Self {
        self.as_identity(None::<Identity>)
    }

    pub fn get(&self, path: impl PathSpec) -> Self {
        self.get_with(path, OperationOptions::default())
    }

    pub fn get_with(&self, path: impl PathSpec, options: OperationOptions) -> Self {
        self.record(OperationKind::Get, &path, None, options)
    }

    /// Replaces the value at `path`. Pass `Value::Null` to delete it.
    pub fn set(&self, path: impl PathSpec, value: impl Into<Value>) -> Self {
        self.set_with(path, value, OperationOptions::default())
    }

    pub fn set_with(&self, path: impl PathSpec, value: impl Into<Value>, options: OperationOptions) -> Self {
        self.record(OperationKind::Set, &path, Some(value.into()), options)
    }

    /// Writes several children of `path` at once. A `null` patch is recorded as an empty one.
    pub fn update(&self, path: impl PathSpec, patch: impl Into<Value>) -> Self {
        self.update_with(path, patch, OperationOptions::default())
    }

    pub fn update_with(&self, path: impl PathSpec, patch: impl Into<Value>, options: OperationOptions) -> Self {
        let patch = match patch.into() {
            Value::Null => Value::Object(Map::new()),
            patch => patch,
        };
        self.record(OperationKind::Update, &path, Some(patch), options)
    }

    /// Writes `value` under a newly generated child key of `path`.
    pub fn push(&self, path: impl PathSpec, value: impl Into<Value>) -> Self {
        self.push_with(path, value, OperationOptions::default())
    }

    pub fn push_with(&self, path: impl PathSpec, value: impl Into<Value>, options: OperationOptions) -> Self {
        self.record(OperationKind::Push, &path, Some(value.into()), options)
    }

    /// Deletes the value at `path`; executes as a write of `null`.
    pub fn remove(&self, path: impl PathSpec) -> Self {
        self.remove_with(path, OperationOptions::default())
    }

    pub fn remove_with(&self, path: impl PathSpec, options: OperationOptions) -> Self {
        self.record(OperationKind::Remove, &path, Some(Value::Null), options)
    }

    fn record<P: PathSpec>(&self, kind: OperationKind, path: &P, value: Option<Value>, options: OperationOptions) -> Self {
        let mut child = self.fork(ForkOverrides::default());
        child.operations.push(Operation::new(
            kind,
            path::join(path),
            value,
            self.identity.clone(),
            options,
        ));
        child
    }

    /// Replays the operation log through the driver. Every call is a fresh execution.
    pub async fn execute(&self) -> Result<Value, HarnessError> {
        self.driver.execute(self).await
    }

    /// Like [`execute`](Self::execute), but returns an owned future that does nothing until polled.
    pub fn chain(&self) -> BoxFuture<'static, Result<Value, HarnessError>> {
        let context = self.clone();
        async move { context.execute().await }.boxed()
    }

    /// Asserts that the whole sequence is allowed.
    pub fn ok(&self) -> Assertion {
        self.ok_with(AssertOptions::default())
    }

    pub fn ok_with(&self, options: AssertOptions) -> Assertion {
        let context = self.clone();
        Deferred::new(move || async move {
            match context.execute().await {
                Ok(_) => Ok(()),
                Err(error) => Err(HarnessError::assertion(
                    options.msg.unwrap_or_else(|| DEFAULT_OK_MESSAGE.to_string()),
                    Some(error),
                )),
            }
        })
    }

    /// Asserts that the sequence is rejected.
    pub fn should_fail(&self) -> Assertion {
        self.should_fail_with(AssertOptions::default())
    }

    pub fn should_fail_with(&self, options: AssertOptions) -> Assertion {
        let context = self.clone();
        Deferred::new(move || async move {
            match context.execute().await {
                Ok(_) => Err(HarnessError::assertion(
                    options.msg.unwrap_or_else(|| DEFAULT_SHOULD_FAIL_MESSAGE.to_string()),
                    None,
                )),
                Err(_) => Ok(()),
            }
        })
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("ruleset", &self.ruleset)
            .field("identity", &self.identity)
            .field("seed", &self.seed)
            .field("operations", &self.operations)
            .field("driver_state", &self.driver_state.as_ref().map(|_| "<state>"))
            .finish()
    }
}
