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

pub mod simulated;

#[cfg(test)]
mod tests;

pub use simulated::{
    Access, AuthScope, CompiledRules, DebugSink, Evaluation, IdGenerator, RuleSimulator, SimulatedDriver,
};

use crate::context::Context;
use crate::error::HarnessError;
use async_trait::async_trait;
use serde_json::Value;

/// Execution strategy that turns a context's operation log into real effects.
///
/// Implementations must replay operations in log order and stop at the first rejected one.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Called once when a context is created. Drivers may attach private state to the context.
    fn initialize(&self, context: &mut Context) -> Result<(), HarnessError>;

    /// Replays the seed and operation log of `context`.
    ///
    /// # Errors
    /// Returns the first failure; operations after it are not applied.
    async fn execute(&self, context: &Context) -> Result<Value, HarnessError>;
}
