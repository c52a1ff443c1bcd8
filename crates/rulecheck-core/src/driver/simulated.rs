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

use crate::context::{Context, Identity, Operation, OperationKind, Ruleset};
use crate::driver::Driver;
use crate::error::HarnessError;
use crate::path;
use crate::util::PushIdGenerator;
use async_trait::async_trait;
use bon::Builder;
use log::{debug, info};
use serde_json::Value;
use std::sync::Arc;

/// Produces child keys for push operations.
pub type IdGenerator = Arc<dyn Fn() -> String + Send + Sync>;

/// Receives rule evaluation traces of operations recorded with `debug` set.
pub type DebugSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Parses rulesets into something that can be evaluated repeatedly.
pub trait RuleSimulator: Send + Sync {
    fn compile(&self, ruleset: &Ruleset) -> Result<Arc<dyn CompiledRules>, HarnessError>;
}

/// A parsed ruleset.
pub trait CompiledRules: Send + Sync {
    /// Decides whether `access` is allowed against `snapshot` and computes the resulting snapshot for writes.
    fn evaluate(&self, snapshot: &Value, scope: &AuthScope<'_>, access: &Access) -> Result<Evaluation, HarnessError>;
}

/// Who is asking, and whether a trace is wanted.
#[derive(Debug, Clone, Copy)]
pub struct AuthScope<'a> {
    pub identity: Option<&'a Identity>,
    pub debug: bool,
}

/// A single access the simulator evaluates.
#[derive(Debug, Clone, PartialEq)]
pub enum Access {
    Read { path: String },
    Write { path: String, value: Value },
    /// Multi-location update; keys of `patch` are paths relative to `path`.
    Update { path: String, patch: Value },
}

impl Access {
    pub fn path(&self) -> &str {
        match self {
            Access::Read { path } | Access::Write { path, .. } | Access::Update { path, .. } => path,
        }
    }
}

/// Outcome of one evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub allowed: bool,
    /// Human readable trace of the evaluated rules.
    pub info: String,
    /// Database content after a permitted write.
    pub new_snapshot: Option<Value>,
}

struct SimulatedState {
    rules: Arc<dyn CompiledRules>,
}

/// Evaluates operation logs in memory through a [`RuleSimulator`].
///
/// Execution never suspends and touches no shared state besides the id generator, so independent contexts can
/// be executed concurrently.
#[derive(Builder, Clone)]
pub struct SimulatedDriver {
    simulator: Arc<dyn RuleSimulator>,

    #[builder(default = default_id_generator())]
    id_generator: IdGenerator,

    #[builder(default = default_debug_sink())]
    debug_sink: DebugSink,
}

pub fn default_id_generator() -> IdGenerator {
    let generator = PushIdGenerator::new();
    Arc::new(move || generator.next_id())
}

fn default_debug_sink() -> DebugSink {
    Arc::new(|trace: &str| info!("{}", trace))
}

impl SimulatedDriver {
    /// Replays the operation log synchronously.
    ///
    /// Returns the seed verbatim when nothing was recorded, otherwise the snapshot after the last operation.
    pub fn run(&self, context: &Context) -> Result<Value, HarnessError> {
        let rules = context
            .driver_state::<SimulatedState>()
            .map(|state| Arc::clone(&state.rules))
            .ok_or_else(|| HarnessError::configuration("Context was not initialized by a simulated driver"))?;

        let seed = context.seed().cloned().unwrap_or(Value::Null);
        if context.operations().is_empty() {
            return Ok(seed);
        }

        context
            .operations()
            .iter()
            .try_fold(seed, |snapshot, operation| self.apply(rules.as_ref(), snapshot, operation))
    }

    fn apply(&self, rules: &dyn CompiledRules, snapshot: Value, operation: &Operation) -> Result<Value, HarnessError> {
        let access = self.access_for(operation);
        let scope = AuthScope {
            identity: operation.identity.as_ref(),
            debug: operation.options.debug,
        };

        let evaluation = rules.evaluate(&snapshot, &scope, &access)?;

        if operation.options.debug {
            (self.debug_sink)(&evaluation.info);
        }

        if !evaluation.allowed {
            debug!("Simulated {} denied", operation);
            return Err(HarnessError::permission_denied(format!(
                "{} /{} denied",
                operation.kind,
                access.path()
            )));
        }

        Ok(match access {
            Access::Read { .. } => snapshot,
            _ => evaluation.new_snapshot.unwrap_or(snapshot),
        })
    }

    fn access_for(&self, operation: &Operation) -> Access {
        match operation.kind {
            OperationKind::Get => Access::Read {
                path: operation.path.clone(),
            },
            OperationKind::Set | OperationKind::Remove => Access::Write {
                path: operation.path.clone(),
                value: operation.payload(),
            },
            OperationKind::Update => Access::Update {
                path: operation.path.clone(),
                patch: operation.payload(),
            },
            OperationKind::Push => {
                let key = (self.id_generator)();
                Access::Write {
                    path: path::join(&[operation.path.as_str(), key.as_str()]),
                    value: operation.payload(),
                }
            }
        }
    }
}

#[async_trait]
impl Driver for SimulatedDriver {
    fn initialize(&self, context: &mut Context) -> Result<(), HarnessError> {
        let rules = self.simulator.compile(context.ruleset())?;
        context.set_driver_state(Arc::new(SimulatedState { rules }));
        Ok(())
    }

    async fn execute(&self, context: &Context) -> Result<Value, HarnessError> {
        self.run(context)
    }
}
