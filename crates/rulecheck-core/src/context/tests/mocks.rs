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

use crate::context::Context;
use crate::driver::Driver;
use crate::error::HarnessError;
use async_trait::async_trait;
use mockall::mock;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

mock! {
    pub Driver {}

    #[async_trait]
    impl Driver for Driver {
        fn initialize(&self, context: &mut Context) -> Result<(), HarnessError>;
        async fn execute(&self, context: &Context) -> Result<Value, HarnessError>;
    }
}

/// Driver that counts executions and resolves with the number of recorded operations, or fails with `failure`.
pub struct CountingDriver {
    pub executions: AtomicUsize,
    pub failure: Option<HarnessError>,
}

impl CountingDriver {
    pub fn succeeding() -> Arc<Self> {
        Arc::new(Self {
            executions: AtomicUsize::new(0),
            failure: None,
        })
    }

    pub fn failing(error: HarnessError) -> Arc<Self> {
        Arc::new(Self {
            executions: AtomicUsize::new(0),
            failure: Some(error),
        })
    }

    pub fn executions(&self) -> usize {
        self.executions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Driver for CountingDriver {
    fn initialize(&self, context: &mut Context) -> Result<(), HarnessError> {
        context.set_driver_state(Arc::new("counting".to_string()));
        Ok(())
    }

    async fn execute(&self, context: &Context) -> Result<Value, HarnessError> {
        self.executions.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(Value::from(context.operations().len())),
        }
    }
}

pub fn ruleset() -> crate::context::Ruleset {
    crate::context::Ruleset::new(serde_json::json!({"rules": {".read": true}}))
}
