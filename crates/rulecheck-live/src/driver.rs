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

use crate::client::{FirebaseRestClient, RestClient};
use crate::config::{LiveDriverConfig, LiveTarget};
use crate::registry::DeploymentRegistry;
use crate::token_cache::TokenCache;
use async_trait::async_trait;
use log::debug;
use rulecheck_core::HarnessError;
use rulecheck_core::context::{Context, Operation, OperationKind};
use rulecheck_core::driver::Driver;
use rulecheck_core::jwt::{SecretTokenGenerator, TokenGenerator, TokenOptions};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

enum Request {
    Read,
    Write,
    Merge,
    Append,
}

/// Replays operation logs against a live database.
///
/// Every execution holds the target's lock for its whole duration: rules are deployed if they changed, the
/// seed is written with the database secret and the operations are sent one after the other. The first
/// rejected request aborts the execution.
pub struct LiveDriver {
    target: LiveTarget,
    client: Arc<dyn RestClient>,
    token_generator: Arc<dyn TokenGenerator>,
    registry: Arc<DeploymentRegistry>,
    owner: String,
}

impl LiveDriver {
    /// Creates a driver with the REST client, a secret-signing token generator and the global registry.
    ///
    /// # Errors
    /// Returns [`HarnessError::Configuration`] if the database URL, secret or target id is missing or invalid.
    pub fn new(config: LiveDriverConfig) -> Result<Self, HarnessError> {
        let target = config.resolve()?;
        let client = FirebaseRestClient::new(target.database_url.clone(), config.request_timeout)?;
        let token_generator = SecretTokenGenerator::builder()
            .secret(target.secret.as_str())
            .clock(config.clock.clone())
            .build();

        Ok(Self {
            target,
            client: Arc::new(client),
            token_generator: Arc::new(token_generator),
            registry: DeploymentRegistry::global(),
            owner: Uuid::new_v4().to_string(),
        })
    }

    pub fn with_client(mut self, client: Arc<dyn RestClient>) -> Self {
        self.client = client;
        self
    }

    pub fn with_token_generator(mut self, token_generator: Arc<dyn TokenGenerator>) -> Self {
        self.token_generator = token_generator;
        self
    }

    pub fn with_registry(mut self, registry: Arc<DeploymentRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn target_id(&self) -> &str {
        &self.target.target_id
    }

    pub fn registry(&self) -> &Arc<DeploymentRegistry> {
        &self.registry
    }

    async fn replay(&self, operation: &Operation, tokens: &mut TokenCache) -> Result<Value, HarnessError> {
        let request = match operation.kind {
            OperationKind::Get => Request::Read,
            OperationKind::Set | OperationKind::Remove => Request::Write,
            OperationKind::Update => Request::Merge,
            OperationKind::Push => Request::Append,
            other => return Err(HarnessError::unknown_operation(other.as_str())),
        };

        let options = TokenOptions::builder().debug(operation.options.debug).build();
        let token = tokens.token_for(operation.identity.as_ref(), &options)?;
        let auth = token.as_deref();
        let path = operation.path.as_str();
        let silent = operation.options.silent;

        debug!("Replaying {} on '{}'", operation, self.target.target_id);
        match request {
            Request::Read => self.client.get(path, auth, silent).await,
            Request::Write => self
                .client
                .set(path, &operation.payload(), auth, silent)
                .await
                .map(|_| Value::Null),
            Request::Merge => self
                .client
                .update(path, &operation.payload(), auth, silent)
                .await
                .map(|_| Value::Null),
            Request::Append => self
                .client
                .push(path, &operation.payload(), auth, silent)
                .await
                .map(|_| Value::Null),
        }
    }
}

#[async_trait]
impl Driver for LiveDriver {
    fn initialize(&self, _context: &mut Context) -> Result<(), HarnessError> {
        Ok(())
    }

    async fn execute(&self, context: &Context) -> Result<Value, HarnessError> {
        let target = self.target.target_id.as_str();
        let _guard = self.registry.acquire(target, &self.owner).await?;

        self.registry
            .ensure_rules(target, context.ruleset(), self.client.as_ref(), &self.target.secret)
            .await;

        let seed = context.seed().cloned().unwrap_or(Value::Null);
        self.client.set("", &seed, Some(&self.target.secret), true).await?;

        let mut tokens = TokenCache::new(Arc::clone(&self.token_generator));
        let mut last = Value::Null;
        for operation in context.operations() {
            last = self.replay(operation, &mut tokens).await?;
        }
        Ok(last)
    }
}

impl std::fmt::Debug for LiveDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveDriver")
            .field("target", &self.target)
            .field("owner", &self.owner)
            .finish()
    }
}
