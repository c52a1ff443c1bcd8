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

use log::debug;
use rulecheck_core::HarnessError;
use rulecheck_core::context::Identity;
use rulecheck_core::jwt::{TokenGenerator, TokenOptions};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;

/// Memoizes generated tokens by identity and token options.
///
/// Scoped to a single execution: a fresh cache is created for every replay.
pub struct TokenCache {
    generator: Arc<dyn TokenGenerator>,
    tokens: HashMap<String, String>,
}

impl TokenCache {
    pub fn new(generator: Arc<dyn TokenGenerator>) -> Self {
        Self {
            generator,
            tokens: HashMap::new(),
        }
    }

    /// Returns the token for `identity`, generating it on first request. Unauthenticated requests carry no token.
    pub fn token_for(
        &mut self,
        identity: Option<&Identity>,
        options: &TokenOptions,
    ) -> Result<Option<String>, HarnessError> {
        let Some(identity) = identity else {
            return Ok(None);
        };

        let key = cache_key(identity, options);
        if let Some(token) = self.tokens.get(&key) {
            return Ok(Some(token.clone()));
        }

        debug!("Generating token for '{}'", identity.uid());
        let token = self.generator.create_token(identity, options)?;
        self.tokens.insert(key, token.clone());
        Ok(Some(token))
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Stable key: SHA-256 of the canonical JSON of the identity claims and the options.
pub fn cache_key(identity: &Identity, options: &TokenOptions) -> String {
    let document = json!({
        "identity": identity.claims(),
        "options": options,
    });
    let mut hasher = Sha256::new();
    hasher.update(document.to_string().as_bytes());
    hex::encode(hasher.finalize())
}
