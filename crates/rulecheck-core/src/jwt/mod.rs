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

#[cfg(test)]
mod tests;

use crate::context::Identity;
use crate::util::clock::{Clock, default_clock};
use bon::Builder;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

/// Version of the legacy custom token format accepted by the database REST endpoint.
const TOKEN_VERSION: u8 = 0;

/// Options that change how a token is minted. Part of the token cache key.
#[derive(Builder, Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct TokenOptions {
    /// Ask the server to return rule evaluation traces.
    #[builder(default)]
    pub debug: bool,

    /// Mint a token that bypasses rule evaluation.
    #[builder(default)]
    pub admin: bool,

    /// Expiration as seconds since the epoch.
    pub expires: Option<i64>,
}

/// Claims of a legacy database custom token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyTokenClaims {
    pub v: u8,
    pub iat: i64,
    pub d: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// Turns an identity into a signed token the live database accepts as `auth`.
pub trait TokenGenerator: Send + Sync {
    fn create_token(&self, identity: &Identity, options: &TokenOptions) -> Result<String, TokenError>;
}

/// Errors that can occur during token generation.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Failed to generate token: {0}")]
    GenerationError(String),
}

/// Signs legacy custom tokens (HS256) with the database secret.
#[derive(Builder)]
pub struct SecretTokenGenerator {
    #[builder(into)]
    secret: String,

    #[builder(default = default_clock())]
    clock: Arc<dyn Clock>,
}

impl SecretTokenGenerator {
    pub fn claims(&self, identity: &Identity, options: &TokenOptions) -> LegacyTokenClaims {
        LegacyTokenClaims {
            v: TOKEN_VERSION,
            iat: self.clock.now().timestamp(),
            d: identity.claims().clone(),
            debug: options.debug.then_some(true),
            admin: options.admin.then_some(true),
            exp: options.expires,
        }
    }
}

impl TokenGenerator for SecretTokenGenerator {
    fn create_token(&self, identity: &Identity, options: &TokenOptions) -> Result<String, TokenError> {
        if self.secret.is_empty() {
            return Err(TokenError::GenerationError("Secret must not be empty".to_string()));
        }

        let claims = self.claims(identity, options);
        let header = Header::new(Algorithm::HS256);
        encode(&header, &claims, &EncodingKey::from_secret(self.secret.as_bytes()))
            .map_err(|e| TokenError::GenerationError(format!("Failed to sign token for '{}': {}", identity.uid(), e)))
    }
}
