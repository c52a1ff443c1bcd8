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

use crate::error::HarnessError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const UID_CLAIM: &str = "uid";

/// The authenticated principal an operation is evaluated under.
///
/// Claims always include a string `uid`. Unauthenticated operations carry no identity at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Identity {
    claims: Map<String, Value>,
}

impl Identity {
    pub fn new(uid: impl Into<String>) -> Self {
        let mut claims = Map::new();
        claims.insert(UID_CLAIM.to_string(), Value::String(uid.into()));
        Self { claims }
    }

    /// Builds an identity from a claim map.
    ///
    /// # Errors
    /// Returns a configuration error if `uid` is missing or not a string.
    pub fn from_claims(claims: Map<String, Value>) -> Result<Self, HarnessError> {
        match claims.get(UID_CLAIM) {
            Some(Value::String(_)) => Ok(Self { claims }),
            _ => Err(HarnessError::configuration("Identity claims must include a string 'uid'")),
        }
    }

    /// Adds a claim. The `uid` claim cannot be replaced.
    pub fn with_claim(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if key != UID_CLAIM {
            self.claims.insert(key, value.into());
        }
        self
    }

    pub fn uid(&self) -> &str {
        self.claims.get(UID_CLAIM).and_then(Value::as_str).unwrap_or_default()
    }

    pub fn claims(&self) -> &Map<String, Value> {
        &self.claims
    }
}

impl TryFrom<Map<String, Value>> for Identity {
    type Error = HarnessError;

    fn try_from(claims: Map<String, Value>) -> Result<Self, Self::Error> {
        Identity::from_claims(claims)
    }
}

impl From<Identity> for Map<String, Value> {
    fn from(identity: Identity) -> Self {
        identity.claims
    }
}

impl From<&str> for Identity {
    fn from(uid: &str) -> Self {
        Identity::new(uid)
    }
}

impl From<String> for Identity {
    fn from(uid: String) -> Self {
        Identity::new(uid)
    }
}
