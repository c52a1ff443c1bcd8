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
use sha2::{Digest, Sha256};

/// A declarative authorization policy, kept as the JSON document the database accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ruleset(Value);

impl Ruleset {
    pub fn new(rules: Value) -> Self {
        Self(rules)
    }

    pub fn from_json(json: &str) -> Result<Self, HarnessError> {
        serde_json::from_str(json)
            .map(Self)
            .map_err(|e| HarnessError::configuration(format!("Invalid ruleset JSON: {}", e)))
    }

    pub fn document(&self) -> &Value {
        &self.0
    }

    /// SHA-256 of the canonical JSON encoding. Object keys are sorted first, so key order never changes the hash.
    pub fn hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(canonical(&self.0).to_string().as_bytes());
        hex::encode(hasher.finalize())
    }
}

fn canonical(value: &Value) -> Value {
    match value {
        Value::Object(entries) => {
            let mut keys: Vec<&String> = entries.keys().collect();
            keys.sort();
            Value::Object(
                keys.into_iter()
                    .map(|key| (key.clone(), canonical(&entries[key])))
                    .collect::<Map<String, Value>>(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
        other => other.clone(),
    }
}

impl From<Value> for Ruleset {
    fn from(rules: Value) -> Self {
        Self(rules)
    }
}
