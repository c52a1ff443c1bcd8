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

use crate::context::Identity;
use crate::error::HarnessError;
use bon::Builder;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// The kind of a recorded database operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum OperationKind {
    Get,
    Set,
    Update,
    Push,
    Remove,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Set => "set",
            Self::Update => "update",
            Self::Push => "push",
            Self::Remove => "remove",
        }
    }

    /// True for every kind that changes data.
    pub fn is_write(&self) -> bool {
        !matches!(self, Self::Get)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "get" => Ok(Self::Get),
            "set" => Ok(Self::Set),
            "update" => Ok(Self::Update),
            "push" => Ok(Self::Push),
            "remove" => Ok(Self::Remove),
            other => Err(HarnessError::unknown_operation(other)),
        }
    }
}

/// Per-operation flags.
#[derive(Builder, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationOptions {
    /// Report the rule evaluation trace of this operation.
    #[builder(default)]
    pub debug: bool,

    /// Skip rendering the response body.
    #[builder(default)]
    pub silent: bool,
}

/// One recorded intent. Operations are created by chain calls and never change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub kind: OperationKind,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// The identity in effect when the operation was recorded.
    pub identity: Option<Identity>,
    #[serde(default)]
    pub options: OperationOptions,
}

impl Operation {
    pub(crate) fn new(
        kind: OperationKind,
        path: String,
        value: Option<Value>,
        identity: Option<Identity>,
        options: OperationOptions,
    ) -> Self {
        Self {
            kind,
            path,
            value,
            identity,
            options,
        }
    }

    /// The payload to write, `null` when the operation carries none.
    pub fn payload(&self) -> Value {
        self.value.clone().unwrap_or(Value::Null)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let who = self.identity.as_ref().map(Identity::uid).unwrap_or("unauthenticated");
        write!(f, "{} /{} as {}", self.kind, self.path, who)
    }
}
