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

use crate::jwt::TokenError;
use crate::lock::LockError;
use thiserror::Error;

/// Errors surfaced as the rejection of an operation sequence.
///
/// Payloads are kept as plain strings so outcomes can be memoized and handed out more than once.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HarnessError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Simulation error: {0}")]
    Simulation(String),

    #[error("Token error: {0}")]
    Token(String),

    #[error("Interrupted: {0}")]
    Interrupted(String),

    /// Raised by `ok`/`should_fail` assertions. `original` keeps the rejection that caused the failure, if any.
    #[error("{message}")]
    Assertion {
        message: String,
        original: Option<Box<HarnessError>>,
    },

    #[error("{} assertion(s) failed", .0.len())]
    Composite(Vec<HarnessError>),
}

impl HarnessError {
    pub fn configuration(message: impl Into<String>) -> Self {
        HarnessError::Configuration(message.into())
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        HarnessError::PermissionDenied(message.into())
    }

    pub fn unknown_operation(message: impl Into<String>) -> Self {
        HarnessError::UnknownOperation(message.into())
    }

    pub fn transport(message: impl Into<String>) -> Self {
        HarnessError::Transport(message.into())
    }

    pub fn simulation(message: impl Into<String>) -> Self {
        HarnessError::Simulation(message.into())
    }

    pub fn assertion(message: impl Into<String>, original: Option<HarnessError>) -> Self {
        HarnessError::Assertion {
            message: message.into(),
            original: original.map(Box::new),
        }
    }

    /// Returns the individual failures of a composite error, or the error itself otherwise.
    pub fn failures(&self) -> Vec<&HarnessError> {
        match self {
            HarnessError::Composite(failures) => failures.iter().collect(),
            other => vec![other],
        }
    }

    /// Diagnostic rendering that includes the wrapped rejection of an assertion failure.
    pub fn diagnostic(&self) -> String {
        match self {
            HarnessError::Assertion {
                message,
                original: Some(original),
            } => format!("{}\n\nOriginal error: {}", message, original.diagnostic()),
            other => other.to_string(),
        }
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, HarnessError::PermissionDenied(_))
    }
}

impl From<TokenError> for HarnessError {
    fn from(error: TokenError) -> Self {
        HarnessError::Token(error.to_string())
    }
}

impl From<LockError> for HarnessError {
    fn from(error: LockError) -> Self {
        HarnessError::Interrupted(error.to_string())
    }
}
