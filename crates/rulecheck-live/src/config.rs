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

use bon::Builder;
use rulecheck_core::HarnessError;
use rulecheck_core::util::{Clock, default_clock};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub(crate) const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the live driver.
///
/// Required values are optional here so a missing one surfaces as a configuration error from
/// [`LiveDriver::new`](crate::LiveDriver::new) rather than at compile time; settings are commonly read from the
/// environment of a test run.
#[derive(Builder, Clone)]
pub struct LiveDriverConfig {
    /// Base URL of the database, e.g. "https://my-project.firebaseio.com"
    #[builder(into)]
    pub database_url: Option<String>,
    /// Database secret used to deploy rules, write seeds and sign identity tokens
    #[builder(into)]
    pub secret: Option<String>,
    /// Key of the execution lock and deployed-ruleset cache, typically the project id
    #[builder(into)]
    pub target_id: Option<String>,
    /// HTTP request timeout (defaults to 10 seconds)
    #[builder(default = DEFAULT_REQUEST_TIMEOUT)]
    pub request_timeout: Duration,
    #[builder(default = default_clock())]
    pub clock: Arc<dyn Clock>,
}

/// Validated connection settings.
#[derive(Clone, PartialEq, Eq)]
pub(crate) struct LiveTarget {
    pub database_url: Url,
    pub secret: String,
    pub target_id: String,
}

impl LiveDriverConfig {
    pub(crate) fn resolve(&self) -> Result<LiveTarget, HarnessError> {
        let database_url = required(self.database_url.as_deref(), "A database URL is required")?;
        let database_url = Url::parse(database_url)
            .map_err(|e| HarnessError::configuration(format!("Invalid database URL '{}': {}", database_url, e)))?;
        if !matches!(database_url.scheme(), "http" | "https") {
            return Err(HarnessError::configuration(format!(
                "Database URL must use http or https: {}",
                database_url
            )));
        }

        let secret = required(self.secret.as_deref(), "A database secret is required")?;
        let target_id = required(self.target_id.as_deref(), "A target id is required")?;

        Ok(LiveTarget {
            database_url,
            secret: secret.to_string(),
            target_id: target_id.to_string(),
        })
    }
}

fn required<'a>(value: Option<&'a str>, message: &str) -> Result<&'a str, HarnessError> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| HarnessError::configuration(message))
}

impl std::fmt::Debug for LiveDriverConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveDriverConfig")
            .field("database_url", &self.database_url)
            .field("secret", &self.secret.as_ref().map(|_| "***"))
            .field("target_id", &self.target_id)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl std::fmt::Debug for LiveTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveTarget")
            .field("database_url", &self.database_url.as_str())
            .field("secret", &"***")
            .field("target_id", &self.target_id)
            .finish()
    }
}
