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

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Method, StatusCode};
use rulecheck_core::HarnessError;
use rulecheck_core::context::Ruleset;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Request/response access to a remote database.
///
/// `auth` is a signed identity token or the database secret; `None` sends an unauthenticated request. With
/// `silent` set the server skips rendering the response body and `null` is returned.
#[async_trait]
pub trait RestClient: Send + Sync {
    /// Replaces the target's rules.
    async fn rules(&self, ruleset: &Ruleset, secret: &str) -> Result<(), HarnessError>;

    async fn get(&self, path: &str, auth: Option<&str>, silent: bool) -> Result<Value, HarnessError>;

    async fn set(&self, path: &str, payload: &Value, auth: Option<&str>, silent: bool) -> Result<Value, HarnessError>;

    async fn update(&self, path: &str, payload: &Value, auth: Option<&str>, silent: bool)
    -> Result<Value, HarnessError>;

    /// Appends `payload` under a server generated key. Returns `{"name": <key>}` unless silent.
    async fn push(&self, path: &str, payload: &Value, auth: Option<&str>, silent: bool) -> Result<Value, HarnessError>;
}

/// [`RestClient`] speaking the Firebase Realtime Database REST protocol.
#[derive(Clone)]
pub struct FirebaseRestClient {
    http_client: Client,
    database_url: Url,
}

impl FirebaseRestClient {
    pub fn new(database_url: Url, request_timeout: Duration) -> Result<Self, HarnessError> {
        let http_client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| HarnessError::configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            database_url,
        })
    }

    pub fn database_url(&self) -> &Url {
        &self.database_url
    }

    /// Builds `{database_url}/{path}.json` with the `auth` and `print` query parameters.
    ///
    /// `?` and `#` inside keys are escaped; existing `%XX` escapes are sent as they are.
    pub fn location_url(&self, path: &str, auth: Option<&str>, silent: bool) -> Result<Url, HarnessError> {
        let base = self.database_url.as_str().trim_end_matches('/');
        let path = escape_location(path.trim_matches('/'));
        let mut url = Url::parse(&format!("{}/{}.json", base, path))
            .map_err(|e| HarnessError::configuration(format!("Invalid location '{}': {}", path, e)))?;

        {
            let mut query = url.query_pairs_mut();
            if let Some(auth) = auth {
                query.append_pair("auth", auth);
            }
            if silent {
                query.append_pair("print", "silent");
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }

        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        payload: Option<&Value>,
        auth: Option<&str>,
        silent: bool,
    ) -> Result<Value, HarnessError> {
        let url = self.location_url(path, auth, silent)?;
        let context = format!("{} /{}", method, path.trim_matches('/'));
        debug!("Sending {}", context);

        let mut request = self.http_client.request(method, url);
        if let Some(payload) = payload {
            request = request.json(payload);
        }

        let response = request
            .send()
            .await
            .map_err(|e| HarnessError::transport(format!("{} failed: {}", context, e)))?;

        if !response.status().is_success() {
            return Err(handle_error_response(response, &context).await);
        }

        if silent || response.status() == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }

        let body = response
            .text()
            .await
            .map_err(|e| HarnessError::transport(format!("Failed to read response of {}: {}", context, e)))?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body)
            .map_err(|e| HarnessError::transport(format!("Failed to parse response of {}: {}", context, e)))
    }
}

#[async_trait]
impl RestClient for FirebaseRestClient {
    async fn rules(&self, ruleset: &Ruleset, secret: &str) -> Result<(), HarnessError> {
        self.send(Method::PUT, ".settings/rules", Some(ruleset.document()), Some(secret), true)
            .await
            .map(|_| ())
    }

    async fn get(&self, path: &str, auth: Option<&str>, silent: bool) -> Result<Value, HarnessError> {
        self.send(Method::GET, path, None, auth, silent).await
    }

    async fn set(&self, path: &str, payload: &Value, auth: Option<&str>, silent: bool) -> Result<Value, HarnessError> {
        self.send(Method::PUT, path, Some(payload), auth, silent).await
    }

    async fn update(
        &self,
        path: &str,
        payload: &Value,
        auth: Option<&str>,
        silent: bool,
    ) -> Result<Value, HarnessError> {
        self.send(Method::PATCH, path, Some(payload), auth, silent).await
    }

    async fn push(&self, path: &str, payload: &Value, auth: Option<&str>, silent: bool) -> Result<Value, HarnessError> {
        self.send(Method::POST, path, Some(payload), auth, silent).await
    }
}

fn escape_location(path: &str) -> String {
    path.replace('?', "%3F").replace('#', "%23")
}

/// Helper to extract error details from an HTTP response.
pub(crate) async fn handle_error_response(response: reqwest::Response, context: &str) -> HarnessError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = format!("{} with status {}: {}", context, status, body);

    match status.as_u16() {
        401 | 403 => HarnessError::PermissionDenied(message),
        _ => HarnessError::Transport(message),
    }
}
