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

//! Live execution of recorded operation logs against a remote database over its REST interface.
//!
//! [`LiveDriver`] serializes executions per target through a [`DeploymentRegistry`], deploys the ruleset only
//! when it changed, and signs a token per identity through a [`TokenCache`].

pub mod client;
pub mod config;
pub mod driver;
pub mod registry;
pub mod token_cache;

#[cfg(test)]
mod tests;

pub use client::{FirebaseRestClient, RestClient};
pub use config::LiveDriverConfig;
pub use driver::LiveDriver;
pub use registry::DeploymentRegistry;
pub use token_cache::TokenCache;
