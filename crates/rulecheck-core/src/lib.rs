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

//! Operation sequencing and execution contexts for testing database security rules.

pub mod context;
pub mod deferred;
pub mod driver;
pub mod error;
pub mod jwt;
pub mod lock;
pub mod path;
pub mod util;

#[cfg(any(test, feature = "test-fixtures"))]
pub mod test_fixtures;

pub use context::{AssertOptions, Assertion, Context, Identity, Operation, OperationKind, OperationOptions, Ruleset};
pub use deferred::{Deferred, all, run};
pub use driver::{Driver, SimulatedDriver};
pub use error::HarnessError;
