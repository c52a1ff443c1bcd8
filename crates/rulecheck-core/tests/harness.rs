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

//! Rule scenarios driven through the public API with the in-memory simulator.

use rulecheck_core::driver::SimulatedDriver;
use rulecheck_core::test_fixtures::{FixtureSimulator, sequential_ids};
use rulecheck_core::{AssertOptions, Context, HarnessError, Identity, all, run};
use serde_json::json;
use std::sync::Arc;

fn chat() -> Context {
    let driver = Arc::new(
        SimulatedDriver::builder()
            .simulator(Arc::new(FixtureSimulator::new()))
            .id_generator(sequential_ids())
            .build(),
    );
    let rules = json!({
        "rules": {
            "rooms": {
                ".read": "auth != null",
                "$room": {
                    "owner": {".write": "auth != null"},
                    "messages": {".write": "auth != null"}
                }
            },
            "people": {
                "$uid": {".write": "auth.uid == $uid"}
            }
        }
    });
    Context::create(rules, driver)
        .expect("Context creation should succeed")
        .start_with(json!({"rooms": {"lobby": {"owner": "alice"}}}))
}

#[tokio::test]
async fn test_run_passes_when_every_assertion_holds() {
    let ctx = chat();
    let alice = ctx.as_identity(Identity::new("alice"));

    let result = run([
        alice.get("/rooms/lobby").ok(),
        alice.push("/rooms/lobby/messages", json!({"text": "hi"})).ok(),
        alice.set("/people/alice", json!({"name": "Alice"})).ok(),
        ctx.get("/rooms").should_fail(),
        alice.set("/people/bob", json!({"name": "Bob"})).should_fail(),
    ])
    .await;

    assert_eq!(result, Ok(()));
}

#[tokio::test]
async fn test_run_stops_at_first_failure() {
    let ctx = chat();
    let unreached = ctx.as_identity(Identity::new("bob")).get("/rooms").ok();

    let result = run([
        ctx.get("/rooms").ok_with(AssertOptions::builder().msg("anonymous read").build()),
        unreached.clone(),
    ])
    .await;

    assert_eq!(result.map_err(|e| e.to_string()), Err("anonymous read".to_string()));
    assert!(!unreached.is_settled());
}

#[tokio::test]
async fn test_all_reports_every_failure_in_order() {
    let ctx = chat();

    let result = all([
        ctx.get("/rooms").ok_with(AssertOptions::builder().msg("first").build()),
        ctx.as_identity(Identity::new("alice")).get("/rooms").ok(),
        ctx.set("/people/carol", 1).ok_with(AssertOptions::builder().msg("second").build()),
    ])
    .await;

    let error = result.expect_err("Two assertions fail");
    let messages: Vec<String> = error.failures().iter().map(|failure| failure.to_string()).collect();
    assert_eq!(messages, vec!["first", "second"]);
    assert!(matches!(error, HarnessError::Composite(_)));
}

#[tokio::test]
async fn test_seeded_snapshot_carries_through_writes() {
    let snapshot = chat()
        .as_identity(Identity::new("bob"))
        .set("/rooms/lobby/owner", "bob")
        .push("/rooms/lobby/messages", "hello")
        .execute()
        .await
        .expect("Writes are allowed");

    assert_eq!(
        snapshot,
        json!({"rooms": {"lobby": {"owner": "bob", "messages": {"id-0": "hello"}}}})
    );
}
