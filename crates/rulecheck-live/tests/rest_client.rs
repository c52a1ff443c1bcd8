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

//! Verifies the REST protocol spoken by the client against a WireMock server.

use rulecheck_core::HarnessError;
use rulecheck_core::context::Ruleset;
use rulecheck_live::{FirebaseRestClient, RestClient};
use serde_json::json;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> FirebaseRestClient {
    let url = Url::parse(&server.uri()).expect("Mock server URI should parse");
    FirebaseRestClient::new(url, Duration::from_secs(5)).expect("Client creation should succeed")
}

#[tokio::test]
async fn test_location_url() {
    let client = FirebaseRestClient::new(
        Url::parse("https://rules-test.firebaseio.com/").unwrap(),
        Duration::from_secs(1),
    )
    .unwrap();

    assert_eq!(
        client.location_url("people/bob", None, false).unwrap().as_str(),
        "https://rules-test.firebaseio.com/people/bob.json"
    );
    assert_eq!(
        client.location_url("", Some("tok"), true).unwrap().as_str(),
        "https://rules-test.firebaseio.com/.json?auth=tok&print=silent"
    );
    assert_eq!(
        client.location_url("rooms/a%2Fb", None, false).unwrap().as_str(),
        "https://rules-test.firebaseio.com/rooms/a%2Fb.json"
    );

    let url = client.location_url("rooms/what?", Some("tok"), false).unwrap();
    assert_eq!(url.path(), "/rooms/what%3F.json");
    assert_eq!(url.query(), Some("auth=tok"));

    let url = client.location_url("tags/#rust", None, false).unwrap();
    assert_eq!(url.path(), "/tags/%23rust.json");
    assert_eq!(url.fragment(), None);
}

#[tokio::test]
async fn test_key_with_question_mark_is_written_at_its_own_location() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/rooms/what%3F.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(1)))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .set("rooms/what?", &json!(1), None, false)
        .await
        .expect("Write should reach the escaped location");
}

#[tokio::test]
async fn test_get_returns_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/people/bob.json"))
        .and(query_param("auth", "token-bob"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "Bob"})))
        .expect(1)
        .mount(&server)
        .await;

    let value = client(&server)
        .get("people/bob", Some("token-bob"), false)
        .await
        .expect("Read should succeed");

    assert_eq!(value, json!({"name": "Bob"}));
}

#[tokio::test]
async fn test_silent_write_returns_null() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/people/bob.json"))
        .and(query_param("print", "silent"))
        .and(body_json(json!({"name": "Bob"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let value = client(&server)
        .set("people/bob", &json!({"name": "Bob"}), Some("tok"), true)
        .await
        .expect("Write should succeed");

    assert_eq!(value, serde_json::Value::Null);
}

#[tokio::test]
async fn test_update_and_push_methods() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/people.json"))
        .and(body_json(json!({"bob/age": 30})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"bob/age": 30})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/messages.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "-Nabc"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    client.update("people", &json!({"bob/age": 30}), None, false).await.unwrap();
    let pushed = client.push("messages", &json!("hi"), None, false).await.unwrap();

    assert_eq!(pushed, json!({"name": "-Nabc"}));
}

#[tokio::test]
async fn test_rules_are_put_with_secret() {
    let server = MockServer::start().await;
    let ruleset = Ruleset::new(json!({"rules": {".read": "auth != null"}}));
    Mock::given(method("PUT"))
        .and(path("/.settings/rules.json"))
        .and(query_param("auth", "db-secret"))
        .and(body_json(ruleset.document().clone()))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).rules(&ruleset, "db-secret").await.expect("Deployment should succeed");
}

#[tokio::test]
async fn test_unauthorized_is_permission_denied() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "Permission denied"})))
        .mount(&server)
        .await;

    let result = client(&server).get("private", None, false).await;

    match result {
        Err(HarnessError::PermissionDenied(message)) => assert!(message.contains("Permission denied")),
        other => panic!("Unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_server_error_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal server error"))
        .mount(&server)
        .await;

    let result = client(&server).set("a", &json!(1), None, false).await;

    assert!(matches!(result, Err(HarnessError::Transport(_))));
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    let server = MockServer::start().await;
    let client = client(&server);
    drop(server);

    let result = client.get("a", None, false).await;

    assert!(matches!(result, Err(HarnessError::Transport(_))));
}
