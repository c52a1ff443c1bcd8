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
use crate::jwt::{LegacyTokenClaims, SecretTokenGenerator, TokenGenerator, TokenOptions};
use crate::util::clock::MockClock;
use chrono::{TimeZone, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use std::collections::HashSet;
use std::sync::Arc;

fn create_test_generator(secret: &str) -> SecretTokenGenerator {
    let clock = Arc::new(MockClock::new(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()));
    SecretTokenGenerator::builder().secret(secret).clock(clock).build()
}

fn decode_claims(token: &str, secret: &str) -> LegacyTokenClaims {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.required_spec_claims = HashSet::new();
    validation.validate_exp = false;

    decode::<LegacyTokenClaims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .expect("Token should verify with the secret")
        .claims
}

#[test]
fn test_token_carries_identity_claims() {
    let generator = create_test_generator("s3cret");
    let identity = Identity::new("alice").with_claim("admin", false);

    let token = generator
        .create_token(&identity, &TokenOptions::default())
        .expect("Token generation should succeed");
    let claims = decode_claims(&token, "s3cret");

    assert_eq!(claims.v, 0);
    assert_eq!(claims.iat, 1_767_225_600);
    assert_eq!(claims.d.get("uid").and_then(|v| v.as_str()), Some("alice"));
    assert_eq!(claims.d.get("admin").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(claims.debug, None);
    assert_eq!(claims.admin, None);
}

#[test]
fn test_token_options_are_encoded() {
    let generator = create_test_generator("s3cret");
    let options = TokenOptions::builder().debug(true).admin(true).expires(1_800_000_000).build();

    let token = generator
        .create_token(&Identity::new("bob"), &options)
        .expect("Token generation should succeed");
    let claims = decode_claims(&token, "s3cret");

    assert_eq!(claims.debug, Some(true));
    assert_eq!(claims.admin, Some(true));
    assert_eq!(claims.exp, Some(1_800_000_000));
}

#[test]
fn test_token_rejected_with_wrong_secret() {
    let generator = create_test_generator("s3cret");
    let token = generator
        .create_token(&Identity::new("bob"), &TokenOptions::default())
        .expect("Token generation should succeed");

    let mut validation = Validation::new(Algorithm::HS256);
    validation.required_spec_claims = HashSet::new();
    let result = decode::<LegacyTokenClaims>(&token, &DecodingKey::from_secret(b"other"), &validation);

    assert!(result.is_err());
}

#[test]
fn test_empty_secret_fails() {
    let generator = create_test_generator("");

    let result = generator.create_token(&Identity::new("bob"), &TokenOptions::default());

    assert!(result.is_err());
}
