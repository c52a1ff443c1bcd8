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

use crate::util::clock::{Clock, default_clock};
use rand::Rng;
use std::sync::{Arc, Mutex};

/// Alphabet in ascending ASCII order so generated keys sort by creation time.
const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

const TIMESTAMP_CHARS: usize = 8;
const RANDOM_CHARS: usize = 12;

struct PushIdState {
    last_millis: i64,
    last_random: [u8; RANDOM_CHARS],
}

/// Generates 20 character child keys: 8 characters of millisecond timestamp followed by 12 random characters.
///
/// Keys generated within the same millisecond reuse the previous random part incremented by one, which keeps
/// them unique and ordered.
pub struct PushIdGenerator {
    clock: Arc<dyn Clock>,
    state: Mutex<PushIdState>,
}

impl PushIdGenerator {
    pub fn new() -> Self {
        Self::with_clock(default_clock())
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            state: Mutex::new(PushIdState {
                last_millis: i64::MIN,
                last_random: [0; RANDOM_CHARS],
            }),
        }
    }

    pub fn next_id(&self) -> String {
        let now = self.clock.now_millis();
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        if now == state.last_millis {
            increment(&mut state.last_random);
        } else {
            let mut rng = rand::rng();
            for digit in state.last_random.iter_mut() {
                *digit = rng.random_range(0..64);
            }
            state.last_millis = now;
        }

        let mut id = Vec::with_capacity(TIMESTAMP_CHARS + RANDOM_CHARS);
        let mut remaining = now.max(0);
        let mut timestamp = [0u8; TIMESTAMP_CHARS];
        for slot in timestamp.iter_mut().rev() {
            *slot = PUSH_CHARS[(remaining % 64) as usize];
            remaining /= 64;
        }
        id.extend_from_slice(&timestamp);
        id.extend(state.last_random.iter().map(|digit| PUSH_CHARS[*digit as usize]));

        String::from_utf8_lossy(&id).into_owned()
    }
}

impl Default for PushIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn increment(digits: &mut [u8; RANDOM_CHARS]) {
    for digit in digits.iter_mut().rev() {
        if *digit == 63 {
            *digit = 0;
        } else {
            *digit += 1;
            return;
        }
    }
}
