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

//! Test doubles for the rule simulator.
//!
//! [`FixtureSimulator`] understands just enough of the rule language for tests: `.read`/`.write` rules that are
//! booleans or one of `auth != null`, `auth == null`, `auth.uid == '<literal>'` and `auth.uid == $<wildcard>`.
//! Grants cascade from ancestors like the real evaluator; `.validate` is ignored.

use crate::context::Ruleset;
use crate::driver::{Access, AuthScope, CompiledRules, Evaluation, IdGenerator, RuleSimulator};
use crate::error::HarnessError;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, PartialEq)]
enum Expression {
    Constant(bool),
    Authenticated(bool),
    UidEquals(String),
    UidEqualsWildcard(String),
}

impl Expression {
    fn parse(source: &Value) -> Result<Self, HarnessError> {
        match source {
            Value::Bool(value) => Ok(Expression::Constant(*value)),
            Value::String(text) => Self::parse_str(text.trim()),
            other => Err(HarnessError::simulation(format!("Unsupported rule value: {}", other))),
        }
    }

    fn parse_str(text: &str) -> Result<Self, HarnessError> {
        match text {
            "true" => return Ok(Expression::Constant(true)),
            "false" => return Ok(Expression::Constant(false)),
            "auth != null" => return Ok(Expression::Authenticated(true)),
            "auth == null" => return Ok(Expression::Authenticated(false)),
            _ => {}
        }

        let operand = text
            .strip_prefix("auth.uid")
            .map(str::trim_start)
            .and_then(|rest| rest.strip_prefix("=="))
            .map(str::trim)
            .ok_or_else(|| HarnessError::simulation(format!("Unsupported rule expression: {}", text)))?;

        if let Some(wildcard) = operand.strip_prefix('$') {
            return Ok(Expression::UidEqualsWildcard(wildcard.to_string()));
        }

        let literal = operand
            .strip_prefix('\'')
            .and_then(|rest| rest.strip_suffix('\''))
            .or_else(|| operand.strip_prefix('"').and_then(|rest| rest.strip_suffix('"')))
            .ok_or_else(|| HarnessError::simulation(format!("Unsupported rule expression: {}", text)))?;

        Ok(Expression::UidEquals(literal.to_string()))
    }

    fn holds(&self, scope: &AuthScope<'_>, wildcards: &HashMap<String, String>) -> bool {
        let uid = scope.identity.map(|identity| identity.uid());
        match self {
            Expression::Constant(value) => *value,
            Expression::Authenticated(expected) => uid.is_some() == *expected,
            Expression::UidEquals(literal) => uid == Some(literal.as_str()),
            Expression::UidEqualsWildcard(name) => match (uid, wildcards.get(name)) {
                (Some(uid), Some(bound)) => uid == bound,
                _ => false,
            },
        }
    }
}

#[derive(Debug, Default)]
struct RuleNode {
    read: Option<Expression>,
    write: Option<Expression>,
    children: HashMap<String, RuleNode>,
    wildcard: Option<(String, Box<RuleNode>)>,
}

impl RuleNode {
    fn parse(source: &Value) -> Result<Self, HarnessError> {
        let Value::Object(entries) = source else {
            return Err(HarnessError::simulation("Rule nodes must be objects"));
        };

        let mut node = RuleNode::default();
        for (key, value) in entries {
            match key.as_str() {
                ".read" => node.read = Some(Expression::parse(value)?),
                ".write" => node.write = Some(Expression::parse(value)?),
                ".validate" | ".indexOn" => {}
                wildcard if wildcard.starts_with('$') => {
                    node.wildcard = Some((wildcard[1..].to_string(), Box::new(RuleNode::parse(value)?)));
                }
                child => {
                    node.children.insert(child.to_string(), RuleNode::parse(value)?);
                }
            }
        }
        Ok(node)
    }
}

#[derive(Debug, Clone, Copy)]
enum Kind {
    Read,
    Write,
}

/// Compiled form of a fixture ruleset.
#[derive(Debug)]
pub struct FixtureRules {
    root: RuleNode,
}

impl FixtureRules {
    fn check(&self, kind: Kind, path: &str, scope: &AuthScope<'_>, trace: &mut Vec<String>) -> bool {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut wildcards = HashMap::new();
        let mut node = Some(&self.root);
        let mut location = String::from("/");

        for depth in 0..=segments.len() {
            let Some(current) = node else { break };

            let rule = match kind {
                Kind::Read => current.read.as_ref(),
                Kind::Write => current.write.as_ref(),
            };
            if let Some(rule) = rule {
                let granted = rule.holds(scope, &wildcards);
                trace.push(format!("{}: {:?} => {}", location, rule, granted));
                if granted {
                    return true;
                }
            }

            let Some(segment) = segments.get(depth) else { break };
            location = format!("{}{}/", location, segment);
            node = match current.children.get(*segment) {
                Some(child) => Some(child),
                None => current.wildcard.as_ref().map(|(name, child)| {
                    wildcards.insert(name.clone(), segment.to_string());
                    child.as_ref()
                }),
            };
        }
        false
    }
}

impl CompiledRules for FixtureRules {
    fn evaluate(&self, snapshot: &Value, scope: &AuthScope<'_>, access: &Access) -> Result<Evaluation, HarnessError> {
        let mut trace = Vec::new();

        let (allowed, new_snapshot) = match access {
            Access::Read { path } => (self.check(Kind::Read, path, scope, &mut trace), None),
            Access::Write { path, value } => {
                let allowed = self.check(Kind::Write, path, scope, &mut trace);
                let mut next = snapshot.clone();
                write_at(&mut next, path, value.clone());
                (allowed, Some(next))
            }
            Access::Update { path, patch } => {
                let Value::Object(children) = patch else {
                    return Err(HarnessError::simulation("Update patches must be objects"));
                };
                let mut allowed = true;
                let mut next = snapshot.clone();
                for (child, value) in children {
                    let target = crate::path::join(&[path.as_str(), child.as_str()]);
                    allowed &= self.check(Kind::Write, &target, scope, &mut trace);
                    write_at(&mut next, &target, value.clone());
                }
                (allowed, Some(next))
            }
        };

        Ok(Evaluation {
            allowed,
            info: trace.join("\n"),
            new_snapshot: if allowed { new_snapshot } else { None },
        })
    }
}

/// Minimal rule simulator for tests. Counts compilations.
#[derive(Debug, Default)]
pub struct FixtureSimulator {
    compilations: AtomicUsize,
}

impl FixtureSimulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compilations(&self) -> usize {
        self.compilations.load(Ordering::SeqCst)
    }
}

impl RuleSimulator for FixtureSimulator {
    fn compile(&self, ruleset: &Ruleset) -> Result<Arc<dyn CompiledRules>, HarnessError> {
        self.compilations.fetch_add(1, Ordering::SeqCst);
        let rules = ruleset
            .document()
            .get("rules")
            .ok_or_else(|| HarnessError::simulation("Ruleset has no 'rules' entry"))?;
        Ok(Arc::new(FixtureRules {
            root: RuleNode::parse(rules)?,
        }))
    }
}

/// Id generator producing `id-0`, `id-1`, ...
pub fn sequential_ids() -> IdGenerator {
    let next = AtomicUsize::new(0);
    Arc::new(move || format!("id-{}", next.fetch_add(1, Ordering::SeqCst)))
}

/// Writes `value` at `path` inside `root`; `null` deletes and prunes emptied parents.
pub fn write_at(root: &mut Value, path: &str, value: Value) {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    write_segments(root, &segments, value);
}

fn write_segments(node: &mut Value, segments: &[&str], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *node = value;
        return;
    };

    if !node.is_object() {
        if value.is_null() {
            return;
        }
        *node = Value::Object(Map::new());
    }

    if let Value::Object(children) = node {
        let child = children.entry(head.to_string()).or_insert(Value::Null);
        write_segments(child, rest, value);
        let emptied = child.is_null();
        if emptied {
            children.remove(*head);
        }
        if children.is_empty() {
            *node = Value::Null;
        }
    }
}
