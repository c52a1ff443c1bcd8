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

//! Location path helpers.
//!
//! Percent-escaped content is never decoded: an escaped `%2F` is part of a key name, not a separator.

/// A value that can be flattened into path segments.
///
/// Implemented for strings and for (nested) sequences of strings, so `"a/b"`, `["a", "b"]` and
/// `vec![vec!["a"], vec!["b"]]` all describe the same location.
pub trait PathSpec {
    fn collect_segments<'a>(&'a self, segments: &mut Vec<&'a str>);
}

impl PathSpec for str {
    fn collect_segments<'a>(&'a self, segments: &mut Vec<&'a str>) {
        segments.push(self);
    }
}

impl PathSpec for String {
    fn collect_segments<'a>(&'a self, segments: &mut Vec<&'a str>) {
        segments.push(self.as_str());
    }
}

impl<T: PathSpec + ?Sized> PathSpec for &T {
    fn collect_segments<'a>(&'a self, segments: &mut Vec<&'a str>) {
        (**self).collect_segments(segments);
    }
}

impl<T: PathSpec> PathSpec for [T] {
    fn collect_segments<'a>(&'a self, segments: &mut Vec<&'a str>) {
        for part in self {
            part.collect_segments(segments);
        }
    }
}

impl<T: PathSpec, const N: usize> PathSpec for [T; N] {
    fn collect_segments<'a>(&'a self, segments: &mut Vec<&'a str>) {
        self.as_slice().collect_segments(segments);
    }
}

impl<T: PathSpec> PathSpec for Vec<T> {
    fn collect_segments<'a>(&'a self, segments: &mut Vec<&'a str>) {
        self.as_slice().collect_segments(segments);
    }
}

/// Strips surrounding whitespace, then leading and trailing `/` runs. A missing value yields an empty string.
pub fn trim(value: Option<&str>) -> String {
    match value {
        Some(value) => value.trim().trim_matches('/').to_string(),
        None => String::new(),
    }
}

/// Flattens `parts`, trims every segment and joins the non-empty ones with `/`.
pub fn join<P: PathSpec + ?Sized>(parts: &P) -> String {
    let mut segments = Vec::new();
    parts.collect_segments(&mut segments);

    segments
        .into_iter()
        .map(|segment| trim(Some(segment)))
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}
