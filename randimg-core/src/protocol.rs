// SPDX-License-Identifier: MIT
//
// randimg: Random Noise Images from random.org
// Copyright (c) 2025 randimg Contributors

//! Protocol data structures for the random.org plain-text API
//!
//! Defines the query parameters sent to the integer-generation route, the chunking
//! of a large request into pieces the service accepts, and the parsing of
//! `format=plain` response bodies.

use crate::{Error, Result, MAX_INTEGERS_PER_REQUEST};

/// One request to the `integers/` route
///
/// This maps 1:1 onto the query string:
/// - `num`: how many integers to return (at most 10000)
/// - `min` / `max`: inclusive value range
/// - `col`: number of columns in the plain-text output
/// - `base`: number base used for formatting
/// - `format` / `rnd`: always plain text and freshly generated numbers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegerRequest {
    pub num: usize,
    pub min: i64,
    pub max: i64,
    pub col: u32,
    pub base: u32,
}

impl IntegerRequest {
    /// Output format requested from the service
    pub const FORMAT: &'static str = "plain";

    /// Ask for fresh randomness rather than a pre-generated pool
    pub const RND: &'static str = "new";

    /// Request `num` byte values (0..=255), one per line, in base 10
    pub fn bytes(num: usize) -> Self {
        Self {
            num,
            min: 0,
            max: 255,
            col: 1,
            base: 10,
        }
    }

    /// Check the request against the service limits
    pub fn validate(&self) -> Result<()> {
        if self.num == 0 || self.num > MAX_INTEGERS_PER_REQUEST {
            return Err(Error::Validation(format!(
                "num must be between 1 and {}, got {}",
                MAX_INTEGERS_PER_REQUEST, self.num
            )));
        }
        if self.min > self.max {
            return Err(Error::Validation(format!(
                "min ({}) must not exceed max ({})",
                self.min, self.max
            )));
        }
        Ok(())
    }

    /// Query pairs in the order the service documents them
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("num", self.num.to_string()),
            ("min", self.min.to_string()),
            ("max", self.max.to_string()),
            ("col", self.col.to_string()),
            ("base", self.base.to_string()),
            ("format", Self::FORMAT.to_string()),
            ("rnd", Self::RND.to_string()),
        ]
    }
}

/// Splits a total integer count into request-sized chunks
///
/// Every chunk is `limit` long except possibly the last, which carries the rest.
#[derive(Debug, Clone)]
pub struct ChunkPlan {
    remaining: usize,
    limit: usize,
}

impl ChunkPlan {
    /// Plan `total` integers with the service's per-request limit
    pub fn new(total: usize) -> Self {
        Self::with_limit(total, MAX_INTEGERS_PER_REQUEST)
    }

    /// Plan with an explicit limit; a zero limit is treated as 1
    pub fn with_limit(total: usize, limit: usize) -> Self {
        Self {
            remaining: total,
            limit: limit.max(1),
        }
    }

    /// Number of requests the plan still needs
    pub fn request_count(&self) -> usize {
        self.remaining.div_ceil(self.limit)
    }
}

impl Iterator for ChunkPlan {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        let chunk = self.remaining.min(self.limit);
        self.remaining -= chunk;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.request_count();
        (n, Some(n))
    }
}

impl ExactSizeIterator for ChunkPlan {}

/// Parse a plain-text integer list (one value per line)
///
/// Surrounding whitespace is ignored, as are `\r` line endings.
pub fn parse_plain_integers(body: &str) -> Result<Vec<i32>> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    trimmed
        .split('\n')
        .enumerate()
        .map(|(line, raw)| {
            let value = raw.trim();
            value.parse::<i32>().map_err(|e| {
                Error::Parse(format!("line {}: '{}' is not an integer: {}", line + 1, value, e))
            })
        })
        .collect()
}

/// Parse the body of the `quota/` route
pub fn parse_quota(body: &str) -> Result<i64> {
    let value = body.trim();
    value
        .parse::<i64>()
        .map_err(|e| Error::Parse(format!("quota '{}' is not an integer: {}", value, e)))
}
