// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Opaque cursor pagination.
//!
//! A cursor is base64 over a small JSON document holding the sort key of
//! the boundary row and the paging direction. Lists sort by
//! `(created_at_ms, id)` ascending; the ID disambiguates equal
//! timestamps.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use bb_core::{Error, ErrorCode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Next,
    Prev,
}

/// Boundary of a page: the sort key of the last (or first) row returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    #[serde(rename = "t")]
    pub created_at_ms: i64,
    #[serde(rename = "i")]
    pub id: String,
    #[serde(rename = "d")]
    pub direction: Direction,
}

impl Cursor {
    pub fn encode(&self) -> String {
        // Serialising a three-field struct cannot fail.
        let json = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    pub fn decode(raw: &str) -> Result<Self, Error> {
        let bytes = URL_SAFE_NO_PAD.decode(raw).map_err(|e| {
            Error::wrap(ErrorCode::InvalidQueryParameter, "malformed cursor", e)
        })?;
        serde_json::from_slice(&bytes)
            .map_err(|e| Error::wrap(ErrorCode::InvalidQueryParameter, "malformed cursor", e))
    }
}

/// One page of results plus the cursors to move either way. `prev` and
/// `next` are only set when more rows exist in that direction.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub prev: Option<String>,
    pub next: Option<String>,
}

impl<T> Page<T> {
    /// Build a forward page from ascending rows fetched with `limit + 1`:
    /// the probe row is trimmed off the end. `at_start` suppresses the
    /// prev cursor on the first page.
    pub fn forward(
        mut items: Vec<T>,
        limit: usize,
        at_start: bool,
        key: impl Fn(&T) -> (i64, String),
    ) -> Self {
        let has_more = items.len() > limit;
        if has_more {
            items.truncate(limit);
        }
        let next = if has_more { boundary(items.last(), Direction::Next, &key) } else { None };
        let prev = if at_start { None } else { boundary(items.first(), Direction::Prev, &key) };
        Page { items, prev, next }
    }

    /// Build a backward page from ascending rows fetched with `limit + 1`
    /// ending just before the boundary: the probe row is trimmed off the
    /// front. A next cursor always exists (we came from a later page).
    pub fn backward(
        mut items: Vec<T>,
        limit: usize,
        key: impl Fn(&T) -> (i64, String),
    ) -> Self {
        let has_more = items.len() > limit;
        if has_more {
            items.remove(0);
        }
        let prev = if has_more { boundary(items.first(), Direction::Prev, &key) } else { None };
        let next = boundary(items.last(), Direction::Next, &key);
        Page { items, prev, next }
    }
}

fn boundary<T>(
    row: Option<&T>,
    direction: Direction,
    key: &impl Fn(&T) -> (i64, String),
) -> Option<String> {
    row.map(|r| {
        let (created_at_ms, id) = key(r);
        Cursor { created_at_ms, id, direction }.encode()
    })
}

#[cfg(test)]
#[path = "cursor_tests.rs"]
mod tests;
