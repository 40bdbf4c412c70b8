// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON TEXT column helpers.

use bb_core::{Error, ErrorCode};

/// Serialise a compound field for a TEXT column.
pub fn to_col<T: serde::Serialize>(value: &T) -> Result<String, Error> {
    serde_json::to_string(value)
        .map_err(|e| Error::wrap(ErrorCode::Internal, "encoding json column", e))
}

/// Parse a compound field back out of a TEXT column.
pub fn from_col<T: serde::de::DeserializeOwned>(raw: &str) -> Result<T, Error> {
    serde_json::from_str(raw)
        .map_err(|e| Error::wrap(ErrorCode::Internal, "decoding json column", e))
}

/// Parse a stored enum tag via its `parse` function, failing Internal on
/// unknown values (they can only appear through schema drift).
pub fn tag<T>(raw: &str, parse: fn(&str) -> Option<T>, what: &str) -> Result<T, Error> {
    parse(raw).ok_or_else(|| {
        Error::new(ErrorCode::Internal, format!("unknown {what} tag {raw:?} in store"))
    })
}
