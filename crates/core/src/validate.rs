// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Field-level validation helpers shared by the services.

use crate::error::{Error, Result};

/// Git commit SHA: 40 or 64 lowercase hex characters.
pub fn commit_sha(s: &str) -> Result<()> {
    let hex = s.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase());
    if (s.len() == 40 || s.len() == 64) && hex {
        Ok(())
    } else {
        Err(Error::validation(format!("malformed commit sha {s:?}")))
    }
}

/// Git ref: non-empty, no whitespace, no `..`.
pub fn git_ref(s: &str) -> Result<()> {
    if s.is_empty() || s.contains(char::is_whitespace) || s.contains("..") {
        Err(Error::validation(format!("malformed git ref {s:?}")))
    } else {
        Ok(())
    }
}

/// Runner label: same grammar as resource names.
pub fn label(s: &str) -> Result<()> {
    crate::name::ResourceName::parse(s)
        .map(|_| ())
        .map_err(|e| Error::validation(e.to_string()))
}

/// Positive page limit capped at `max`.
pub fn page_limit(limit: i64, max: i64) -> Result<i64> {
    if limit <= 0 {
        return Err(Error::new(
            crate::error::ErrorCode::InvalidQueryParameter,
            format!("limit must be positive, got {limit}"),
        ));
    }
    Ok(limit.min(max))
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
