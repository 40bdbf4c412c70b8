// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mapping from driver errors onto the closed taxonomy.

use bb_core::{Error, ErrorCode};

pub type StoreResult<T> = Result<T, Error>;

/// Classify a sqlx error. Unique-constraint violations become
/// `AlreadyExists`; a missing row becomes `NotFound`; everything else is
/// `Internal` with the cause preserved.
pub fn map_sqlx(err: sqlx::Error) -> Error {
    match &err {
        sqlx::Error::RowNotFound => Error::new(ErrorCode::NotFound, "row not found"),
        sqlx::Error::Database(db) => {
            if db.is_unique_violation() {
                Error::wrap(ErrorCode::AlreadyExists, "unique constraint violated", err)
            } else {
                Error::wrap(ErrorCode::Internal, "database error", err)
            }
        }
        _ => Error::wrap(ErrorCode::Internal, "database error", err),
    }
}

/// Classify the result of an etag-guarded UPDATE: zero rows means either
/// the row vanished (`NotFound`) or someone raced us
/// (`OptimisticLockFailed`); `exists` disambiguates.
pub fn etag_update_outcome(rows_affected: u64, exists: bool, what: &str) -> StoreResult<()> {
    if rows_affected > 0 {
        Ok(())
    } else if exists {
        Err(Error::optimistic_lock_failed(what))
    } else {
        Err(Error::not_found(what))
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
