// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Row-mapping helpers shared by the table modules.

use crate::error::{map_sqlx, StoreResult};
use bb_core::build::Timings;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

/// Read the five shared lifecycle-timestamp columns.
pub fn timings(row: &SqliteRow) -> StoreResult<Timings> {
    Ok(Timings {
        queued_at_ms: row.try_get("queued_at_ms").map_err(map_sqlx)?,
        submitted_at_ms: row.try_get("submitted_at_ms").map_err(map_sqlx)?,
        running_at_ms: row.try_get("running_at_ms").map_err(map_sqlx)?,
        finished_at_ms: row.try_get("finished_at_ms").map_err(map_sqlx)?,
        canceled_at_ms: row.try_get("canceled_at_ms").map_err(map_sqlx)?,
    })
}
