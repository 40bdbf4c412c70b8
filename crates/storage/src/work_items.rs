// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Work-item and work-item-state tables.
//!
//! A state row is shared by every item with the same concurrency key and
//! doubles as the allocation lease: taking an item means writing
//! `allocated_to`/`allocated_until` on its state, so items with one key
//! serialise on that row.

use crate::error::{map_sqlx, StoreResult};
use crate::json;
use bb_core::{
    Error, WorkItem, WorkItemId, WorkItemState, WorkItemStateId, WorkItemStatus,
};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

fn item_from_row(row: &SqliteRow) -> StoreResult<WorkItem> {
    Ok(WorkItem {
        id: WorkItemId::from_string(row.try_get::<String, _>("id").map_err(map_sqlx)?),
        created_at_ms: row.try_get("created_at_ms").map_err(map_sqlx)?,
        updated_at_ms: row.try_get("updated_at_ms").map_err(map_sqlx)?,
        etag: row.try_get("etag").map_err(map_sqlx)?,
        item_type: row.try_get("item_type").map_err(map_sqlx)?,
        payload: row.try_get("payload").map_err(map_sqlx)?,
        concurrency_key: row.try_get("concurrency_key").map_err(map_sqlx)?,
        state_id: WorkItemStateId::from_string(
            row.try_get::<String, _>("state_id").map_err(map_sqlx)?,
        ),
        status: json::tag(
            &row.try_get::<String, _>("status").map_err(map_sqlx)?,
            WorkItemStatus::parse,
            "work item status",
        )?,
        status_detail: row.try_get("status_detail").map_err(map_sqlx)?,
    })
}

fn state_from_row(row: &SqliteRow) -> StoreResult<WorkItemState> {
    Ok(WorkItemState {
        id: WorkItemStateId::from_string(row.try_get::<String, _>("id").map_err(map_sqlx)?),
        created_at_ms: row.try_get("created_at_ms").map_err(map_sqlx)?,
        updated_at_ms: row.try_get("updated_at_ms").map_err(map_sqlx)?,
        etag: row.try_get("etag").map_err(map_sqlx)?,
        concurrency_key: row.try_get("concurrency_key").map_err(map_sqlx)?,
        attempts_so_far: row.try_get("attempts_so_far").map_err(map_sqlx)?,
        not_before_ms: row.try_get("not_before_ms").map_err(map_sqlx)?,
        allocated_to: row.try_get("allocated_to").map_err(map_sqlx)?,
        allocated_until_ms: row.try_get("allocated_until_ms").map_err(map_sqlx)?,
    })
}

async fn find_or_create_state(
    conn: &mut SqliteConnection,
    concurrency_key: &str,
    now_ms: i64,
) -> StoreResult<WorkItemState> {
    let existing = sqlx::query("SELECT * FROM work_item_states WHERE concurrency_key = ?")
        .bind(concurrency_key)
        .fetch_optional(&mut *conn)
        .await
        .map_err(map_sqlx)?;
    if let Some(row) = existing {
        return state_from_row(&row);
    }
    let state = WorkItemState {
        id: WorkItemStateId::generate(),
        created_at_ms: now_ms,
        updated_at_ms: now_ms,
        etag: 1,
        concurrency_key: concurrency_key.to_string(),
        attempts_so_far: 0,
        not_before_ms: None,
        allocated_to: None,
        allocated_until_ms: None,
    };
    sqlx::query(
        "INSERT INTO work_item_states \
         (id, created_at_ms, updated_at_ms, etag, concurrency_key, attempts_so_far, \
          not_before_ms, allocated_to, allocated_until_ms) \
         VALUES (?, ?, ?, ?, ?, 0, NULL, NULL, NULL)",
    )
    .bind(state.id.as_str())
    .bind(state.created_at_ms)
    .bind(state.updated_at_ms)
    .bind(state.etag)
    .bind(concurrency_key)
    .execute(conn)
    .await
    .map_err(map_sqlx)?;
    Ok(state)
}

/// Queue a work item. Items with the same concurrency key attach to one
/// shared state row and so execute one at a time.
pub async fn add(
    conn: &mut SqliteConnection,
    item_type: &str,
    payload: &str,
    concurrency_key: Option<&str>,
    now_ms: i64,
) -> StoreResult<WorkItem> {
    let id = WorkItemId::generate();
    let key = concurrency_key.map(str::to_string).unwrap_or_else(|| id.as_str().to_string());
    let state = find_or_create_state(conn, &key, now_ms).await?;
    let item = WorkItem {
        id,
        created_at_ms: now_ms,
        updated_at_ms: now_ms,
        etag: 1,
        item_type: item_type.to_string(),
        payload: payload.to_string(),
        concurrency_key: key,
        state_id: state.id,
        status: WorkItemStatus::Pending,
        status_detail: None,
    };
    sqlx::query(
        "INSERT INTO work_items \
         (id, created_at_ms, updated_at_ms, etag, item_type, payload, concurrency_key, \
          state_id, status, status_detail) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, NULL)",
    )
    .bind(item.id.as_str())
    .bind(item.created_at_ms)
    .bind(item.updated_at_ms)
    .bind(item.etag)
    .bind(&item.item_type)
    .bind(&item.payload)
    .bind(&item.concurrency_key)
    .bind(item.state_id.as_str())
    .bind(item.status.to_string())
    .execute(conn)
    .await
    .map_err(map_sqlx)?;
    Ok(item)
}

/// Claim the oldest ready item of one of the given types: backoff has
/// passed and no live lease holds the state row. Writes the lease and
/// bumps the attempt counter before returning.
pub async fn allocate(
    conn: &mut SqliteConnection,
    item_types: &[String],
    processor_id: &str,
    now_ms: i64,
    lease_ms: i64,
) -> StoreResult<Option<(WorkItem, WorkItemState)>> {
    let row = sqlx::query(
        "SELECT w.* FROM work_items w \
         JOIN work_item_states s ON s.id = w.state_id \
         WHERE w.status = 'pending' \
           AND w.item_type IN (SELECT value FROM json_each(?)) \
           AND (s.not_before_ms IS NULL OR s.not_before_ms <= ?) \
           AND (s.allocated_until_ms IS NULL OR s.allocated_until_ms < ?) \
         ORDER BY w.created_at_ms, w.id \
         LIMIT 1",
    )
    .bind(json::to_col(&item_types)?)
    .bind(now_ms)
    .bind(now_ms)
    .fetch_optional(&mut *conn)
    .await
    .map_err(map_sqlx)?;
    let item = match row {
        Some(row) => item_from_row(&row)?,
        None => return Ok(None),
    };
    // The lease guard re-checks expiry so a racing processor loses here.
    let updated = sqlx::query(
        "UPDATE work_item_states \
         SET allocated_to = ?, allocated_until_ms = ?, \
             attempts_so_far = attempts_so_far + 1, updated_at_ms = ?, etag = etag + 1 \
         WHERE id = ? AND (allocated_until_ms IS NULL OR allocated_until_ms < ?)",
    )
    .bind(processor_id)
    .bind(now_ms + lease_ms)
    .bind(now_ms)
    .bind(item.state_id.as_str())
    .bind(now_ms)
    .execute(&mut *conn)
    .await
    .map_err(map_sqlx)?;
    if updated.rows_affected() == 0 {
        return Ok(None);
    }
    let state = read_state(conn, &item.state_id).await?;
    Ok(Some((item, state)))
}

pub async fn read(conn: &mut SqliteConnection, id: &WorkItemId) -> StoreResult<WorkItem> {
    let row = sqlx::query("SELECT * FROM work_items WHERE id = ?")
        .bind(id.as_str())
        .fetch_optional(conn)
        .await
        .map_err(map_sqlx)?
        .ok_or_else(|| Error::not_found(format!("work item {id}")))?;
    item_from_row(&row)
}

pub async fn read_state(
    conn: &mut SqliteConnection,
    id: &WorkItemStateId,
) -> StoreResult<WorkItemState> {
    let row = sqlx::query("SELECT * FROM work_item_states WHERE id = ?")
        .bind(id.as_str())
        .fetch_optional(conn)
        .await
        .map_err(map_sqlx)?
        .ok_or_else(|| Error::not_found(format!("work item state {id}")))?;
    state_from_row(&row)
}

/// Settle an item after its final attempt: clear the lease, reset the
/// attempt counter, then delete the item or keep it with its outcome.
pub async fn settle(
    conn: &mut SqliteConnection,
    item: &WorkItem,
    status: WorkItemStatus,
    status_detail: Option<&str>,
    delete_item: bool,
    now_ms: i64,
) -> StoreResult<()> {
    clear_allocation(conn, &item.state_id, None, true, now_ms).await?;
    if delete_item {
        sqlx::query("DELETE FROM work_items WHERE id = ?")
            .bind(item.id.as_str())
            .execute(conn)
            .await
            .map_err(map_sqlx)?;
    } else {
        sqlx::query(
            "UPDATE work_items SET status = ?, status_detail = ?, updated_at_ms = ?, \
             etag = etag + 1 WHERE id = ?",
        )
        .bind(status.to_string())
        .bind(status_detail)
        .bind(now_ms)
        .bind(item.id.as_str())
        .execute(conn)
        .await
        .map_err(map_sqlx)?;
    }
    Ok(())
}

/// Release an item for a later retry: clear the lease, push `not_before`
/// out to the backoff time, and record the failure detail.
pub async fn release_for_retry(
    conn: &mut SqliteConnection,
    item: &WorkItem,
    not_before_ms: i64,
    status_detail: Option<&str>,
    now_ms: i64,
) -> StoreResult<()> {
    clear_allocation(conn, &item.state_id, Some(not_before_ms), false, now_ms).await?;
    sqlx::query(
        "UPDATE work_items SET status_detail = ?, updated_at_ms = ?, etag = etag + 1 \
         WHERE id = ?",
    )
    .bind(status_detail)
    .bind(now_ms)
    .bind(item.id.as_str())
    .execute(conn)
    .await
    .map_err(map_sqlx)?;
    Ok(())
}

async fn clear_allocation(
    conn: &mut SqliteConnection,
    state_id: &WorkItemStateId,
    not_before_ms: Option<i64>,
    reset_attempts: bool,
    now_ms: i64,
) -> StoreResult<()> {
    let sql = if reset_attempts {
        "UPDATE work_item_states SET allocated_to = NULL, allocated_until_ms = NULL, \
         not_before_ms = ?, attempts_so_far = 0, updated_at_ms = ?, etag = etag + 1 \
         WHERE id = ?"
    } else {
        "UPDATE work_item_states SET allocated_to = NULL, allocated_until_ms = NULL, \
         not_before_ms = ?, updated_at_ms = ?, etag = etag + 1 \
         WHERE id = ?"
    };
    sqlx::query(sql)
        .bind(not_before_ms)
        .bind(now_ms)
        .bind(state_id.as_str())
        .execute(conn)
        .await
        .map_err(map_sqlx)?;
    Ok(())
}

#[cfg(test)]
#[path = "work_items_tests.rs"]
mod tests;
