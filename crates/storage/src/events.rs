// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event table and the per-build sequence counter.

use crate::error::{map_sqlx, StoreResult};
use crate::json;
use bb_core::{BuildId, Event, EventId, EventType, ResourceName, SequenceNumber};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

fn from_row(row: &SqliteRow) -> StoreResult<Event> {
    let opt_name = |col: &str| -> StoreResult<Option<ResourceName>> {
        row.try_get::<Option<String>, _>(col)
            .map_err(map_sqlx)?
            .map(crate::legal_entities::parse_name)
            .transpose()
    };
    Ok(Event {
        id: EventId::from_string(row.try_get::<String, _>("id").map_err(map_sqlx)?),
        created_at_ms: row.try_get("created_at_ms").map_err(map_sqlx)?,
        build_id: BuildId::from_string(row.try_get::<String, _>("build_id").map_err(map_sqlx)?),
        sequence_number: row.try_get("sequence_number").map_err(map_sqlx)?,
        event_type: json::tag(
            &row.try_get::<String, _>("event_type").map_err(map_sqlx)?,
            EventType::parse,
            "event type",
        )?,
        resource_id: row.try_get("resource_id").map_err(map_sqlx)?,
        workflow: opt_name("workflow")?,
        job_name: opt_name("job_name")?,
        resource_name: opt_name("resource_name")?,
        payload: row.try_get("payload").map_err(map_sqlx)?,
    })
}

/// Increment the build's event counter, creating the row lazily with
/// value 1. Runs inside the publisher's transaction, which is what makes
/// sequence numbers strictly increasing per build even under concurrent
/// publishers.
pub async fn next_sequence_number(
    conn: &mut SqliteConnection,
    build_id: &BuildId,
) -> StoreResult<SequenceNumber> {
    let row = sqlx::query(
        "INSERT INTO build_event_counters (build_id, counter) VALUES (?, 1) \
         ON CONFLICT (build_id) DO UPDATE SET counter = counter + 1 \
         RETURNING counter",
    )
    .bind(build_id.as_str())
    .fetch_one(conn)
    .await
    .map_err(map_sqlx)?;
    row.try_get("counter").map_err(map_sqlx)
}

pub async fn create(conn: &mut SqliteConnection, event: &Event) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO events \
         (id, created_at_ms, build_id, sequence_number, event_type, resource_id, \
          workflow, job_name, resource_name, payload) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(event.id.as_str())
    .bind(event.created_at_ms)
    .bind(event.build_id.as_str())
    .bind(event.sequence_number)
    .bind(event.event_type.to_string())
    .bind(&event.resource_id)
    .bind(event.workflow.as_ref().map(|n| n.as_str().to_string()))
    .bind(event.job_name.as_ref().map(|n| n.as_str().to_string()))
    .bind(event.resource_name.as_ref().map(|n| n.as_str().to_string()))
    .bind(&event.payload)
    .execute(conn)
    .await
    .map_err(map_sqlx)?;
    Ok(())
}

/// Events with `sequence_number > after`, ascending, at most `limit`.
/// Returns immediately; long polling is the transport's affair.
pub async fn fetch(
    conn: &mut SqliteConnection,
    build_id: &BuildId,
    after: SequenceNumber,
    limit: i64,
) -> StoreResult<Vec<Event>> {
    let rows = sqlx::query(
        "SELECT * FROM events WHERE build_id = ? AND sequence_number > ? \
         ORDER BY sequence_number LIMIT ?",
    )
    .bind(build_id.as_str())
    .bind(after)
    .bind(limit)
    .fetch_all(conn)
    .await
    .map_err(map_sqlx)?;
    rows.iter().map(from_row).collect()
}

/// Whole-build purge: the only deletion events ever see.
pub async fn purge_for_build(conn: &mut SqliteConnection, build_id: &BuildId) -> StoreResult<u64> {
    let deleted = sqlx::query("DELETE FROM events WHERE build_id = ?")
        .bind(build_id.as_str())
        .execute(&mut *conn)
        .await
        .map_err(map_sqlx)?
        .rows_affected();
    sqlx::query("DELETE FROM build_event_counters WHERE build_id = ?")
        .bind(build_id.as_str())
        .execute(conn)
        .await
        .map_err(map_sqlx)?;
    Ok(deleted)
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
