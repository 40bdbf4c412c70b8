// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build table.

use crate::cursor::{Cursor, Direction, Page};
use crate::error::{etag_update_outcome, map_sqlx, StoreResult};
use crate::json;
use bb_core::{Build, BuildId, BuildStatus, Error, LogDescriptorId, RepoId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

fn from_row(row: &SqliteRow) -> StoreResult<Build> {
    Ok(Build {
        id: BuildId::from_string(row.try_get::<String, _>("id").map_err(map_sqlx)?),
        created_at_ms: row.try_get("created_at_ms").map_err(map_sqlx)?,
        updated_at_ms: row.try_get("updated_at_ms").map_err(map_sqlx)?,
        etag: row.try_get("etag").map_err(map_sqlx)?,
        repo_id: RepoId::from_string(row.try_get::<String, _>("repo_id").map_err(map_sqlx)?),
        name: row.try_get("name").map_err(map_sqlx)?,
        ref_name: row.try_get("ref_name").map_err(map_sqlx)?,
        commit_sha: row.try_get("commit_sha").map_err(map_sqlx)?,
        status: json::tag(
            &row.try_get::<String, _>("status").map_err(map_sqlx)?,
            BuildStatus::parse,
            "build status",
        )?,
        timings: crate::rows::timings(row)?,
        opts: json::from_col(&row.try_get::<String, _>("opts").map_err(map_sqlx)?)?,
        log_descriptor_id: LogDescriptorId::from_string(
            row.try_get::<String, _>("log_descriptor_id").map_err(map_sqlx)?,
        ),
        error: row.try_get("error").map_err(map_sqlx)?,
    })
}

pub async fn create(conn: &mut SqliteConnection, build: &Build) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO builds \
         (id, created_at_ms, updated_at_ms, etag, repo_id, name, ref_name, commit_sha, status, \
          queued_at_ms, submitted_at_ms, running_at_ms, finished_at_ms, canceled_at_ms, \
          opts, log_descriptor_id, error) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(build.id.as_str())
    .bind(build.created_at_ms)
    .bind(build.updated_at_ms)
    .bind(build.etag)
    .bind(build.repo_id.as_str())
    .bind(&build.name)
    .bind(&build.ref_name)
    .bind(&build.commit_sha)
    .bind(build.status.to_string())
    .bind(build.timings.queued_at_ms)
    .bind(build.timings.submitted_at_ms)
    .bind(build.timings.running_at_ms)
    .bind(build.timings.finished_at_ms)
    .bind(build.timings.canceled_at_ms)
    .bind(json::to_col(&build.opts)?)
    .bind(build.log_descriptor_id.as_str())
    .bind(&build.error)
    .execute(conn)
    .await
    .map_err(map_sqlx)?;
    Ok(())
}

pub async fn read(conn: &mut SqliteConnection, id: &BuildId) -> StoreResult<Build> {
    let row = sqlx::query("SELECT * FROM builds WHERE id = ?")
        .bind(id.as_str())
        .fetch_optional(conn)
        .await
        .map_err(map_sqlx)?
        .ok_or_else(|| Error::not_found(format!("build {id}")))?;
    from_row(&row)
}

/// Whether a build already exists for this (repo, commit, ref). Duplicate
/// submissions surface as `AlreadyExists` to the enqueue caller.
pub async fn exists_for_commit(
    conn: &mut SqliteConnection,
    repo_id: &RepoId,
    commit_sha: &str,
    ref_name: &str,
) -> StoreResult<bool> {
    let row = sqlx::query(
        "SELECT 1 FROM builds WHERE repo_id = ? AND commit_sha = ? AND ref_name = ? LIMIT 1",
    )
    .bind(repo_id.as_str())
    .bind(commit_sha)
    .bind(ref_name)
    .fetch_optional(conn)
    .await
    .map_err(map_sqlx)?;
    Ok(row.is_some())
}

/// ETag-guarded status/timing/error update.
pub async fn update_status(
    conn: &mut SqliteConnection,
    build: &Build,
    now_ms: i64,
) -> StoreResult<()> {
    let result = sqlx::query(
        "UPDATE builds SET status = ?, queued_at_ms = ?, submitted_at_ms = ?, running_at_ms = ?, \
         finished_at_ms = ?, canceled_at_ms = ?, error = ?, updated_at_ms = ?, etag = etag + 1 \
         WHERE id = ? AND etag = ?",
    )
    .bind(build.status.to_string())
    .bind(build.timings.queued_at_ms)
    .bind(build.timings.submitted_at_ms)
    .bind(build.timings.running_at_ms)
    .bind(build.timings.finished_at_ms)
    .bind(build.timings.canceled_at_ms)
    .bind(&build.error)
    .bind(now_ms)
    .bind(build.id.as_str())
    .bind(build.etag)
    .execute(&mut *conn)
    .await
    .map_err(map_sqlx)?;
    let exists = result.rows_affected() == 0 && read(conn, &build.id).await.is_ok();
    etag_update_outcome(result.rows_affected(), exists, &format!("build {}", build.id))
}

/// Cursor-paged listing of a repo's builds, newest page boundaries by
/// `(created_at_ms, id)` ascending.
pub async fn list_for_repo(
    conn: &mut SqliteConnection,
    repo_id: &RepoId,
    cursor: Option<&str>,
    limit: usize,
) -> StoreResult<Page<Build>> {
    let boundary = cursor.map(Cursor::decode).transpose()?;
    let probe = (limit + 1) as i64;
    let rows = match &boundary {
        None => {
            sqlx::query(
                "SELECT * FROM builds WHERE repo_id = ? \
                 ORDER BY created_at_ms, id LIMIT ?",
            )
            .bind(repo_id.as_str())
            .bind(probe)
            .fetch_all(&mut *conn)
            .await
        }
        Some(c) if c.direction == Direction::Next => {
            sqlx::query(
                "SELECT * FROM builds WHERE repo_id = ? \
                 AND (created_at_ms > ? OR (created_at_ms = ? AND id > ?)) \
                 ORDER BY created_at_ms, id LIMIT ?",
            )
            .bind(repo_id.as_str())
            .bind(c.created_at_ms)
            .bind(c.created_at_ms)
            .bind(&c.id)
            .bind(probe)
            .fetch_all(&mut *conn)
            .await
        }
        Some(c) => {
            sqlx::query(
                "SELECT * FROM (SELECT * FROM builds WHERE repo_id = ? \
                 AND (created_at_ms < ? OR (created_at_ms = ? AND id < ?)) \
                 ORDER BY created_at_ms DESC, id DESC LIMIT ?) ORDER BY created_at_ms, id",
            )
            .bind(repo_id.as_str())
            .bind(c.created_at_ms)
            .bind(c.created_at_ms)
            .bind(&c.id)
            .bind(probe)
            .fetch_all(&mut *conn)
            .await
        }
    }
    .map_err(map_sqlx)?;
    let items = rows.iter().map(from_row).collect::<StoreResult<Vec<_>>>()?;
    let key = |b: &Build| (b.created_at_ms, b.id.as_str().to_string());
    Ok(match &boundary {
        Some(c) if c.direction == Direction::Prev => Page::backward(items, limit, key),
        Some(_) => Page::forward(items, limit, false, key),
        None => Page::forward(items, limit, true, key),
    })
}

#[cfg(test)]
#[path = "builds_tests.rs"]
mod tests;
