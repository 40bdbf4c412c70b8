// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Database handle and transaction wrapper.

use crate::error::{map_sqlx, StoreResult};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// A write transaction. SQLite has one writer at a time, which stands in
/// for per-row locks: everything inside a [`Tx`] is serialised against
/// every other writer, so `SELECT` inside a transaction behaves as
/// `SELECT ... FOR UPDATE` does on engines with row locks.
pub type Tx = sqlx::Transaction<'static, sqlx::Sqlite>;

/// Handle on the relational store.
///
/// The pool is capped at one connection: SQLite serialises writers
/// anyway, and a single connection makes `:memory:` databases behave
/// (each new connection to `:memory:` would otherwise be a fresh,
/// empty database).
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) a database file and run migrations.
    pub async fn open(path: &Path) -> StoreResult<Self> {
        let opts = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(10))
            .foreign_keys(true);
        Self::connect(opts).await
    }

    /// Open a fresh in-memory database. Used by tests and `bb run`'s
    /// ephemeral mode.
    pub async fn open_in_memory() -> StoreResult<Self> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(map_sqlx)?
            .foreign_keys(true);
        Self::connect(opts).await
    }

    async fn connect(opts: SqliteConnectOptions) -> StoreResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await
            .map_err(map_sqlx)?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| bb_core::Error::wrap(bb_core::ErrorCode::Internal, "migrating", e))?;
        tracing::debug!("database ready");
        Ok(Self { pool })
    }

    /// Begin a transaction. Callers pass `&mut *tx` down into table
    /// functions and commit when their unit of work is done; dropping
    /// the transaction rolls back.
    pub async fn begin(&self) -> StoreResult<Tx> {
        self.pool.begin().await.map_err(map_sqlx)
    }

    /// The underlying pool, for single-statement reads that do not need
    /// transactional context.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
