// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The engine value and its construction.

use bb_core::{BuildDefinition, BuildOptions, Clock, RepoId};
use bb_encrypt::Encrypter;
use bb_storage::{Database, Dialect};

/// Everything the build-execution core needs to run. Cloneable; all
/// state lives in the store.
#[derive(Clone)]
pub struct Engine<C: Clock> {
    pub(crate) db: Database,
    pub(crate) clock: C,
    pub(crate) encrypter: Encrypter,
    pub(crate) dialect: Dialect,
}

/// One build submission.
#[derive(Debug, Clone)]
pub struct EnqueueRequest {
    pub repo_id: RepoId,
    pub definition: BuildDefinition,
    pub commit_sha: String,
    pub ref_name: String,
    pub opts: BuildOptions,
}

impl<C: Clock> Engine<C> {
    pub fn new(db: Database, clock: C, encrypter: Encrypter) -> Self {
        Self { db, clock, encrypter, dialect: Dialect::Sqlite }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub(crate) fn now_ms(&self) -> i64 {
        self.clock.epoch_ms()
    }

    pub(crate) async fn commit(&self, tx: bb_storage::Tx) -> Result<(), bb_core::Error> {
        tx.commit()
            .await
            .map_err(|e| bb_core::Error::wrap(bb_core::ErrorCode::Internal, "commit failed", e))
    }
}
