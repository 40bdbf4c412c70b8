// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log-descriptor operations. Chunk bytes go to the log storage
//! backend; the core tracks the descriptor tree and seal state.

use crate::engine::Engine;
use bb_core::{Clock, LogDescriptor, LogDescriptorId, Result};

impl<C: Clock> Engine<C> {
    /// Open a child log descriptor under a parent (job under build,
    /// step under job).
    pub async fn open_log(
        &self,
        parent_id: &LogDescriptorId,
        resource_id: &str,
    ) -> Result<LogDescriptor> {
        let now = self.now_ms();
        let mut tx = self.db.begin().await?;
        let parent = bb_storage::logs::read(&mut *tx, parent_id).await?;
        let log = LogDescriptor {
            id: LogDescriptorId::generate(),
            created_at_ms: now,
            updated_at_ms: now,
            etag: 1,
            parent_id: Some(parent.id),
            resource_id: resource_id.to_string(),
            sealed: false,
            size_bytes: 0,
        };
        bb_storage::logs::create(&mut *tx, &log).await?;
        self.commit(tx).await?;
        Ok(log)
    }

    /// Record appended bytes. `LogClosed` once sealed.
    pub async fn record_log_append(
        &self,
        log_id: &LogDescriptorId,
        appended_bytes: i64,
    ) -> Result<LogDescriptor> {
        let now = self.now_ms();
        let mut tx = self.db.begin().await?;
        bb_storage::logs::record_append(&mut *tx, log_id, appended_bytes, now).await?;
        let stored = bb_storage::logs::read(&mut *tx, log_id).await?;
        self.commit(tx).await?;
        Ok(stored)
    }

    /// Seal a descriptor once its producer finished. Idempotent.
    pub async fn seal_log(&self, log_id: &LogDescriptorId) -> Result<LogDescriptor> {
        let now = self.now_ms();
        let mut tx = self.db.begin().await?;
        bb_storage::logs::seal(&mut *tx, log_id, now).await?;
        let stored = bb_storage::logs::read(&mut *tx, log_id).await?;
        self.commit(tx).await?;
        Ok(stored)
    }

    pub async fn read_log(&self, log_id: &LogDescriptorId) -> Result<LogDescriptor> {
        let mut tx = self.db.begin().await?;
        let stored = bb_storage::logs::read(&mut *tx, log_id).await?;
        Ok(stored)
    }
}
