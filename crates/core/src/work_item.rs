// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable work-queue records.

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a work item.
    pub struct WorkItemId("wkt-");
}

crate::define_id! {
    /// Unique identifier for a work-item state row.
    pub struct WorkItemStateId("wks-");
}

/// Outcome bookkeeping for a work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkItemStatus {
    Pending,
    Succeeded,
    Failed,
}

crate::string_enum! {
    WorkItemStatus {
        Pending => "pending",
        Succeeded => "succeeded",
        Failed => "failed",
    }
}

/// One queued unit of side-effect work. The handler is looked up by
/// `item_type`; `payload` is handler-defined JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: WorkItemId,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
    pub etag: i64,
    pub item_type: String,
    pub payload: String,
    /// Items sharing a concurrency key execute one at a time. Defaults to
    /// the item's own ID (no shared serialisation).
    pub concurrency_key: String,
    pub state_id: WorkItemStateId,
    pub status: WorkItemStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_detail: Option<String>,
}

/// Allocation state shared by all work items with one concurrency key.
/// The row is the mutex: a processor that holds the allocation owns every
/// item keyed to it until the lease expires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItemState {
    pub id: WorkItemStateId,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
    pub etag: i64,
    pub concurrency_key: String,
    pub attempts_so_far: i64,
    /// Earliest time the next attempt may start (backoff).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_before_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allocated_to: Option<String>,
    /// Lease expiry; a crashed processor's items become eligible again
    /// once this passes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allocated_until_ms: Option<i64>,
}

impl WorkItemState {
    /// True when a processor may take items keyed to this state now.
    pub fn allocatable_at(&self, now_ms: i64) -> bool {
        let backoff_ok = self.not_before_ms.map_or(true, |t| t <= now_ms);
        let lease_free = self.allocated_until_ms.map_or(true, |t| t < now_ms);
        backoff_ok && lease_free
    }
}

#[cfg(test)]
#[path = "work_item_tests.rs"]
mod tests;
