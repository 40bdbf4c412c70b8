// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log descriptors: the tree of log containers for a build.

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a log descriptor.
    pub struct LogDescriptorId("log-");
}

/// One node in a build's log tree. The root belongs to the build; children
/// belong to jobs and steps. A descriptor is sealed once its producer
/// finishes; writes after sealing fail with `LogClosed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogDescriptor {
    pub id: LogDescriptorId,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
    pub etag: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<LogDescriptorId>,
    /// ID of the build, job, or step this descriptor records.
    pub resource_id: String,
    pub sealed: bool,
    pub size_bytes: i64,
}

crate::builder! {
    pub struct LogDescriptorBuilder => LogDescriptor {
        into {
            resource_id: String = "",
        }
        set {
            sealed: bool = false,
            size_bytes: i64 = 0,
        }
        option {
            parent_id: LogDescriptorId = None,
        }
        computed {
            id: LogDescriptorId = LogDescriptorId::generate(),
            created_at_ms: i64 = 0,
            updated_at_ms: i64 = 0,
            etag: i64 = 1,
        }
    }
}
