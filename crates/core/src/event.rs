// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-build append-only event log.

use crate::build::BuildId;
use crate::name::ResourceName;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for an event.
    pub struct EventId("evt-");
}

/// Position of an event within its build's log. Strictly increasing,
/// normally contiguous; a rolled-back transaction leaves a gap.
pub type SequenceNumber = i64;

/// What happened. Payload interpretation is type-specific and opaque to
/// the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    BuildStatusChanged,
    JobStatusChanged,
    StepStatusChanged,
    ArtifactCreated,
    LogSealed,
}

crate::string_enum! {
    EventType {
        BuildStatusChanged => "build_status_changed",
        JobStatusChanged => "job_status_changed",
        StepStatusChanged => "step_status_changed",
        ArtifactCreated => "artifact_created",
        LogSealed => "log_sealed",
    }
}

/// One persisted event. Created inside the same transaction as the state
/// change it describes, so consumers never observe an event without its
/// effect or vice versa.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub created_at_ms: i64,
    pub build_id: BuildId,
    pub sequence_number: SequenceNumber,
    pub event_type: EventType,
    /// ID of the resource the event is about (job, step, build, artifact).
    pub resource_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow: Option<ResourceName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_name: Option<ResourceName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<ResourceName>,
    /// Type-specific payload, typically the new status string.
    pub payload: String,
}

crate::builder! {
    pub struct EventBuilder => Event {
        into {
            resource_id: String = "",
            payload: String = "",
        }
        set {
            build_id: BuildId = BuildId::generate(),
            sequence_number: SequenceNumber = 1,
            event_type: EventType = EventType::BuildStatusChanged,
        }
        option {
            workflow: ResourceName = None,
            job_name: ResourceName = None,
            resource_name: ResourceName = None,
        }
        computed {
            id: EventId = EventId::generate(),
            created_at_ms: i64 = 0,
        }
    }
}
