// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Steps: the shell command sequences inside a job.

use crate::build::Timings;
use crate::job::JobId;
use crate::log::LogDescriptorId;
use crate::name::ResourceName;
use crate::status::StepStatus;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a step.
    pub struct StepId("stp-");
}

/// One shell command sequence within a job. Unique by (job, name).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub id: StepId,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
    pub etag: i64,
    pub job_id: JobId,
    pub name: ResourceName,
    pub status: StepStatus,
    #[serde(flatten)]
    pub timings: Timings,
    pub commands: Vec<String>,
    /// Names of sibling steps that must finish first. Only meaningful when
    /// the job's step-execution mode is parallel.
    #[serde(default)]
    pub depends: Vec<ResourceName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_descriptor_id: Option<LogDescriptorId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Step {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

crate::builder! {
    pub struct StepBuilder => Step {
        set {
            job_id: JobId = JobId::generate(),
            name: ResourceName = ResourceName::must("run"),
            status: StepStatus = StepStatus::Queued,
            timings: Timings = Timings::default(),
            commands: Vec<String> = vec!["true".to_string()],
            depends: Vec<ResourceName> = Vec::new(),
        }
        option {
            log_descriptor_id: LogDescriptorId = None,
            error: String = None,
        }
        computed {
            id: StepId = StepId::generate(),
            created_at_ms: i64 = 0,
            updated_at_ms: i64 = 0,
            etag: i64 = 1,
        }
    }
}
