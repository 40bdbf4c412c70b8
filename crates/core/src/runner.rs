// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registered runners.

use crate::job::JobType;
use crate::legal_entity::LegalEntityId;
use crate::name::ResourceName;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a runner.
    pub struct RunnerId("run-");
}

/// Self-reported runtime facts a runner registers on its first poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeInfo {
    pub os: String,
    pub arch: String,
    pub software_version: String,
    pub supported_job_types: Vec<JobType>,
}

/// An external worker process that polls for jobs. Soft-deletable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Runner {
    pub id: RunnerId,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at_ms: Option<i64>,
    pub etag: i64,
    pub legal_entity_id: LegalEntityId,
    /// Unique within the legal entity (among live runners).
    pub name: ResourceName,
    /// Labels this runner offers; a job's `runs_on` set must be covered.
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub supported_job_types: Vec<JobType>,
    pub os: String,
    pub arch: String,
    pub software_version: String,
    pub enabled: bool,
}

impl Runner {
    /// True when this runner may execute the given job shape.
    pub fn can_run(&self, job_type: JobType, runs_on: &[String]) -> bool {
        self.supported_job_types.contains(&job_type)
            && runs_on.iter().all(|l| self.labels.iter().any(|have| have == l))
    }

    pub fn apply_runtime_info(&mut self, info: RuntimeInfo) {
        self.os = info.os;
        self.arch = info.arch;
        self.software_version = info.software_version;
        self.supported_job_types = info.supported_job_types;
    }
}

crate::builder! {
    pub struct RunnerBuilder => Runner {
        into {
            os: String = "linux",
            arch: String = "x86_64",
            software_version: String = "0.0.0-test",
        }
        set {
            legal_entity_id: LegalEntityId = LegalEntityId::generate(),
            name: ResourceName = ResourceName::must("runner-1"),
            labels: Vec<String> = Vec::new(),
            supported_job_types: Vec<JobType> = vec![JobType::Exec, JobType::Docker],
            enabled: bool = true,
        }
        option {
            deleted_at_ms: i64 = None,
        }
        computed {
            id: RunnerId = RunnerId::generate(),
            created_at_ms: i64 = 0,
            updated_at_ms: i64 = 0,
            etag: i64 = 1,
        }
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
