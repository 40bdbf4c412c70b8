// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::definition::{BuildDefinition, DependencyDef, JobDefinition, StepDefinition};
use crate::job::JobType;
use crate::name::ResourceName;

// ── Proptest strategies ─────────────────────────────────────────────────

/// Proptest strategies for core status and name types.
pub mod strategies {
    use crate::status::{BuildStatus, JobStatus, StepStatus};
    use proptest::prelude::*;

    pub fn arb_job_status() -> impl Strategy<Value = JobStatus> {
        prop_oneof![
            Just(JobStatus::Queued),
            Just(JobStatus::Submitted),
            Just(JobStatus::Running),
            Just(JobStatus::Succeeded),
            Just(JobStatus::Failed),
            Just(JobStatus::Canceled),
            Just(JobStatus::Skipped),
        ]
    }

    pub fn arb_step_status() -> impl Strategy<Value = StepStatus> {
        prop_oneof![
            Just(StepStatus::Queued),
            Just(StepStatus::Running),
            Just(StepStatus::Succeeded),
            Just(StepStatus::Failed),
            Just(StepStatus::Canceled),
            Just(StepStatus::Skipped),
        ]
    }

    pub fn arb_build_status() -> impl Strategy<Value = BuildStatus> {
        prop_oneof![
            Just(BuildStatus::Queued),
            Just(BuildStatus::Submitted),
            Just(BuildStatus::Running),
            Just(BuildStatus::Succeeded),
            Just(BuildStatus::Failed),
            Just(BuildStatus::Canceled),
        ]
    }

    /// Valid resource-name segments.
    pub fn arb_resource_name() -> impl Strategy<Value = crate::name::ResourceName> {
        "[a-z0-9][a-z0-9-]{0,20}[a-z0-9]"
            .prop_filter_map("edge dash", |s| crate::name::ResourceName::parse(s).ok())
    }
}

// ── Definition factory functions ────────────────────────────────────────

/// A single-step exec job definition in the given workflow.
pub fn job_def(workflow: &str, name: &str, commands: &[&str]) -> JobDefinition {
    JobDefinition {
        workflow: ResourceName::must(workflow),
        name: ResourceName::must(name),
        job_type: JobType::Exec,
        image: None,
        runs_on: Vec::new(),
        environment: indexmap::IndexMap::new(),
        services: Vec::new(),
        artifacts: Vec::new(),
        step_execution: Default::default(),
        fingerprint_commands: Vec::new(),
        depends: Vec::new(),
        steps: vec![StepDefinition {
            name: ResourceName::must("run"),
            commands: commands.iter().map(|c| c.to_string()).collect(),
            depends: Vec::new(),
        }],
    }
}

/// Add a same- or cross-workflow dependency to a job definition.
pub fn with_dep(mut job: JobDefinition, workflow: Option<&str>, target: &str) -> JobDefinition {
    job.depends.push(DependencyDef {
        workflow: workflow.map(ResourceName::must),
        job_name: ResourceName::must(target),
        artifact_groups: Vec::new(),
    });
    job
}

/// Wrap job definitions into a versioned definition.
pub fn definition(jobs: Vec<JobDefinition>) -> BuildDefinition {
    BuildDefinition { version: crate::definition::DEFINITION_VERSION.to_string(), jobs }
}
