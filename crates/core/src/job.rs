// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Jobs: the unit of work assigned to a runner.

use crate::artifact::ArtifactDefinition;
use crate::build::{BuildId, Timings};
use crate::name::ResourceName;
use crate::repo::RepoId;
use crate::runner::RunnerId;
use crate::status::JobStatus;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a job instance.
    pub struct JobId("job-");
}

crate::define_id! {
    /// Unique identifier for a job dependency edge.
    pub struct JobDependencyId("jdp-");
}

/// How a runner executes the job's steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    /// Steps run inside a container image.
    Docker,
    /// Steps run directly on the runner host.
    Exec,
}

crate::string_enum! {
    JobType {
        Docker => "docker",
        Exec => "exec",
    }
}

/// Whether a job's steps run one after another or all at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepExecution {
    /// Steps run in declaration order. The default when unspecified.
    #[default]
    Sequential,
    Parallel,
}

/// A value in a job's environment: literal text or a reference to a
/// repo secret resolved at dispatch time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvValue {
    Literal(String),
    /// Key of a repo secret; resolved under the identity's secret grant.
    Secret(String),
}

/// A sidecar service container started alongside a docker job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub image: String,
    #[serde(default)]
    pub environment: IndexMap<String, EnvValue>,
}

/// Fingerprint of a job's inputs plus the algorithm that produced it.
///
/// The canonicalisation behind the fingerprint is part of the on-disk
/// contract; `hash_type` records the algorithm so a future migration can
/// coexist with historical rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFingerprint {
    pub value: String,
    pub hash_type: String,
}

/// Dependency edge from one job to another, optionally narrowed to
/// specific artifact groups of the target.
///
/// A cross-workflow edge whose target job does not exist yet is stored
/// **deferred**: `target_job_id` stays empty until a job matching
/// (build, workflow, name) is created, at which point the edge is resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDependency {
    pub id: JobDependencyId,
    pub build_id: BuildId,
    pub source_job_id: JobId,
    pub target_workflow: ResourceName,
    pub target_job_name: ResourceName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_job_id: Option<JobId>,
    /// Artifact groups of the target this edge pulls in; empty means all.
    #[serde(default)]
    pub artifact_groups: Vec<String>,
}

impl JobDependency {
    pub fn is_deferred(&self) -> bool {
        self.target_job_id.is_none()
    }
}

/// The smallest unit assigned to a runner. Unique by
/// (build, workflow, name).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
    pub etag: i64,
    pub build_id: BuildId,
    pub repo_id: RepoId,
    pub workflow: ResourceName,
    pub name: ResourceName,
    pub status: JobStatus,
    #[serde(flatten)]
    pub timings: Timings,
    pub job_type: JobType,
    /// Container image for docker jobs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Labels a runner must cover to be eligible. Empty means any runner.
    #[serde(default)]
    pub runs_on: Vec<String>,
    #[serde(default)]
    pub environment: IndexMap<String, EnvValue>,
    #[serde(default)]
    pub services: Vec<ServiceConfig>,
    #[serde(default)]
    pub artifact_definitions: Vec<ArtifactDefinition>,
    #[serde(default)]
    pub step_execution: StepExecution,
    /// Commands whose output feeds the fingerprint in addition to the
    /// job's declared inputs.
    #[serde(default)]
    pub fingerprint_commands: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<JobFingerprint>,
    /// Set when this job was skipped on a fingerprint hit; points at the
    /// prior succeeded job whose outputs it inherits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indirect_to_job_id: Option<JobId>,
    /// The runner the job was dispatched to, once Submitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runner_id: Option<RunnerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Job {
    /// Key a job is addressed by within its build.
    pub fn node_key(&self) -> String {
        format!("{}.{}", self.workflow, self.name)
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// True when the job was redirected to a prior run at enqueue time.
    pub fn is_indirected(&self) -> bool {
        self.indirect_to_job_id.is_some()
    }
}

crate::builder! {
    pub struct JobBuilder => Job {
        set {
            build_id: BuildId = BuildId::generate(),
            repo_id: RepoId = RepoId::generate(),
            workflow: ResourceName = ResourceName::must("main"),
            name: ResourceName = ResourceName::must("compile"),
            status: JobStatus = JobStatus::Queued,
            timings: Timings = Timings::default(),
            job_type: JobType = JobType::Exec,
            runs_on: Vec<String> = Vec::new(),
            environment: IndexMap<String, EnvValue> = IndexMap::new(),
            services: Vec<ServiceConfig> = Vec::new(),
            artifact_definitions: Vec<ArtifactDefinition> = Vec::new(),
            step_execution: StepExecution = StepExecution::Sequential,
            fingerprint_commands: Vec<String> = Vec::new(),
        }
        option {
            image: String = None,
            fingerprint: JobFingerprint = None,
            indirect_to_job_id: JobId = None,
            runner_id: RunnerId = None,
            error: String = None,
        }
        computed {
            id: JobId = JobId::generate(),
            created_at_ms: i64 = 0,
            updated_at_ms: i64 = 0,
            etag: i64 = 1,
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
