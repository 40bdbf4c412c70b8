// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The runnable-job document a successful dequeue returns.
//!
//! Everything a runner needs to execute the job without further
//! lookups: steps in order, environment resolved to plaintext (under
//! the identity's secret-read grant), service containers, and the
//! artifacts of dependency jobs materialised as download URIs.

use bb_core::{BuildId, JobId, JobType, StepExecution, StepId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnableStep {
    pub id: StepId,
    pub etag: i64,
    pub name: String,
    pub commands: Vec<String>,
    #[serde(default)]
    pub depends: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnableService {
    pub name: String,
    pub image: String,
    #[serde(default)]
    pub environment: IndexMap<String, String>,
}

/// Declaration of the files this job must upload when its steps
/// succeed, grouped for dependents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnableArtifactDef {
    pub group_name: String,
    pub paths: Vec<String>,
}

/// One artifact of a dependency job, addressed for download. When the
/// dependency was skipped, the URI already points through its
/// indirection target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnableArtifact {
    pub group_name: String,
    pub path: String,
    pub uri: String,
    pub hash_type: String,
    pub hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnableJob {
    pub job_id: JobId,
    pub build_id: BuildId,
    pub etag: i64,
    pub workflow: String,
    pub name: String,
    pub job_type: JobType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub step_execution: StepExecution,
    pub steps: Vec<RunnableStep>,
    /// Resolved to plaintext; values that came from secrets are also
    /// listed in `secret_values` so the runner's log pipeline can mask
    /// them.
    #[serde(default)]
    pub environment: IndexMap<String, String>,
    #[serde(default)]
    pub secret_values: Vec<String>,
    #[serde(default)]
    pub services: Vec<RunnableService>,
    #[serde(default)]
    pub artifact_definitions: Vec<RunnableArtifactDef>,
    #[serde(default)]
    pub dependency_artifacts: Vec<RunnableArtifact>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_round_trips() {
        let job = RunnableJob {
            job_id: JobId::generate(),
            build_id: BuildId::generate(),
            etag: 3,
            workflow: "main".into(),
            name: "compile".into(),
            job_type: JobType::Docker,
            image: Some("rust:1.80".into()),
            step_execution: StepExecution::Sequential,
            steps: vec![RunnableStep {
                id: StepId::generate(),
                etag: 1,
                name: "build".into(),
                commands: vec!["cargo build".into()],
                depends: Vec::new(),
            }],
            environment: IndexMap::from([("API_KEY".to_string(), "hunter2".to_string())]),
            secret_values: vec!["hunter2".into()],
            services: Vec::new(),
            artifact_definitions: vec![RunnableArtifactDef {
                group_name: "bin".into(),
                paths: vec!["out/*".into()],
            }],
            dependency_artifacts: Vec::new(),
        };
        let json = serde_json::to_string(&job).unwrap();
        let back: RunnableJob = serde_json::from_str(&json).unwrap();
        assert_eq!(back, job);
    }
}
