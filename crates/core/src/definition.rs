// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Version-tagged parsed build definition.
//!
//! The textual grammar (YAML/JSON short-forms) is parsed outside the core;
//! what arrives here is the already-expanded graph. The definition maps
//! 1:1 onto the persisted model: each [`JobDefinition`] becomes a job row,
//! each [`StepDefinition`] a step row, each [`DependencyDef`] an edge.

use crate::artifact::ArtifactDefinition;
use crate::error::{Error, Result};
use crate::job::{EnvValue, JobType, ServiceConfig, StepExecution};
use crate::name::ResourceName;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Definition schema version this core accepts.
pub const DEFINITION_VERSION: &str = "0.3";

/// Dependency declaration on a job definition. `workflow` defaults to the
/// declaring job's workflow when empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow: Option<ResourceName>,
    pub job_name: ResourceName,
    /// Artifact groups of the target to pull; empty means all.
    #[serde(default)]
    pub artifact_groups: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDefinition {
    pub name: ResourceName,
    pub commands: Vec<String>,
    #[serde(default)]
    pub depends: Vec<ResourceName>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDefinition {
    pub workflow: ResourceName,
    pub name: ResourceName,
    #[serde(rename = "type")]
    pub job_type: JobType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub runs_on: Vec<String>,
    #[serde(default)]
    pub environment: IndexMap<String, EnvValue>,
    #[serde(default)]
    pub services: Vec<ServiceConfig>,
    #[serde(default)]
    pub artifacts: Vec<ArtifactDefinition>,
    #[serde(default)]
    pub step_execution: StepExecution,
    #[serde(default)]
    pub fingerprint_commands: Vec<String>,
    #[serde(default)]
    pub depends: Vec<DependencyDef>,
    pub steps: Vec<StepDefinition>,
}

impl JobDefinition {
    /// Key this definition is addressed by within the build.
    pub fn node_key(&self) -> String {
        format!("{}.{}", self.workflow, self.name)
    }
}

/// A whole parsed build definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildDefinition {
    pub version: String,
    pub jobs: Vec<JobDefinition>,
}

impl BuildDefinition {
    /// Structural validation: version tag, non-empty jobs with steps,
    /// unique (workflow, name), unique step names, docker jobs carry an
    /// image. Dependency targets are *not* checked here: cross-workflow
    /// targets may legitimately not exist yet (deferred edges).
    pub fn validate(&self) -> Result<()> {
        let mut findings = crate::error::ValidationErrors::new();
        if self.version != DEFINITION_VERSION {
            findings.add(format!(
                "unsupported definition version {:?} (expected {DEFINITION_VERSION:?})",
                self.version
            ));
        }
        if self.jobs.is_empty() {
            findings.add("definition declares no jobs");
        }
        let mut seen = std::collections::HashSet::new();
        for job in &self.jobs {
            let key = job.node_key();
            if !seen.insert(key.clone()) {
                findings.add(format!("duplicate job {key}"));
            }
            if job.steps.is_empty() {
                findings.add(format!("job {key} declares no steps"));
            }
            if job.job_type == JobType::Docker && job.image.is_none() {
                findings.add(format!("docker job {key} declares no image"));
            }
            let mut step_names = std::collections::HashSet::new();
            for step in &job.steps {
                if !step_names.insert(step.name.as_str().to_string()) {
                    findings.add(format!("duplicate step {} in job {key}", step.name));
                }
                for dep in &step.depends {
                    if !job.steps.iter().any(|s| s.name == *dep) {
                        findings.add(format!(
                            "step {} in job {key} depends on unknown step {dep}",
                            step.name
                        ));
                    }
                }
            }
        }
        findings.into_result()
    }

    pub fn job(&self, workflow: &ResourceName, name: &ResourceName) -> Result<&JobDefinition> {
        self.jobs
            .iter()
            .find(|j| j.workflow == *workflow && j.name == *name)
            .ok_or_else(|| Error::not_found(format!("job {workflow}.{name}")))
    }
}

#[cfg(test)]
#[path = "definition_tests.rs"]
mod tests;
