// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Builds: one execution of the job graph for a commit of a repo.

use crate::log::LogDescriptorId;
use crate::repo::RepoId;
use crate::status::BuildStatus;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a build.
    pub struct BuildId("bld-");
}

/// Lifecycle timestamps shared by builds, jobs, and steps. Each field is
/// set exactly once, when the corresponding transition happens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queued_at_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub running_at_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canceled_at_ms: Option<i64>,
}

/// Caller-supplied options for an enqueue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOptions {
    /// Restrict the build to these (workflow, job) nodes and their
    /// transitive dependencies. Empty means the whole graph.
    #[serde(default)]
    pub nodes_to_run: Vec<String>,
    /// Run every job even when its fingerprint matches a prior success.
    #[serde(default)]
    pub force: bool,
}

/// A single execution of a repo's job graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Build {
    pub id: BuildId,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
    pub etag: i64,
    pub repo_id: RepoId,
    /// Stringified value of the repo's build counter at allocation time.
    pub name: String,
    /// Git ref the build was triggered for, e.g. `refs/heads/main`.
    pub ref_name: String,
    pub commit_sha: String,
    pub status: BuildStatus,
    #[serde(flatten)]
    pub timings: Timings,
    pub opts: BuildOptions,
    pub log_descriptor_id: LogDescriptorId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Build {
    /// True when no further job of this build can change state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

crate::builder! {
    pub struct BuildBuilder => Build {
        into {
            name: String = "1",
            ref_name: String = "refs/heads/main",
            commit_sha: String = "0000000000000000000000000000000000000000",
        }
        set {
            repo_id: RepoId = RepoId::generate(),
            status: BuildStatus = BuildStatus::Submitted,
            timings: Timings = Timings::default(),
            opts: BuildOptions = BuildOptions::default(),
            log_descriptor_id: LogDescriptorId = LogDescriptorId::generate(),
        }
        option {
            error: String = None,
        }
        computed {
            id: BuildId = BuildId::generate(),
            created_at_ms: i64 = 0,
            updated_at_ms: i64 = 0,
            etag: i64 = 1,
        }
    }
}
