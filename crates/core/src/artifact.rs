// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Artifacts and the definitions that declare them.

use crate::build::BuildId;
use crate::job::JobId;
use crate::name::ResourceName;
use crate::step::StepId;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for an artifact.
    pub struct ArtifactId("art-");
}

/// Declaration on a job of the files it produces, grouped under a name so
/// dependents can pull a subset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactDefinition {
    pub group_name: ResourceName,
    /// Glob-style paths relative to the job workspace.
    pub paths: Vec<String>,
}

/// Metadata for one produced file, addressed by content hash. The blob
/// itself lives in the object store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: ArtifactId,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
    pub etag: i64,
    pub build_id: BuildId,
    pub job_id: JobId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_id: Option<StepId>,
    pub group_name: ResourceName,
    /// Path the producing step wrote, relative to the job workspace.
    /// Unique within (job, group).
    pub path: String,
    pub hash_type: String,
    pub hash: String,
    pub size_bytes: i64,
    /// True once the blob upload finished and the hash is final.
    pub sealed: bool,
}

crate::builder! {
    pub struct ArtifactBuilder => Artifact {
        into {
            path: String = "out/bin",
            hash_type: String = "sha256",
            hash: String = "",
        }
        set {
            build_id: BuildId = BuildId::generate(),
            job_id: JobId = JobId::generate(),
            group_name: ResourceName = ResourceName::must("default"),
            size_bytes: i64 = 0,
            sealed: bool = false,
        }
        option {
            step_id: StepId = None,
        }
        computed {
            id: ArtifactId = ArtifactId::generate(),
            created_at_ms: i64 = 0,
            updated_at_ms: i64 = 0,
            etag: i64 = 1,
        }
    }
}
