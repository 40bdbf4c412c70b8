// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Requests runners send to the server core.

use bb_core::{JobStatus, JobType, StepStatus};
use serde::{Deserialize, Serialize};

/// `POST /runner/dequeue` body: what the runner offers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DequeueRequest {
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub supported_job_types: Vec<JobType>,
}

/// `PATCH /runner/runtime-info` body: runner self-registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeInfoRequest {
    pub os: String,
    pub arch: String,
    pub software_version: String,
    pub supported_job_types: Vec<JobType>,
}

/// `PATCH /jobs/{id}` body: a status/timing transition. The stored etag
/// must match or the server answers `OptimisticLockFailed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchJobRequest {
    pub etag: i64,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `PATCH /steps/{id}` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchStepRequest {
    pub etag: i64,
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
