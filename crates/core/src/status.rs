// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build, job, and step status machines.

use serde::{Deserialize, Serialize};

/// Status of a job within a build.
///
/// Transitions move only along
/// `Queued → Submitted → Running → {Succeeded, Failed, Canceled}`;
/// `Skipped` is assigned at enqueue time when a fingerprint hit redirects
/// the job through `indirect_to_job_id`. All four right-hand states are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Submitted,
    Running,
    Succeeded,
    Failed,
    Canceled,
    Skipped,
}

crate::string_enum! {
    JobStatus {
        Queued => "queued",
        Submitted => "submitted",
        Running => "running",
        Succeeded => "succeeded",
        Failed => "failed",
        Canceled => "canceled",
        Skipped => "skipped",
    }
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Succeeded | JobStatus::Failed | JobStatus::Canceled | JobStatus::Skipped
        )
    }

    /// True when a dependent job may treat this dependency as satisfied.
    ///
    /// A skipped job counts: its outputs are inherited from the prior
    /// succeeded run it indirects to.
    pub fn satisfies_dependency(self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Skipped)
    }

    /// Legal forward transitions. Terminal states accept nothing.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        match self {
            JobStatus::Queued => matches!(
                next,
                JobStatus::Submitted | JobStatus::Canceled | JobStatus::Failed
            ),
            JobStatus::Submitted => matches!(
                next,
                JobStatus::Running | JobStatus::Canceled | JobStatus::Failed
            ),
            JobStatus::Running => matches!(
                next,
                JobStatus::Succeeded | JobStatus::Failed | JobStatus::Canceled
            ),
            JobStatus::Succeeded
            | JobStatus::Failed
            | JobStatus::Canceled
            | JobStatus::Skipped => false,
        }
    }
}

/// Status of a step within a job. Mirrors the job machine without the
/// dispatch-related `Submitted` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
    Canceled,
    Skipped,
}

crate::string_enum! {
    StepStatus {
        Queued => "queued",
        Running => "running",
        Succeeded => "succeeded",
        Failed => "failed",
        Canceled => "canceled",
        Skipped => "skipped",
    }
}

impl StepStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            StepStatus::Succeeded | StepStatus::Failed | StepStatus::Canceled | StepStatus::Skipped
        )
    }
}

/// Status of a build, derived monotonically from its jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStatus {
    Queued,
    Submitted,
    Running,
    Succeeded,
    Failed,
    Canceled,
}

crate::string_enum! {
    BuildStatus {
        Queued => "queued",
        Submitted => "submitted",
        Running => "running",
        Succeeded => "succeeded",
        Failed => "failed",
        Canceled => "canceled",
    }
}

impl BuildStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            BuildStatus::Succeeded | BuildStatus::Failed | BuildStatus::Canceled
        )
    }

    /// Roll a build's status up from its jobs' statuses.
    ///
    /// The result is monotonic in the job statuses: once every job is
    /// terminal the build is terminal, and a single failed or canceled job
    /// makes the whole build failed or canceled once nothing is left running.
    pub fn rollup(jobs: impl IntoIterator<Item = JobStatus>) -> BuildStatus {
        let mut any = false;
        let mut any_running = false;
        let mut any_submitted = false;
        let mut any_queued = false;
        let mut any_failed = false;
        let mut any_canceled = false;
        for j in jobs {
            any = true;
            match j {
                JobStatus::Queued => any_queued = true,
                JobStatus::Submitted => any_submitted = true,
                JobStatus::Running => any_running = true,
                JobStatus::Failed => any_failed = true,
                JobStatus::Canceled => any_canceled = true,
                JobStatus::Succeeded | JobStatus::Skipped => {}
            }
        }
        if !any {
            return BuildStatus::Submitted;
        }
        if any_running || any_submitted || any_queued {
            // Still in flight. Dispatch state only shows through once a
            // runner picked something up.
            if any_running || any_submitted {
                BuildStatus::Running
            } else {
                BuildStatus::Submitted
            }
        } else if any_failed {
            BuildStatus::Failed
        } else if any_canceled {
            BuildStatus::Canceled
        } else {
            BuildStatus::Succeeded
        }
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
