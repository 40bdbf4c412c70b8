// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

// --- JobStatus ---

#[parameterized(
    succeeded = { JobStatus::Succeeded },
    failed = { JobStatus::Failed },
    canceled = { JobStatus::Canceled },
    skipped = { JobStatus::Skipped },
)]
fn terminal_job_statuses(status: JobStatus) {
    assert!(status.is_terminal());
    assert!(!status.can_transition_to(JobStatus::Running));
}

#[parameterized(
    queued = { JobStatus::Queued },
    submitted = { JobStatus::Submitted },
    running = { JobStatus::Running },
)]
fn non_terminal_job_statuses(status: JobStatus) {
    assert!(!status.is_terminal());
}

#[test]
fn job_transition_path() {
    assert!(JobStatus::Queued.can_transition_to(JobStatus::Submitted));
    assert!(JobStatus::Submitted.can_transition_to(JobStatus::Running));
    assert!(JobStatus::Running.can_transition_to(JobStatus::Succeeded));
    assert!(JobStatus::Running.can_transition_to(JobStatus::Failed));

    // No skipping dispatch, no going backwards.
    assert!(!JobStatus::Queued.can_transition_to(JobStatus::Running));
    assert!(!JobStatus::Running.can_transition_to(JobStatus::Queued));
    assert!(!JobStatus::Submitted.can_transition_to(JobStatus::Queued));
}

#[test]
fn skipped_satisfies_dependency_canceled_does_not() {
    assert!(JobStatus::Succeeded.satisfies_dependency());
    assert!(JobStatus::Skipped.satisfies_dependency());
    assert!(!JobStatus::Canceled.satisfies_dependency());
    assert!(!JobStatus::Failed.satisfies_dependency());
    assert!(!JobStatus::Running.satisfies_dependency());
}

#[test]
fn job_status_display_parse_round_trip() {
    for s in [
        JobStatus::Queued,
        JobStatus::Submitted,
        JobStatus::Running,
        JobStatus::Succeeded,
        JobStatus::Failed,
        JobStatus::Canceled,
        JobStatus::Skipped,
    ] {
        assert_eq!(JobStatus::parse(&s.to_string()), Some(s));
    }
    assert_eq!(JobStatus::parse("bogus"), None);
}

// --- BuildStatus rollup ---

#[test]
fn rollup_all_succeeded() {
    let got = BuildStatus::rollup([JobStatus::Succeeded, JobStatus::Skipped]);
    assert_eq!(got, BuildStatus::Succeeded);
}

#[test]
fn rollup_failure_wins_once_settled() {
    let got = BuildStatus::rollup([JobStatus::Succeeded, JobStatus::Failed, JobStatus::Canceled]);
    assert_eq!(got, BuildStatus::Failed);
}

#[test]
fn rollup_canceled_without_failure() {
    let got = BuildStatus::rollup([JobStatus::Succeeded, JobStatus::Canceled]);
    assert_eq!(got, BuildStatus::Canceled);
}

#[test]
fn rollup_in_flight_is_running() {
    let got = BuildStatus::rollup([JobStatus::Succeeded, JobStatus::Running]);
    assert_eq!(got, BuildStatus::Running);
    let got = BuildStatus::rollup([JobStatus::Failed, JobStatus::Submitted]);
    assert_eq!(got, BuildStatus::Running);
}

#[test]
fn rollup_all_queued_is_submitted() {
    let got = BuildStatus::rollup([JobStatus::Queued, JobStatus::Queued]);
    assert_eq!(got, BuildStatus::Submitted);
}

#[test]
fn rollup_empty_is_submitted() {
    let got = BuildStatus::rollup(std::iter::empty());
    assert_eq!(got, BuildStatus::Submitted);
}

mod props {
    use super::*;
    use crate::test_support::strategies::arb_job_status;
    use proptest::prelude::*;

    proptest! {
        /// Once every job is terminal, the rollup is terminal.
        #[test]
        fn rollup_terminal_when_jobs_terminal(
            statuses in proptest::collection::vec(arb_job_status(), 1..8)
        ) {
            let all_terminal = statuses.iter().all(|s| s.is_terminal());
            let rolled = BuildStatus::rollup(statuses);
            if all_terminal {
                prop_assert!(rolled.is_terminal());
            } else {
                prop_assert!(!rolled.is_terminal());
            }
        }
    }
}
