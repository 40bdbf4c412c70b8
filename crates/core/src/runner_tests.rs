// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

fn runner_with_labels(labels: &[&str]) -> Runner {
    Runner::builder()
        .labels(labels.iter().map(|l| l.to_string()).collect())
        .build()
}

#[parameterized(
    superset = { &["linux", "x64", "gpu"], true },
    exact = { &["linux", "x64"], true },
    missing_one = { &["linux"], false },
    disjoint = { &["windows"], false },
)]
fn can_run_requires_label_cover(runner_labels: &[&str], eligible: bool) {
    let runner = runner_with_labels(runner_labels);
    let runs_on = vec!["linux".to_string(), "x64".to_string()];
    assert_eq!(runner.can_run(JobType::Exec, &runs_on), eligible);
}

#[test]
fn can_run_with_no_labels_required() {
    let runner = runner_with_labels(&[]);
    assert!(runner.can_run(JobType::Exec, &[]));
}

#[test]
fn can_run_requires_supported_type() {
    let mut runner = runner_with_labels(&["linux"]);
    runner.supported_job_types = vec![JobType::Exec];
    assert!(!runner.can_run(JobType::Docker, &[]));
    assert!(runner.can_run(JobType::Exec, &[]));
}

#[test]
fn runtime_info_overwrites_reported_fields() {
    let mut runner = runner_with_labels(&["linux"]);
    runner.apply_runtime_info(RuntimeInfo {
        os: "darwin".into(),
        arch: "aarch64".into(),
        software_version: "1.2.3".into(),
        supported_job_types: vec![JobType::Exec],
    });
    assert_eq!(runner.os, "darwin");
    assert_eq!(runner.arch, "aarch64");
    assert_eq!(runner.software_version, "1.2.3");
    assert_eq!(runner.supported_job_types, vec![JobType::Exec]);
}
