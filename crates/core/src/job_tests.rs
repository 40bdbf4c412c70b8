// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn node_key_joins_workflow_and_name() {
    let job = Job::builder()
        .workflow(ResourceName::must("deploy"))
        .name(ResourceName::must("push"))
        .build();
    assert_eq!(job.node_key(), "deploy.push");
}

#[test]
fn indirection_flag_follows_field() {
    let plain = Job::builder().build();
    assert!(!plain.is_indirected());

    let skipped = Job::builder()
        .status(crate::status::JobStatus::Skipped)
        .indirect_to_job_id(JobId::generate())
        .build();
    assert!(skipped.is_indirected());
    assert!(skipped.is_terminal());
}

#[test]
fn deferred_dependency_has_no_target_id() {
    let dep = JobDependency {
        id: JobDependencyId::generate(),
        build_id: crate::build::BuildId::generate(),
        source_job_id: JobId::generate(),
        target_workflow: ResourceName::must("test"),
        target_job_name: ResourceName::must("integration"),
        target_job_id: None,
        artifact_groups: Vec::new(),
    };
    assert!(dep.is_deferred());
}

#[test]
fn env_value_serde_tags_variants() {
    let lit = serde_json::to_value(EnvValue::Literal("x".into())).unwrap();
    assert_eq!(lit, serde_json::json!({"literal": "x"}));
    let sec = serde_json::to_value(EnvValue::Secret("api-key".into())).unwrap();
    assert_eq!(sec, serde_json::json!({"secret": "api-key"}));
}

#[test]
fn step_execution_defaults_to_sequential() {
    assert_eq!(StepExecution::default(), StepExecution::Sequential);
}

#[test]
fn job_serde_round_trip() {
    let job = Job::builder()
        .runs_on(vec!["linux".into(), "x64".into()])
        .image("rust:1.80")
        .job_type(JobType::Docker)
        .build();
    let json = serde_json::to_string(&job).unwrap();
    let back: Job = serde_json::from_str(&json).unwrap();
    assert_eq!(back, job);
}
