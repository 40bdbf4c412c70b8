// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::test_engine::fixture;
use bb_core::test_support::{job_def, with_dep};
use bb_core::{BuildStatus, JobStatus};

#[tokio::test]
async fn enqueue_allocates_names_from_the_repo_counter() {
    let f = fixture().await;
    let b1 = f.engine.enqueue(f.single_job_request(&["true"])).await.unwrap();
    let b2 = f.engine.enqueue(f.single_job_request(&["false"])).await.unwrap();
    assert_eq!(b1.name, "1");
    assert_eq!(b2.name, "2");
}

#[tokio::test]
async fn enqueue_from_counter_41_yields_42() {
    let f = fixture().await;
    let mut tx = f.engine.database().begin().await.unwrap();
    for _ in 0..41 {
        bb_storage::repos::allocate_build_number(&mut *tx, &f.repo.id, 0).await.unwrap();
    }
    tx.commit().await.unwrap();

    let build = f.engine.enqueue(f.single_job_request(&["true"])).await.unwrap();
    assert_eq!(build.name, "42");
    let next = f.engine.enqueue(f.single_job_request(&["false"])).await.unwrap();
    assert_eq!(next.name, "43");
}

#[tokio::test]
async fn enqueue_persists_jobs_steps_and_events() {
    let f = fixture().await;
    let request = f.request(vec![
        job_def("main", "compile", &["cargo build"]),
        with_dep(job_def("main", "test", &["cargo test"]), None, "compile"),
    ]);
    let build = f.engine.enqueue(request).await.unwrap();
    assert_eq!(build.status, BuildStatus::Submitted);

    let mut tx = f.engine.database().begin().await.unwrap();
    let jobs = bb_storage::jobs::list_for_build(&mut *tx, &build.id).await.unwrap();
    assert_eq!(jobs.len(), 2);
    assert!(jobs.iter().all(|j| j.status == JobStatus::Queued));
    assert!(jobs.iter().all(|j| j.fingerprint.is_some()));

    let steps = bb_storage::steps::list_for_job(&mut *tx, &jobs[0].id).await.unwrap();
    assert_eq!(steps.len(), 1);
    drop(tx);

    let events = f.engine.fetch_events(&build.id, 0, 100).await.unwrap();
    assert!(!events.is_empty());
    assert_eq!(events[0].sequence_number, 1);
    let sns: Vec<i64> = events.iter().map(|e| e.sequence_number).collect();
    let mut sorted = sns.clone();
    sorted.sort_unstable();
    assert_eq!(sns, sorted);
}

#[tokio::test]
async fn same_workflow_dependencies_resolve_forward_references() {
    let f = fixture().await;
    // "test" is declared before its dependency "compile".
    let request = f.request(vec![
        with_dep(job_def("main", "test", &["cargo test"]), None, "compile"),
        job_def("main", "compile", &["cargo build"]),
    ]);
    let build = f.engine.enqueue(request).await.unwrap();

    let mut tx = f.engine.database().begin().await.unwrap();
    let deps = bb_storage::job_dependencies::list_for_build(&mut *tx, &build.id).await.unwrap();
    assert_eq!(deps.len(), 1);
    assert!(deps[0].target_job_id.is_some());
}

#[tokio::test]
async fn unknown_same_workflow_dependency_is_rejected() {
    let f = fixture().await;
    let request = f.request(vec![with_dep(
        job_def("main", "test", &["cargo test"]),
        None,
        "missing",
    )]);
    let err = f.engine.enqueue(request).await.unwrap_err();
    assert_eq!(err.code, bb_core::ErrorCode::ValidationFailed);

    // The whole enqueue aborted: no build row became visible.
    let mut tx = f.engine.database().begin().await.unwrap();
    let page = bb_storage::builds::list_for_repo(&mut *tx, &f.repo.id, None, 10).await.unwrap();
    assert!(page.items.is_empty());
}

#[tokio::test]
async fn cross_workflow_dependency_defers_until_target_arrives() {
    let f = fixture().await;
    let request = f.request(vec![with_dep(
        job_def("main", "deploy", &["./deploy.sh"]),
        Some("release"),
        "sign",
    )]);
    let build = f.engine.enqueue(request).await.unwrap();

    let mut tx = f.engine.database().begin().await.unwrap();
    assert_eq!(
        bb_storage::job_dependencies::deferred_remaining(&mut *tx, &build.id).await.unwrap(),
        1
    );
    drop(tx);

    // The dynamic addition of release.sign resolves the edge.
    f.engine
        .add_jobs(&build.id, vec![job_def("release", "sign", &["./sign.sh"])])
        .await
        .unwrap();
    let mut tx = f.engine.database().begin().await.unwrap();
    assert_eq!(
        bb_storage::job_dependencies::deferred_remaining(&mut *tx, &build.id).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn dependency_cycles_are_rejected_before_any_insert() {
    let f = fixture().await;
    let request = f.request(vec![
        with_dep(job_def("main", "a", &["true"]), None, "b"),
        with_dep(job_def("main", "b", &["true"]), None, "a"),
    ]);
    let err = f.engine.enqueue(request).await.unwrap_err();
    assert_eq!(err.code, bb_core::ErrorCode::ValidationFailed);
    assert!(err.message.contains("cycle"));
}

#[tokio::test]
async fn fingerprint_hit_skips_job_with_indirection() {
    let f = fixture().await;
    let first = f.engine.enqueue(f.single_job_request(&["cargo build"])).await.unwrap();
    let mut tx = f.engine.database().begin().await.unwrap();
    let jobs = bb_storage::jobs::list_for_build(&mut *tx, &first.id).await.unwrap();
    let prior = jobs[0].clone();
    drop(tx);

    // The prior job succeeds, making it a re-use target.
    f.engine
        .update_job_status(&prior.id, prior.etag, JobStatus::Submitted, None)
        .await
        .unwrap();
    let job = f.read_job(&prior.id).await;
    f.engine.update_job_status(&job.id, job.etag, JobStatus::Running, None).await.unwrap();
    let job = f.read_job(&prior.id).await;
    f.engine.update_job_status(&job.id, job.etag, JobStatus::Succeeded, None).await.unwrap();

    // Same definition, same fingerprint: the new job is skipped and
    // indirected, and the whole build settles immediately.
    let second = f.engine.enqueue(f.single_job_request(&["cargo build"])).await.unwrap();
    let mut tx = f.engine.database().begin().await.unwrap();
    let jobs = bb_storage::jobs::list_for_build(&mut *tx, &second.id).await.unwrap();
    assert_eq!(jobs[0].status, JobStatus::Skipped);
    assert_eq!(jobs[0].indirect_to_job_id, Some(prior.id));
    let steps = bb_storage::steps::list_for_job(&mut *tx, &jobs[0].id).await.unwrap();
    assert!(steps.iter().all(|s| s.status == bb_core::StepStatus::Skipped));
    let settled = bb_storage::builds::read(&mut *tx, &second.id).await.unwrap();
    assert_eq!(settled.status, BuildStatus::Succeeded);
}

#[tokio::test]
async fn force_runs_despite_fingerprint_hit() {
    let f = fixture().await;
    let first = f.engine.enqueue(f.single_job_request(&["cargo build"])).await.unwrap();
    let mut tx = f.engine.database().begin().await.unwrap();
    let prior = bb_storage::jobs::list_for_build(&mut *tx, &first.id).await.unwrap()[0].clone();
    drop(tx);
    f.engine
        .update_job_status(&prior.id, prior.etag, JobStatus::Submitted, None)
        .await
        .unwrap();
    let job = f.read_job(&prior.id).await;
    f.engine.update_job_status(&job.id, job.etag, JobStatus::Running, None).await.unwrap();
    let job = f.read_job(&prior.id).await;
    f.engine.update_job_status(&job.id, job.etag, JobStatus::Succeeded, None).await.unwrap();

    let mut request = f.single_job_request(&["cargo build"]);
    request.opts.force = true;
    let second = f.engine.enqueue(request).await.unwrap();
    let mut tx = f.engine.database().begin().await.unwrap();
    let jobs = bb_storage::jobs::list_for_build(&mut *tx, &second.id).await.unwrap();
    assert_eq!(jobs[0].status, JobStatus::Queued);
    assert!(jobs[0].indirect_to_job_id.is_none());
}

#[tokio::test]
async fn nodes_to_run_narrows_to_transitive_closure() {
    let f = fixture().await;
    let mut request = f.request(vec![
        job_def("main", "compile", &["cargo build"]),
        with_dep(job_def("main", "test", &["cargo test"]), None, "compile"),
        job_def("main", "docs", &["cargo doc"]),
    ]);
    request.opts.nodes_to_run = vec!["main.test".to_string()];
    let build = f.engine.enqueue(request).await.unwrap();

    let mut tx = f.engine.database().begin().await.unwrap();
    let jobs = bb_storage::jobs::list_for_build(&mut *tx, &build.id).await.unwrap();
    let names: Vec<String> = jobs.iter().map(|j| j.node_key()).collect();
    assert!(names.contains(&"main.compile".to_string()));
    assert!(names.contains(&"main.test".to_string()));
    assert!(!names.contains(&"main.docs".to_string()));
}

#[tokio::test]
async fn add_jobs_rejects_terminal_builds_and_duplicates() {
    let f = fixture().await;
    let build = f.engine.enqueue(f.single_job_request(&["true"])).await.unwrap();

    // Duplicate (workflow, name) in the same build.
    let err = f
        .engine
        .add_jobs(&build.id, vec![job_def("main", "compile", &["true"])])
        .await
        .unwrap_err();
    assert!(err.is_already_exists());

    f.engine.cancel_build(&build.id).await.unwrap();
    let err = f
        .engine
        .add_jobs(&build.id, vec![job_def("main", "late", &["true"])])
        .await
        .unwrap_err();
    assert_eq!(err.code, bb_core::ErrorCode::ValidationFailed);
}

#[tokio::test]
async fn duplicate_in_flight_submission_is_rejected() {
    let f = fixture().await;
    let request = f.single_job_request(&["true"]);
    f.engine.enqueue(request.clone()).await.unwrap();
    let err = f.engine.enqueue(request).await.unwrap_err();
    assert!(err.is_already_exists());
}
