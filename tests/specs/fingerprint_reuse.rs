// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::support::world;
use bb_core::test_support::job_def;
use bb_core::{BuildStatus, JobStatus, ResourceName};

#[tokio::test]
async fn second_run_of_an_unchanged_job_is_skipped_with_indirection() {
    let w = world().await;
    let first = w
        .engine
        .enqueue(w.request(vec![job_def("main", "compile", &["cargo build"])]))
        .await
        .unwrap();
    let jobs = w.jobs_of(&first.id).await;
    let original = jobs[0].clone();

    // Run it to success, producing an artifact.
    let doc = w.engine.dequeue(&w.runner.id).await.unwrap();
    let artifact = w
        .engine
        .create_artifact(&doc.job_id, None, &ResourceName::must("bin"), "out/app")
        .await
        .unwrap();
    w.engine.seal_artifact(&artifact, "sha256", "feedface", 8).await.unwrap();
    w.finish_job(&doc.job_id, JobStatus::Succeeded).await;

    // Unchanged definition: the new build settles without dispatch.
    let second = w
        .engine
        .enqueue(w.request(vec![job_def("main", "compile", &["cargo build"])]))
        .await
        .unwrap();
    let jobs = w.jobs_of(&second.id).await;
    assert_eq!(jobs[0].status, JobStatus::Skipped);
    assert_eq!(jobs[0].indirect_to_job_id, Some(original.id));
    assert_eq!(w.build(&second.id).await.status, BuildStatus::Succeeded);
    assert!(w.engine.dequeue(&w.runner.id).await.unwrap_err().is_not_found());

    // Artifact lookups transparently follow the indirection.
    let found = w.engine.search_artifacts(&jobs[0].id, Some("bin")).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, artifact.id);
}

#[tokio::test]
async fn changed_commands_invalidate_reuse() {
    let w = world().await;
    let first = w
        .engine
        .enqueue(w.request(vec![job_def("main", "compile", &["cargo build"])]))
        .await
        .unwrap();
    let jobs = w.jobs_of(&first.id).await;
    w.finish_job(&jobs[0].id, JobStatus::Succeeded).await;

    let second = w
        .engine
        .enqueue(w.request(vec![job_def("main", "compile", &["cargo build --release"])]))
        .await
        .unwrap();
    let jobs = w.jobs_of(&second.id).await;
    assert_eq!(jobs[0].status, JobStatus::Queued);
    assert!(jobs[0].indirect_to_job_id.is_none());
}

#[tokio::test]
async fn only_succeeded_runs_are_reused() {
    let w = world().await;
    let first = w
        .engine
        .enqueue(w.request(vec![job_def("main", "compile", &["cargo build"])]))
        .await
        .unwrap();
    let jobs = w.jobs_of(&first.id).await;
    w.finish_job(&jobs[0].id, JobStatus::Failed).await;

    let second = w
        .engine
        .enqueue(w.request(vec![job_def("main", "compile", &["cargo build"])]))
        .await
        .unwrap();
    let jobs = w.jobs_of(&second.id).await;
    assert_eq!(jobs[0].status, JobStatus::Queued);
}
