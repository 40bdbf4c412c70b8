// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::support::world;
use bb_core::test_support::{job_def, with_dep};
use bb_core::{BuildStatus, JobStatus};

#[tokio::test]
async fn a_two_job_chain_runs_to_success() {
    let w = world().await;
    let build = w
        .engine
        .enqueue(w.request(vec![
            job_def("main", "compile", &["cargo build"]),
            with_dep(job_def("main", "test", &["cargo test"]), None, "compile"),
        ]))
        .await
        .unwrap();
    assert_eq!(build.name, "1");
    assert_eq!(build.status, BuildStatus::Submitted);

    // The dispatcher hands out compile first; test is gated.
    let first = w.engine.dequeue(&w.runner.id).await.unwrap();
    assert_eq!(first.name, "compile");
    assert!(w.engine.dequeue(&w.runner.id).await.unwrap_err().is_not_found());

    w.finish_job(&first.job_id, JobStatus::Succeeded).await;
    let second = w.engine.dequeue(&w.runner.id).await.unwrap();
    assert_eq!(second.name, "test");
    w.finish_job(&second.job_id, JobStatus::Succeeded).await;

    let finished = w.build(&build.id).await;
    assert_eq!(finished.status, BuildStatus::Succeeded);
    assert!(finished.timings.finished_at_ms.is_some());

    // The event stream tells the same story, strictly ordered from 1.
    let events = w.engine.fetch_events(&build.id, 0, 100).await.unwrap();
    let sns: Vec<i64> = events.iter().map(|e| e.sequence_number).collect();
    assert_eq!(sns[0], 1);
    assert!(sns.windows(2).all(|w| w[1] > w[0]));
    assert!(events
        .iter()
        .any(|e| e.event_type == bb_core::EventType::BuildStatusChanged
            && e.payload == "succeeded"));
}

#[tokio::test]
async fn a_failed_job_fails_the_build_and_cancels_dependents() {
    let w = world().await;
    let build = w
        .engine
        .enqueue(w.request(vec![
            job_def("main", "compile", &["false"]),
            with_dep(job_def("main", "test", &["cargo test"]), None, "compile"),
        ]))
        .await
        .unwrap();

    let doc = w.engine.dequeue(&w.runner.id).await.unwrap();
    w.finish_job(&doc.job_id, JobStatus::Failed).await;

    let jobs = w.jobs_of(&build.id).await;
    let test = jobs.iter().find(|j| j.name == "test").unwrap();
    assert_eq!(test.status, JobStatus::Canceled);
    assert_eq!(w.build(&build.id).await.status, BuildStatus::Failed);

    // Failed builds keep their logs.
    let mut tx = w.db.begin().await.unwrap();
    let log = bb_storage::logs::read(&mut *tx, &build.log_descriptor_id).await.unwrap();
    assert!(log.sealed);
}

#[tokio::test]
async fn concurrent_enqueues_allocate_distinct_names() {
    let w = world().await;
    let b1 = w.engine.enqueue(w.request(vec![job_def("main", "a", &["true"])])).await.unwrap();
    let b2 = w.engine.enqueue(w.request(vec![job_def("main", "a", &["true"])])).await.unwrap();
    assert_eq!(b1.name, "1");
    assert_eq!(b2.name, "2");
}

#[tokio::test]
async fn event_stream_pages_with_the_watermark() {
    let w = world().await;
    let build = w
        .engine
        .enqueue(w.request(vec![job_def("main", "a", &["true"])]))
        .await
        .unwrap();
    let jobs = w.jobs_of(&build.id).await;
    w.finish_job(&jobs[0].id, JobStatus::Succeeded).await;

    let all = w.engine.fetch_events(&build.id, 0, 100).await.unwrap();
    assert!(all.len() >= 4);
    let first_two = w.engine.fetch_events(&build.id, 0, 2).await.unwrap();
    assert_eq!(first_two.len(), 2);
    let rest = w
        .engine
        .fetch_events(&build.id, first_two[1].sequence_number, 100)
        .await
        .unwrap();
    assert_eq!(first_two.len() + rest.len(), all.len());
    assert!(rest[0].sequence_number > first_two[1].sequence_number);
}
