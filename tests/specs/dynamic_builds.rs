// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::support::world;
use bb_core::test_support::{job_def, with_dep};
use bb_core::{JobStatus, Operation};

#[tokio::test]
async fn a_running_job_adds_jobs_through_its_build_identity() {
    let w = world().await;
    let build = w
        .engine
        .enqueue(w.request(vec![with_dep(
            job_def("main", "driver", &["./generate-jobs.sh"]),
            Some("generated"),
            "unit",
        )]))
        .await
        .unwrap();

    // The driver authenticates through a build-scoped identity.
    let mut tx = w.db.begin().await.unwrap();
    let identity =
        bb_auth::dynamic::ensure_build_identity(&mut *tx, &build.id, &w.entity.id, 0)
            .await
            .unwrap();
    // It may read and extend its own build, nothing else.
    let authz = bb_auth::Authorizer;
    assert!(authz
        .is_authorized(&mut *tx, &identity.id, Operation::JobCreate, build.id.as_str())
        .await
        .unwrap());
    assert!(!authz
        .is_authorized(&mut *tx, &identity.id, Operation::BuildCancel, build.id.as_str())
        .await
        .unwrap());
    tx.commit().await.unwrap();

    // The dynamic submission resolves the driver's deferred edge.
    w.engine
        .add_jobs(&build.id, vec![job_def("generated", "unit", &["cargo test"])])
        .await
        .unwrap();
    let mut tx = w.db.begin().await.unwrap();
    assert_eq!(
        bb_storage::job_dependencies::deferred_remaining(&mut *tx, &build.id).await.unwrap(),
        0
    );
    drop(tx);

    // Signed token round-trip for the identity.
    let issuer = bb_auth::SignedTokenIssuer::generate();
    let token = issuer.issue(identity.id, 0, bb_auth::DEFAULT_TOKEN_TTL_MS).unwrap();
    let claims = issuer.verify(&token, 1).unwrap();
    assert_eq!(claims.sub, identity.id);
}

#[tokio::test]
async fn identity_cleanup_runs_through_the_work_queue() {
    let w = world().await;
    let build = w
        .engine
        .enqueue(w.request(vec![job_def("main", "only", &["true"])]))
        .await
        .unwrap();
    let mut tx = w.db.begin().await.unwrap();
    bb_auth::dynamic::ensure_build_identity(&mut *tx, &build.id, &w.entity.id, 0)
        .await
        .unwrap();
    tx.commit().await.unwrap();

    // Terminal build queues the cleanup item.
    let jobs = w.jobs_of(&build.id).await;
    w.finish_job(&jobs[0].id, JobStatus::Succeeded).await;

    // One work-queue cycle deletes the identity.
    let registry = bb_workq::HandlerRegistry::new();
    bb_engine::register_handlers(&registry, w.db.clone());
    let processor = bb_workq::Processor::new(
        w.db.clone(),
        registry,
        bb_workq::ProcessorConfig {
            parallelism: 1,
            poll_interval: std::time::Duration::from_millis(5),
            backoff: Default::default(),
            record_retry_interval: std::time::Duration::from_millis(1),
        },
        w.clock.clone(),
    );
    assert!(processor.run_once().await.unwrap());

    let mut tx = w.db.begin().await.unwrap();
    let err = bb_storage::identities::read_by_owner(&mut *tx, build.id.as_str())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}
