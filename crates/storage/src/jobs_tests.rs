// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::dialect::Dialect;
use crate::jobs::DequeueFilter;
use crate::test_db;
use bb_core::{
    Job, JobDependency, JobDependencyId, JobFingerprint, JobStatus, JobType, ResourceName,
};

fn filter(entity: &bb_core::LegalEntity, labels: &[&str]) -> DequeueFilter {
    DequeueFilter {
        legal_entity_id: entity.id,
        labels: labels.iter().map(|l| l.to_string()).collect(),
        supported_job_types: vec![JobType::Exec, JobType::Docker],
    }
}

async fn set_status(db: &crate::db::Database, job: &Job, status: JobStatus) {
    let mut tx = db.begin().await.unwrap();
    let mut fresh = crate::jobs::read(&mut *tx, &job.id).await.unwrap();
    fresh.status = status;
    crate::jobs::update_status(&mut *tx, &fresh, 99).await.unwrap();
    tx.commit().await.unwrap();
}

#[tokio::test]
async fn dequeue_picks_oldest_eligible() {
    let db = test_db::open().await;
    let (entity, repo) = test_db::seed_repo(&db).await;
    let build = test_db::seed_build(&db, &repo, "1").await;
    let a = test_db::seed_job(&db, &repo, &build, "main", "aaa").await;
    test_db::seed_job(&db, &repo, &build, "main", "bbb").await;

    let mut tx = db.begin().await.unwrap();
    let got = crate::jobs::dequeue_candidate(&mut *tx, &filter(&entity, &[]), Dialect::Sqlite)
        .await
        .unwrap()
        .unwrap();
    // Equal created_at: smallest id wins.
    let expect = a.id.min(got.id);
    assert_eq!(got.id, expect);
}

#[tokio::test]
async fn dequeue_requires_label_cover() {
    let db = test_db::open().await;
    let (entity, repo) = test_db::seed_repo(&db).await;
    let build = test_db::seed_build(&db, &repo, "1").await;
    let mut tx = db.begin().await.unwrap();
    let job = Job::builder()
        .build_id(build.id)
        .repo_id(repo.id)
        .runs_on(vec!["linux".into(), "x64".into()])
        .build();
    crate::jobs::create(&mut *tx, &job).await.unwrap();
    tx.commit().await.unwrap();

    let mut tx = db.begin().await.unwrap();
    // linux alone does not cover {linux, x64}.
    let none = crate::jobs::dequeue_candidate(
        &mut *tx,
        &filter(&entity, &["linux"]),
        Dialect::Sqlite,
    )
    .await
    .unwrap();
    assert!(none.is_none());

    // A superset does.
    let got = crate::jobs::dequeue_candidate(
        &mut *tx,
        &filter(&entity, &["linux", "x64", "gpu"]),
        Dialect::Sqlite,
    )
    .await
    .unwrap();
    assert!(got.is_some());
}

#[tokio::test]
async fn dequeue_requires_supported_type() {
    let db = test_db::open().await;
    let (entity, repo) = test_db::seed_repo(&db).await;
    let build = test_db::seed_build(&db, &repo, "1").await;
    test_db::seed_job(&db, &repo, &build, "main", "compile").await;

    let mut tx = db.begin().await.unwrap();
    let mut f = filter(&entity, &[]);
    f.supported_job_types = vec![JobType::Docker];
    let none = crate::jobs::dequeue_candidate(&mut *tx, &f, Dialect::Sqlite).await.unwrap();
    assert!(none.is_none());
}

#[tokio::test]
async fn dequeue_blocks_on_unsatisfied_dependency() {
    let db = test_db::open().await;
    let (entity, repo) = test_db::seed_repo(&db).await;
    let build = test_db::seed_build(&db, &repo, "1").await;
    let c = test_db::seed_job(&db, &repo, &build, "main", "ccc").await;
    let b = test_db::seed_job(&db, &repo, &build, "main", "bbb").await;
    let mut tx = db.begin().await.unwrap();
    crate::job_dependencies::create(
        &mut *tx,
        &JobDependency {
            id: JobDependencyId::generate(),
            build_id: build.id,
            source_job_id: b.id,
            target_workflow: c.workflow.clone(),
            target_job_name: c.name.clone(),
            target_job_id: Some(c.id),
            artifact_groups: Vec::new(),
        },
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();

    // Only C is eligible while it is queued.
    let mut tx = db.begin().await.unwrap();
    let got = crate::jobs::dequeue_candidate(&mut *tx, &filter(&entity, &[]), Dialect::Sqlite)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(got.id, c.id);
    drop(tx);

    // Once C succeeds, B becomes eligible.
    set_status(&db, &c, JobStatus::Submitted).await;
    let mut fresh = {
        let mut tx = db.begin().await.unwrap();
        crate::jobs::read(&mut *tx, &c.id).await.unwrap()
    };
    fresh.status = JobStatus::Running;
    let mut tx = db.begin().await.unwrap();
    crate::jobs::update_status(&mut *tx, &fresh, 100).await.unwrap();
    tx.commit().await.unwrap();
    let mut tx = db.begin().await.unwrap();
    let mut fresh = crate::jobs::read(&mut *tx, &c.id).await.unwrap();
    fresh.status = JobStatus::Succeeded;
    crate::jobs::update_status(&mut *tx, &fresh, 101).await.unwrap();
    tx.commit().await.unwrap();

    let mut tx = db.begin().await.unwrap();
    let got = crate::jobs::dequeue_candidate(&mut *tx, &filter(&entity, &[]), Dialect::Sqlite)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(got.id, b.id);
}

#[tokio::test]
async fn dequeue_blocks_on_deferred_dependency() {
    let db = test_db::open().await;
    let (entity, repo) = test_db::seed_repo(&db).await;
    let build = test_db::seed_build(&db, &repo, "1").await;
    let b = test_db::seed_job(&db, &repo, &build, "main", "bbb").await;
    let mut tx = db.begin().await.unwrap();
    crate::job_dependencies::create(
        &mut *tx,
        &JobDependency {
            id: JobDependencyId::generate(),
            build_id: build.id,
            source_job_id: b.id,
            target_workflow: ResourceName::must("later"),
            target_job_name: ResourceName::must("notyet"),
            target_job_id: None,
            artifact_groups: Vec::new(),
        },
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();

    let mut tx = db.begin().await.unwrap();
    let none = crate::jobs::dequeue_candidate(&mut *tx, &filter(&entity, &[]), Dialect::Sqlite)
        .await
        .unwrap();
    assert!(none.is_none());
}

#[tokio::test]
async fn dequeue_never_returns_other_entities_jobs() {
    let db = test_db::open().await;
    let (_, repo) = test_db::seed_repo(&db).await;
    let build = test_db::seed_build(&db, &repo, "1").await;
    test_db::seed_job(&db, &repo, &build, "main", "compile").await;
    let (other_entity, _) = test_db::seed_repo(&db).await;

    let mut tx = db.begin().await.unwrap();
    let none = crate::jobs::dequeue_candidate(
        &mut *tx,
        &filter(&other_entity, &[]),
        Dialect::Sqlite,
    )
    .await
    .unwrap();
    assert!(none.is_none());
}

#[tokio::test]
async fn fingerprint_target_finds_latest_succeeded() {
    let db = test_db::open().await;
    let (_, repo) = test_db::seed_repo(&db).await;
    let build = test_db::seed_build(&db, &repo, "1").await;
    let fp = JobFingerprint { value: "abc123".into(), hash_type: "sha256".into() };

    let mut tx = db.begin().await.unwrap();
    let prior = Job::builder()
        .build_id(build.id)
        .repo_id(repo.id)
        .status(JobStatus::Succeeded)
        .fingerprint(fp.clone())
        .build();
    crate::jobs::create(&mut *tx, &prior).await.unwrap();
    tx.commit().await.unwrap();

    let mut tx = db.begin().await.unwrap();
    let got = crate::jobs::find_fingerprint_target(
        &mut *tx,
        &repo.id,
        &prior.workflow,
        &prior.name,
        &fp,
    )
    .await
    .unwrap();
    assert_eq!(got.unwrap().id, prior.id);

    // A different fingerprint misses.
    let other = JobFingerprint { value: "zzz".into(), hash_type: "sha256".into() };
    let none = crate::jobs::find_fingerprint_target(
        &mut *tx,
        &repo.id,
        &prior.workflow,
        &prior.name,
        &other,
    )
    .await
    .unwrap();
    assert!(none.is_none());
}

#[tokio::test]
async fn fingerprint_target_skips_indirected_jobs() {
    let db = test_db::open().await;
    let (_, repo) = test_db::seed_repo(&db).await;
    let build = test_db::seed_build(&db, &repo, "1").await;
    let fp = JobFingerprint { value: "abc123".into(), hash_type: "sha256".into() };

    let mut tx = db.begin().await.unwrap();
    let skipped = Job::builder()
        .build_id(build.id)
        .repo_id(repo.id)
        .status(JobStatus::Succeeded)
        .fingerprint(fp.clone())
        .indirect_to_job_id(bb_core::JobId::generate())
        .build();
    crate::jobs::create(&mut *tx, &skipped).await.unwrap();
    tx.commit().await.unwrap();

    let mut tx = db.begin().await.unwrap();
    let none = crate::jobs::find_fingerprint_target(
        &mut *tx,
        &repo.id,
        &skipped.workflow,
        &skipped.name,
        &fp,
    )
    .await
    .unwrap();
    assert!(none.is_none());
}

#[tokio::test]
async fn deferred_edges_resolve_by_name() {
    let db = test_db::open().await;
    let (_, repo) = test_db::seed_repo(&db).await;
    let build = test_db::seed_build(&db, &repo, "1").await;
    let b = test_db::seed_job(&db, &repo, &build, "main", "bbb").await;
    let mut tx = db.begin().await.unwrap();
    crate::job_dependencies::create(
        &mut *tx,
        &JobDependency {
            id: JobDependencyId::generate(),
            build_id: build.id,
            source_job_id: b.id,
            target_workflow: ResourceName::must("deploy"),
            target_job_name: ResourceName::must("push"),
            target_job_id: None,
            artifact_groups: Vec::new(),
        },
    )
    .await
    .unwrap();
    assert_eq!(
        crate::job_dependencies::deferred_remaining(&mut *tx, &build.id).await.unwrap(),
        1
    );
    tx.commit().await.unwrap();

    let target = test_db::seed_job(&db, &repo, &build, "deploy", "push").await;
    let mut tx = db.begin().await.unwrap();
    let resolved = crate::job_dependencies::update_deferred(
        &mut *tx,
        &build.id,
        &target.workflow,
        &target.name,
        &target.id,
    )
    .await
    .unwrap();
    assert_eq!(resolved, 1);
    assert_eq!(
        crate::job_dependencies::deferred_remaining(&mut *tx, &build.id).await.unwrap(),
        0
    );
    let deps = crate::job_dependencies::list_for_job(&mut *tx, &b.id).await.unwrap();
    assert_eq!(deps[0].target_job_id, Some(target.id));
}
