// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory database fixtures for storage tests.

use crate::db::Database;
use bb_core::{Build, Job, LegalEntity, Repo, ResourceName};
use std::sync::atomic::{AtomicU64, Ordering};

static SEED: AtomicU64 = AtomicU64::new(0);

pub async fn open() -> Database {
    Database::open_in_memory().await.unwrap()
}

/// Seed a legal entity and repo with unique names, returning both.
pub async fn seed_repo(db: &Database) -> (LegalEntity, Repo) {
    let n = SEED.fetch_add(1, Ordering::Relaxed);
    let mut tx = db.begin().await.unwrap();
    let entity = LegalEntity::builder()
        .name(ResourceName::must(&format!("acme-{n}")))
        .build();
    crate::legal_entities::create(&mut *tx, &entity).await.unwrap();
    let repo = Repo::builder().legal_entity_id(entity.id).build();
    crate::repos::create(&mut *tx, &repo).await.unwrap();
    tx.commit().await.unwrap();
    (entity, repo)
}

/// Seed a build under the given repo.
pub async fn seed_build(db: &Database, repo: &Repo, name: &str) -> Build {
    let mut tx = db.begin().await.unwrap();
    let build = Build::builder().repo_id(repo.id).name(name).build();
    crate::builds::create(&mut *tx, &build).await.unwrap();
    tx.commit().await.unwrap();
    build
}

/// Seed a queued exec job in the build.
pub async fn seed_job(db: &Database, repo: &Repo, build: &Build, workflow: &str, name: &str) -> Job {
    let mut tx = db.begin().await.unwrap();
    let job = Job::builder()
        .build_id(build.id)
        .repo_id(repo.id)
        .workflow(ResourceName::must(workflow))
        .name(ResourceName::must(name))
        .build();
    crate::jobs::create(&mut *tx, &job).await.unwrap();
    tx.commit().await.unwrap();
    job
}
