// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared wiring for the behaviour suites.

use bb_core::test_support::definition;
use bb_core::{
    BuildOptions, FakeClock, JobDefinition, LegalEntity, Repo, ResourceName, Runner,
};
use bb_encrypt::{Encrypter, LocalKeyManager};
use bb_engine::{Engine, EnqueueRequest};
use bb_storage::Database;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static SEED: AtomicU64 = AtomicU64::new(0);

pub struct World {
    pub engine: Engine<FakeClock>,
    pub clock: FakeClock,
    pub db: Database,
    pub entity: LegalEntity,
    pub repo: Repo,
    pub runner: Runner,
}

pub async fn world() -> World {
    let db = Database::open_in_memory().await.unwrap();
    let clock = FakeClock::new();
    let (_, key_manager) = LocalKeyManager::generate();
    let engine = Engine::new(db.clone(), clock.clone(), Encrypter::new(Arc::new(key_manager)));

    let n = SEED.fetch_add(1, Ordering::Relaxed);
    let mut tx = db.begin().await.unwrap();
    let entity = LegalEntity::builder()
        .name(ResourceName::must(&format!("spec-{n}")))
        .build();
    bb_storage::legal_entities::create(&mut *tx, &entity).await.unwrap();
    bb_auth::standard_groups::provision(&mut *tx, &entity.id, 0).await.unwrap();
    let repo = Repo::builder().legal_entity_id(entity.id).build();
    bb_storage::repos::create(&mut *tx, &repo).await.unwrap();
    let runner = Runner::builder()
        .legal_entity_id(entity.id)
        .labels(vec!["linux".into(), "x64".into()])
        .build();
    bb_storage::runners::create(&mut *tx, &runner).await.unwrap();
    tx.commit().await.unwrap();

    World { engine, clock, db, entity, repo, runner }
}

impl World {
    pub fn request(&self, jobs: Vec<JobDefinition>) -> EnqueueRequest {
        let n = SEED.fetch_add(1, Ordering::Relaxed);
        EnqueueRequest {
            repo_id: self.repo.id,
            definition: definition(jobs),
            commit_sha: format!("{n:040x}"),
            ref_name: "refs/heads/main".to_string(),
            opts: BuildOptions::default(),
        }
    }

    /// Drive a job through its whole lifecycle as a runner would,
    /// re-reading for the fresh etag at each transition.
    pub async fn finish_job(&self, id: &bb_core::JobId, terminal: bb_core::JobStatus) {
        use bb_core::JobStatus;
        let job = self.read_job(id).await;
        if job.status == JobStatus::Queued {
            self.engine
                .update_job_status(id, job.etag, JobStatus::Submitted, None)
                .await
                .unwrap();
        }
        let job = self.read_job(id).await;
        if job.status == JobStatus::Submitted {
            self.engine.update_job_status(id, job.etag, JobStatus::Running, None).await.unwrap();
        }
        let job = self.read_job(id).await;
        self.engine.update_job_status(id, job.etag, terminal, None).await.unwrap();
    }

    pub async fn read_job(&self, id: &bb_core::JobId) -> bb_core::Job {
        let mut tx = self.db.begin().await.unwrap();
        bb_storage::jobs::read(&mut *tx, id).await.unwrap()
    }

    pub async fn jobs_of(&self, build_id: &bb_core::BuildId) -> Vec<bb_core::Job> {
        let mut tx = self.db.begin().await.unwrap();
        bb_storage::jobs::list_for_build(&mut *tx, build_id).await.unwrap()
    }

    pub async fn build(&self, build_id: &bb_core::BuildId) -> bb_core::Build {
        let mut tx = self.db.begin().await.unwrap();
        bb_storage::builds::read(&mut *tx, build_id).await.unwrap()
    }
}
