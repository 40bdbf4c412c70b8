// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine fixtures for tests.

use crate::engine::{Engine, EnqueueRequest};
use bb_core::test_support::{definition, job_def};
use bb_core::{
    BuildOptions, FakeClock, JobDefinition, LegalEntity, Repo, ResourceName, Runner,
};
use bb_encrypt::{Encrypter, LocalKeyManager};
use bb_storage::Database;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static SEED: AtomicU64 = AtomicU64::new(0);

pub struct Fixture {
    pub engine: Engine<FakeClock>,
    pub clock: FakeClock,
    pub entity: LegalEntity,
    pub repo: Repo,
    pub runner: Runner,
}

pub async fn fixture() -> Fixture {
    let db = Database::open_in_memory().await.unwrap();
    let clock = FakeClock::new();
    let (_, key_manager) = LocalKeyManager::generate();
    let engine = Engine::new(db.clone(), clock.clone(), Encrypter::new(Arc::new(key_manager)));

    let n = SEED.fetch_add(1, Ordering::Relaxed);
    let mut tx = db.begin().await.unwrap();
    let entity = LegalEntity::builder()
        .name(ResourceName::must(&format!("acme-{n}")))
        .build();
    bb_storage::legal_entities::create(&mut *tx, &entity).await.unwrap();
    let repo = Repo::builder().legal_entity_id(entity.id).build();
    bb_storage::repos::create(&mut *tx, &repo).await.unwrap();
    let runner = Runner::builder()
        .legal_entity_id(entity.id)
        .labels(vec!["linux".into(), "x64".into()])
        .build();
    bb_storage::runners::create(&mut *tx, &runner).await.unwrap();
    tx.commit().await.unwrap();

    Fixture { engine, clock, entity, repo, runner }
}

impl Fixture {
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

    /// A single-job request with the given commands.
    pub fn single_job_request(&self, commands: &[&str]) -> EnqueueRequest {
        self.request(vec![job_def("main", "compile", commands)])
    }

    /// Fresh read of a job (current etag and status).
    pub async fn read_job(&self, id: &bb_core::JobId) -> bb_core::Job {
        let mut tx = self.engine.database().begin().await.unwrap();
        bb_storage::jobs::read(&mut *tx, id).await.unwrap()
    }

    /// Fresh read of a build.
    pub async fn read_build(&self, id: &bb_core::BuildId) -> bb_core::Build {
        let mut tx = self.engine.database().begin().await.unwrap();
        bb_storage::builds::read(&mut *tx, id).await.unwrap()
    }

    /// Drive a job through Submitted → Running → the given terminal.
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
}
