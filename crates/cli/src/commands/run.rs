// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `bb run`: execute the working directory's build in one process.

use crate::exit_error::ExitError;
use crate::local::LocalCoordinator;
use anyhow::Context;
use bb_core::{
    BuildDefinition, BuildOptions, BuildStatus, LegalEntity, Repo, ResourceName, Runner,
    SystemClock,
};
use bb_encrypt::{Encrypter, LocalKeyManager, MASTER_KEY_LEN};
use bb_engine::{Engine, EnqueueRequest};
use bb_runner::{DockerExecutor, ExecExecutor, Executor, Scheduler, SchedulerConfig};
use bb_storage::Database;
use fs2::FileExt;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Name of the parsed build-definition file. The YAML grammar lives in
/// the external parser; this file is its parsed JSON form.
const DEFINITION_FILE: &str = ".buildbeaver.json";
const STATE_DIR: &str = ".beaver";
const POLL_INTERVAL: Duration = Duration::from_millis(250);

pub struct RunArgs {
    pub workflows: Vec<String>,
    pub workdir: PathBuf,
    pub force: bool,
    pub skip_cleanup: bool,
    pub json: bool,
}

pub async fn execute(args: RunArgs) -> Result<(), ExitError> {
    let workdir = args
        .workdir
        .canonicalize()
        .with_context(|| format!("resolving workdir {:?}", args.workdir))
        .map_err(ExitError::from)?;
    let state_dir = workdir.join(STATE_DIR);
    std::fs::create_dir_all(&state_dir)
        .with_context(|| format!("creating {STATE_DIR}"))
        .map_err(ExitError::from)?;

    // One invocation at a time per working directory.
    let lock_path = state_dir.join("bb.lock");
    let lock_file = std::fs::File::create(&lock_path)
        .with_context(|| format!("opening lock file {lock_path:?}"))
        .map_err(ExitError::from)?;
    lock_file
        .try_lock_exclusive()
        .map_err(|_| ExitError::new(1, "another bb invocation is already running here"))?;

    let definition = load_definition(&workdir)?;
    let nodes_to_run = select_nodes(&definition, &args.workflows)?;

    let db = Database::open(&state_dir.join("beaver.db")).await.map_err(ExitError::from)?;
    let encrypter = Encrypter::new(Arc::new(load_master_key(&state_dir)?));
    let clock = SystemClock;
    let engine = Engine::new(db.clone(), clock.clone(), encrypter);

    let (repo, runner) = provision(&db, &workdir).await?;

    // Work-queue pool for the engine's side effects.
    let registry = bb_workq::HandlerRegistry::new();
    bb_engine::register_handlers(&registry, db.clone());
    let processor = Arc::new(bb_workq::Processor::new(
        db.clone(),
        registry,
        bb_workq::ProcessorConfig::default(),
        clock.clone(),
    ));
    let processor_handle = Arc::clone(&processor).start();

    // Enqueue.
    let commit_sha = definition_sha(&workdir)?;
    let build = engine
        .enqueue(EnqueueRequest {
            repo_id: repo.id,
            definition,
            commit_sha,
            ref_name: "refs/heads/local".to_string(),
            opts: BuildOptions { nodes_to_run, force: args.force },
        })
        .await
        .map_err(ExitError::from)?;
    tracing::info!(build = %build.id, name = %build.name, "build enqueued");

    // In-process runner.
    let coordinator = Arc::new(LocalCoordinator::new(engine.clone(), runner.id, &state_dir));
    let executor: Arc<dyn Executor> = match docker_available() {
        true => Arc::new(DockerExecutor::default()),
        false => Arc::new(ExecExecutor),
    };
    let scheduler = Scheduler::new(
        coordinator,
        executor,
        SchedulerConfig {
            parallel_jobs: 4,
            poll_interval: POLL_INTERVAL,
            workdir: workdir.clone(),
            labels: runner.labels.clone(),
            supported_job_types: runner.supported_job_types.clone(),
            software_version: env!("CARGO_PKG_VERSION").to_string(),
        },
    );
    scheduler.start();

    // Wait for the build to settle, then drain the runner.
    let finished = wait_for_terminal(&engine, &build.id).await?;
    scheduler.stop_when_quiet().await;
    processor_handle.stop().await;

    report(&engine, &finished, args.json).await?;

    if !args.skip_cleanup {
        let _ = std::fs::remove_file(state_dir.join("bb.lock"));
    }
    match finished.status {
        BuildStatus::Succeeded => Ok(()),
        _ => Err(ExitError::failed_build()),
    }
}

fn load_definition(workdir: &Path) -> Result<BuildDefinition, ExitError> {
    let path = workdir.join(DEFINITION_FILE);
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("reading {DEFINITION_FILE}"))
        .map_err(ExitError::from)?;
    let definition: BuildDefinition = serde_json::from_str(&raw)
        .with_context(|| format!("parsing {DEFINITION_FILE}"))
        .map_err(ExitError::from)?;
    definition.validate().map_err(ExitError::from)?;
    Ok(definition)
}

/// Map workflow arguments to node keys: every job of each named
/// workflow (dependencies follow transitively at enqueue).
fn select_nodes(
    definition: &BuildDefinition,
    workflows: &[String],
) -> Result<Vec<String>, ExitError> {
    if workflows.is_empty() {
        return Ok(Vec::new());
    }
    let mut nodes = Vec::new();
    for workflow in workflows {
        let jobs: Vec<String> = definition
            .jobs
            .iter()
            .filter(|j| j.workflow.as_str() == workflow)
            .map(|j| j.node_key())
            .collect();
        if jobs.is_empty() {
            return Err(ExitError::new(1, format!("unknown workflow {workflow:?}")));
        }
        nodes.extend(jobs);
    }
    Ok(nodes)
}

/// Master key file, generated on first start.
fn load_master_key(state_dir: &Path) -> Result<LocalKeyManager, ExitError> {
    let path = state_dir.join("master.key");
    match std::fs::read(&path) {
        Ok(bytes) => {
            let key: [u8; MASTER_KEY_LEN] = bytes
                .try_into()
                .map_err(|_| ExitError::new(1, format!("corrupt master key at {path:?}")))?;
            Ok(LocalKeyManager::new(&key))
        }
        Err(_) => {
            let (key, manager) = LocalKeyManager::generate();
            std::fs::write(&path, key)
                .with_context(|| format!("writing {path:?}"))
                .map_err(ExitError::from)?;
            tracing::info!(?path, "generated master key");
            Ok(manager)
        }
    }
}

/// The standing local principals: one legal entity, one repo named
/// after the directory, one runner. Idempotent across invocations.
async fn provision(db: &Database, workdir: &Path) -> Result<(Repo, Runner), ExitError> {
    let repo_name = workdir
        .file_name()
        .map(|n| sanitize_name(&n.to_string_lossy()))
        .unwrap_or_else(|| "workspace".to_string());

    let mut tx = db.begin().await.map_err(ExitError::from)?;
    let entity = LegalEntity {
        id: bb_core::LegalEntityId::generate(),
        created_at_ms: 0,
        updated_at_ms: 0,
        etag: 1,
        name: parse_name("local")?,
        external_id: None,
    };
    let (entity, _) = bb_storage::legal_entities::find_or_create(&mut *tx, &entity)
        .await
        .map_err(ExitError::from)?;
    bb_auth::standard_groups::provision(&mut *tx, &entity.id, 0)
        .await
        .map_err(ExitError::from)?;
    let repo = Repo {
        id: bb_core::RepoId::generate(),
        created_at_ms: 0,
        updated_at_ms: 0,
        etag: 1,
        legal_entity_id: entity.id,
        name: parse_name(&repo_name)?,
        external_id: None,
        build_counter: 0,
    };
    let (repo, _) = bb_storage::repos::find_or_create(&mut *tx, &repo)
        .await
        .map_err(ExitError::from)?;
    let runner = Runner {
        id: bb_core::RunnerId::generate(),
        created_at_ms: 0,
        updated_at_ms: 0,
        deleted_at_ms: None,
        etag: 1,
        legal_entity_id: entity.id,
        name: parse_name("local-runner")?,
        labels: vec!["local".to_string(), std::env::consts::OS.to_string()],
        supported_job_types: vec![bb_core::JobType::Exec, bb_core::JobType::Docker],
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
        software_version: env!("CARGO_PKG_VERSION").to_string(),
        enabled: true,
    };
    let runner = match bb_storage::runners::read_by_name(&mut *tx, &entity.id, &runner.name)
        .await
    {
        Ok(existing) => existing,
        Err(e) if e.is_not_found() => {
            bb_storage::runners::create(&mut *tx, &runner).await.map_err(ExitError::from)?;
            runner
        }
        Err(e) => return Err(e.into()),
    };
    tx.commit()
        .await
        .map_err(|e| ExitError::new(1, format!("commit failed: {e}")))?;
    Ok((repo, runner))
}

fn parse_name(raw: &str) -> Result<ResourceName, ExitError> {
    ResourceName::parse(raw).map_err(|e| ExitError::new(1, e.to_string()))
}

fn sanitize_name(raw: &str) -> String {
    let cleaned: String = raw
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_lowercase() || c.is_ascii_digit() { c } else { '-' })
        .collect();
    let trimmed = cleaned.trim_matches('-');
    if trimmed.is_empty() {
        "workspace".to_string()
    } else {
        trimmed.chars().take(64).collect()
    }
}

/// Local builds have no SCM commit; the definition digest stands in so
/// unchanged definitions fingerprint identically across runs.
fn definition_sha(workdir: &Path) -> Result<String, ExitError> {
    let raw = std::fs::read(workdir.join(DEFINITION_FILE))
        .with_context(|| format!("reading {DEFINITION_FILE}"))
        .map_err(ExitError::from)?;
    let digest = Sha256::digest(&raw);
    Ok(digest.iter().map(|b| format!("{b:02x}")).collect())
}

fn docker_available() -> bool {
    std::process::Command::new("docker")
        .arg("version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

async fn wait_for_terminal(
    engine: &Engine<SystemClock>,
    build_id: &bb_core::BuildId,
) -> Result<bb_core::Build, ExitError> {
    let mut last_event = 0;
    loop {
        // Stream events as progress lines while waiting.
        let events = engine.fetch_events(build_id, last_event, 100).await?;
        for event in &events {
            last_event = event.sequence_number;
            tracing::info!(
                sequence = event.sequence_number,
                event_type = %event.event_type,
                resource = %event.resource_id,
                payload = %event.payload,
                "event"
            );
        }
        let build = {
            let mut tx = engine.database().begin().await.map_err(ExitError::from)?;
            bb_storage::builds::read(&mut *tx, build_id).await.map_err(ExitError::from)?
        };
        if build.is_terminal() {
            return Ok(build);
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

async fn report(
    engine: &Engine<SystemClock>,
    build: &bb_core::Build,
    json: bool,
) -> Result<(), ExitError> {
    let mut tx = engine.database().begin().await.map_err(ExitError::from)?;
    let jobs = bb_storage::jobs::list_for_build(&mut *tx, &build.id).await.map_err(ExitError::from)?;
    drop(tx);
    // The canonical path registered for this build.
    let path = engine
        .paths_for_resource(build.id.as_str())
        .await
        .map_err(ExitError::from)?
        .into_iter()
        .next()
        .map(|link| link.path)
        .unwrap_or_else(|| build.name.clone());
    if json {
        let doc = serde_json::json!({
            "build": build.name,
            "path": path,
            "status": build.status.to_string(),
            "jobs": jobs.iter().map(|j| serde_json::json!({
                "workflow": j.workflow.as_str(),
                "name": j.name.as_str(),
                "status": j.status.to_string(),
                "skipped_to": j.indirect_to_job_id.as_ref().map(|id| id.as_str()),
                "error": j.error,
            })).collect::<Vec<_>>(),
        });
        println!("{doc:#}");
    } else {
        println!("build {path} {}", build.status);
        for job in &jobs {
            println!("  {:<40} {}", job.node_key(), job.status);
        }
    }
    Ok(())
}
