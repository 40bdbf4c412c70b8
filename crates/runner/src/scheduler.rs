// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The runner's poll loop and lifecycle.
//!
//! Stopped → Running → (Draining | Stopping) → Stopped. One in-flight
//! poll at a time; at most `parallel_jobs` jobs running; the first poll
//! of a lifetime registers runtime info instead of dequeuing; a
//! successful dequeue re-polls immediately while capacity remains.

use crate::api::CoordinatorApi;
use crate::executor::Executor;
use crate::job_task::JobTask;
use bb_core::JobType;
use bb_wire::RuntimeInfoRequest;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// Lifecycle states of a runner process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Stopped,
    Running,
    /// Finishing running jobs, not taking new ones; stops once quiet.
    Draining,
    /// Cancelling running jobs and shutting down.
    Stopping,
}

bb_core::simple_display! {
    RunState {
        Stopped => "stopped",
        Running => "running",
        Draining => "draining",
        Stopping => "stopping",
    }
}

#[derive(Clone)]
pub struct SchedulerConfig {
    /// Maximum concurrently running jobs. Floored at 2: a dynamic-build
    /// driver plus at least one regular job must fit.
    pub parallel_jobs: usize,
    pub poll_interval: Duration,
    pub workdir: PathBuf,
    pub labels: Vec<String>,
    pub supported_job_types: Vec<JobType>,
    pub software_version: String,
}

impl SchedulerConfig {
    fn effective_parallel_jobs(&self) -> usize {
        self.parallel_jobs.max(2)
    }
}

struct Inner {
    api: Arc<dyn CoordinatorApi>,
    executor: Arc<dyn Executor>,
    config: SchedulerConfig,
    state: Mutex<RunState>,
    running_jobs: AtomicUsize,
    /// Total completed jobs; the quiet check compares this against the
    /// count observed when an empty poll started.
    completions: AtomicU64,
    /// Completion count at the start of the last empty poll, if any.
    last_empty_poll_saw: Mutex<Option<u64>>,
    runtime_info_sent: Mutex<bool>,
    /// Wakes the loop and quiet-waiters on any progress.
    progress: Notify,
    /// Work context: cancelled by `stop()`, inherited by job tasks.
    cancel_work: CancellationToken,
    /// Loop context: cancelled when the loop itself should exit.
    cancel_loop: CancellationToken,
}

/// The client-side runner scheduler.
pub struct Scheduler {
    inner: Arc<Inner>,
    loop_task: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new(
        api: Arc<dyn CoordinatorApi>,
        executor: Arc<dyn Executor>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                executor,
                config,
                state: Mutex::new(RunState::Stopped),
                running_jobs: AtomicUsize::new(0),
                completions: AtomicU64::new(0),
                last_empty_poll_saw: Mutex::new(None),
                runtime_info_sent: Mutex::new(false),
                progress: Notify::new(),
                cancel_work: CancellationToken::new(),
                cancel_loop: CancellationToken::new(),
            }),
            loop_task: Mutex::new(None),
        }
    }

    pub fn state(&self) -> RunState {
        *self.inner.state.lock()
    }

    pub fn running_jobs(&self) -> usize {
        self.inner.running_jobs.load(Ordering::SeqCst)
    }

    /// Start the poll loop. No-op when already running.
    pub fn start(&self) {
        {
            let mut state = self.inner.state.lock();
            if *state != RunState::Stopped {
                return;
            }
            *state = RunState::Running;
        }
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            inner.poll_loop().await;
        });
        *self.loop_task.lock() = Some(handle);
        tracing::info!("runner scheduler started");
    }

    /// Cancel running jobs and stop. Blocks until the loop drained.
    pub async fn stop(&self) {
        {
            let mut state = self.inner.state.lock();
            if *state == RunState::Stopped {
                return;
            }
            *state = RunState::Stopping;
        }
        self.inner.cancel_work.cancel();
        self.inner.cancel_loop.cancel();
        self.inner.progress.notify_waiters();
        self.join_loop().await;
        *self.inner.state.lock() = RunState::Stopped;
        tracing::info!("runner scheduler stopped");
    }

    /// Stop once the queue has been observed empty after the last job
    /// completed: no new work is taken, running jobs finish.
    pub async fn stop_when_quiet(&self) {
        {
            let mut state = self.inner.state.lock();
            match *state {
                RunState::Stopped => return,
                _ => *state = RunState::Draining,
            }
        }
        self.inner.progress.notify_waiters();
        // Quiet means: nothing running, and an empty poll started after
        // the last completion was counted. The sleep arm bounds the
        // race between the check and the final notification.
        loop {
            if self.inner.is_quiet() {
                break;
            }
            tokio::select! {
                _ = self.inner.progress.notified() => {},
                _ = tokio::time::sleep(self.inner.config.poll_interval) => {},
            }
        }
        self.inner.cancel_loop.cancel();
        self.inner.progress.notify_waiters();
        self.join_loop().await;
        *self.inner.state.lock() = RunState::Stopped;
        tracing::info!("runner scheduler stopped after drain");
    }

    async fn join_loop(&self) {
        let handle = self.loop_task.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

impl Inner {
    fn is_quiet(&self) -> bool {
        if self.running_jobs.load(Ordering::SeqCst) != 0 {
            return false;
        }
        let completions = self.completions.load(Ordering::SeqCst);
        self.last_empty_poll_saw.lock().map_or(false, |saw| saw == completions)
    }

    async fn poll_loop(self: Arc<Self>) {
        let parallel_jobs = self.config.effective_parallel_jobs();
        loop {
            if self.cancel_loop.is_cancelled() {
                break;
            }
            let state = *self.state.lock();
            match state {
                RunState::Stopping | RunState::Stopped => break,
                RunState::Draining => {
                    // Keep polling only to observe emptiness for the
                    // quiet condition; never take new work.
                    if self.running_jobs.load(Ordering::SeqCst) == 0 {
                        self.observe_empty_poll().await;
                        if self.is_quiet() {
                            self.progress.notify_waiters();
                            break;
                        }
                    }
                    self.sleep_poll_interval().await;
                    continue;
                }
                RunState::Running => {}
            }

            // First poll of a lifetime: register runtime info instead
            // of dequeuing.
            {
                let first_poll = {
                    let mut sent = self.runtime_info_sent.lock();
                    let first = !*sent;
                    if first {
                        *sent = true;
                    }
                    first
                };
                if first_poll {
                    let info = RuntimeInfoRequest {
                        os: std::env::consts::OS.to_string(),
                        arch: std::env::consts::ARCH.to_string(),
                        software_version: self.config.software_version.clone(),
                        supported_job_types: self.config.supported_job_types.clone(),
                    };
                    if let Err(err) = self.api.register_runtime_info(info).await {
                        tracing::warn!(error = %err, "runtime info registration failed");
                        *self.runtime_info_sent.lock() = false;
                        self.sleep_poll_interval().await;
                    }
                    continue;
                }
            }

            // Capacity gate. The sleep arm bounds the race between the
            // capacity check and a completion notification.
            if self.running_jobs.load(Ordering::SeqCst) >= parallel_jobs {
                tokio::select! {
                    _ = self.progress.notified() => {},
                    _ = tokio::time::sleep(self.config.poll_interval) => {},
                    _ = self.cancel_loop.cancelled() => {},
                }
                continue;
            }

            // Single in-flight poll: this loop is the only caller.
            let completions_at_start = self.completions.load(Ordering::SeqCst);
            match self.api.dequeue().await {
                Ok(Some(job)) => {
                    self.spawn_job(job);
                    // Immediately re-poll while capacity remains.
                    continue;
                }
                Ok(None) => {
                    *self.last_empty_poll_saw.lock() = Some(completions_at_start);
                    self.progress.notify_waiters();
                    self.sleep_poll_interval().await;
                }
                Err(err) => {
                    tracing::warn!(error = %err, "dequeue poll failed");
                    self.sleep_poll_interval().await;
                }
            }
        }
        tracing::debug!("poll loop exited");
    }

    async fn observe_empty_poll(self: &Arc<Self>) {
        let completions_at_start = self.completions.load(Ordering::SeqCst);
        match self.api.dequeue().await {
            Ok(None) => {
                *self.last_empty_poll_saw.lock() = Some(completions_at_start);
                self.progress.notify_waiters();
            }
            Ok(Some(job)) => {
                // Draining: hand it back by abandoning the claim is not
                // possible; run it to completion instead.
                tracing::warn!(job = %job.job_id, "dequeued while draining; executing");
                self.spawn_job(job);
            }
            Err(err) => tracing::warn!(error = %err, "drain poll failed"),
        }
    }

    fn spawn_job(self: &Arc<Self>, job: bb_wire::RunnableJob) {
        self.running_jobs.fetch_add(1, Ordering::SeqCst);
        let me = Arc::clone(self);
        let task = JobTask {
            api: Arc::clone(&me.api),
            executor: Arc::clone(&me.executor),
            workdir: me.config.workdir.clone(),
            cancel: me.cancel_work.child_token(),
        };
        tokio::spawn(async move {
            let job_id = job.job_id;
            let succeeded = task.run(job).await;
            tracing::info!(job = %job_id, succeeded, "job finished");
            me.completions.fetch_add(1, Ordering::SeqCst);
            me.running_jobs.fetch_sub(1, Ordering::SeqCst);
            me.progress.notify_waiters();
        });
    }

    async fn sleep_poll_interval(&self) {
        tokio::select! {
            _ = tokio::time::sleep(self.config.poll_interval) => {},
            _ = self.cancel_loop.cancelled() => {},
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
