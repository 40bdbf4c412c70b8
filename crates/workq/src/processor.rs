// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The worker pool.
//!
//! Each worker fibre loops: allocate a ready item → run its handler
//! under the registered timeout → settle or release. Bookkeeping writes
//! retry with a bounded schedule because losing a handler's outcome is
//! worse than retrying the update.

use crate::backoff::Backoff;
use crate::registry::{HandlerOutcome, HandlerRegistry, Registration};
use bb_core::{Clock, WorkItem, WorkItemStatus};
use bb_storage::Database;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Minimum allocation lease, regardless of handler timeout.
const MIN_LEASE: Duration = Duration::from_secs(60);

/// Bounded retry for bookkeeping writes.
const RECORD_RETRY_ATTEMPTS: u32 = 60;
const RECORD_RETRY_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Clone)]
pub struct ProcessorConfig {
    /// Number of worker fibres.
    pub parallelism: usize,
    /// Sleep between polls when no item is ready.
    pub poll_interval: Duration,
    pub backoff: Backoff,
    /// Interval between bookkeeping retries (shortened in tests).
    pub record_retry_interval: Duration,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            parallelism: 4,
            poll_interval: Duration::from_secs(1),
            backoff: Backoff::default(),
            record_retry_interval: RECORD_RETRY_INTERVAL,
        }
    }
}

/// The work-queue engine: a registry plus a pool of polling workers.
pub struct Processor<C: Clock> {
    db: Database,
    registry: HandlerRegistry,
    config: ProcessorConfig,
    clock: C,
    processor_id: String,
    cancel: CancellationToken,
}

impl<C: Clock> Processor<C> {
    pub fn new(db: Database, registry: HandlerRegistry, config: ProcessorConfig, clock: C) -> Self {
        Self {
            db,
            registry,
            config,
            clock,
            processor_id: format!("workq-{}", std::process::id()),
            cancel: CancellationToken::new(),
        }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Queue a work item outside any transaction.
    pub async fn add_work_item(
        &self,
        item_type: &str,
        payload: &str,
        concurrency_key: Option<&str>,
    ) -> Result<WorkItem, bb_core::Error> {
        let mut tx = self.db.begin().await?;
        let item = bb_storage::work_items::add(
            &mut *tx,
            item_type,
            payload,
            concurrency_key,
            self.clock.epoch_ms(),
        )
        .await?;
        tx.commit()
            .await
            .map_err(|e| bb_core::Error::wrap(bb_core::ErrorCode::Internal, "commit", e))?;
        Ok(item)
    }

    /// Spawn the worker pool. Returns a cleanup handle that cancels the
    /// pool and waits for the fibres to drain.
    pub fn start(self: std::sync::Arc<Self>) -> ProcessorHandle {
        let mut workers = Vec::with_capacity(self.config.parallelism);
        for worker in 0..self.config.parallelism {
            let me = std::sync::Arc::clone(&self);
            workers.push(tokio::spawn(async move {
                me.worker_loop(worker).await;
            }));
        }
        ProcessorHandle { cancel: self.cancel.clone(), workers }
    }

    async fn worker_loop(&self, worker: usize) {
        tracing::debug!(worker, "work-queue worker started");
        loop {
            if self.cancel.is_cancelled() {
                break;
            }
            match self.run_once().await {
                Ok(true) => {}
                Ok(false) => {
                    tokio::select! {
                        _ = self.cancel.cancelled() => break,
                        _ = tokio::time::sleep(self.config.poll_interval) => {}
                    }
                }
                Err(err) => {
                    tracing::warn!(worker, error = %err, "work-queue poll failed");
                    tokio::select! {
                        _ = self.cancel.cancelled() => break,
                        _ = tokio::time::sleep(self.config.poll_interval) => {}
                    }
                }
            }
        }
        tracing::debug!(worker, "work-queue worker stopped");
    }

    /// One allocate-process-settle cycle. Returns whether an item was
    /// processed (false means the queue was empty).
    pub async fn run_once(&self) -> Result<bool, bb_core::Error> {
        let item_types = self.registry.item_types();
        if item_types.is_empty() {
            return Ok(false);
        }
        let now_ms = self.clock.epoch_ms();
        // The lease must cover the slowest registered handler: 2× its
        // timeout, floored at one minute, so a crash frees the item in
        // bounded time.
        let max_timeout = item_types
            .iter()
            .filter_map(|t| self.registry.get(t))
            .map(|r| r.timeout)
            .max()
            .unwrap_or(MIN_LEASE);
        let lease = (max_timeout * 2).max(MIN_LEASE);

        let mut tx = self.db.begin().await?;
        let allocated = bb_storage::work_items::allocate(
            &mut *tx,
            &item_types,
            &self.processor_id,
            now_ms,
            lease.as_millis() as i64,
        )
        .await?;
        tx.commit()
            .await
            .map_err(|e| bb_core::Error::wrap(bb_core::ErrorCode::Internal, "commit", e))?;
        let (item, state) = match allocated {
            Some(pair) => pair,
            None => return Ok(false),
        };
        let registration = match self.registry.get(&item.item_type) {
            Some(r) => r,
            None => {
                // Registry changed between the filter and here; put the
                // item back untouched.
                self.with_record_retry(|| {
                    let item = item.clone();
                    async move {
                        let mut tx = self.db.begin().await?;
                        bb_storage::work_items::release_for_retry(
                            &mut *tx,
                            &item,
                            self.clock.epoch_ms(),
                            Some("no handler registered"),
                            self.clock.epoch_ms(),
                        )
                        .await?;
                        tx.commit().await.map_err(|e| {
                            bb_core::Error::wrap(bb_core::ErrorCode::Internal, "commit", e)
                        })
                    }
                })
                .await?;
                return Ok(true);
            }
        };
        self.process(item, state.attempts_so_far, registration).await?;
        Ok(true)
    }

    async fn process(
        &self,
        item: WorkItem,
        attempts_so_far: i64,
        registration: Registration,
    ) -> Result<(), bb_core::Error> {
        tracing::debug!(item = %item.id, item_type = %item.item_type, attempts_so_far, "processing work item");
        let outcome =
            match tokio::time::timeout(registration.timeout, registration.handler.handle(&item))
                .await
            {
                Ok(outcome) => outcome,
                Err(_) => HandlerOutcome::Failure(crate::registry::HandlerError::retryable(
                    format!("handler timed out after {:?}", registration.timeout),
                )),
            };
        match outcome {
            HandlerOutcome::Success => {
                self.settle(&item, WorkItemStatus::Succeeded, None, registration.delete_when_settled)
                    .await
            }
            HandlerOutcome::Failure(err) if err.can_retry => {
                match self.config.backoff.not_before_ms(attempts_so_far, self.clock.epoch_ms()) {
                    Some(not_before_ms) => {
                        tracing::debug!(item = %item.id, not_before_ms, "retrying work item");
                        self.with_record_retry(|| {
                            let item = item.clone();
                            let message = err.message.clone();
                            async move {
                                let mut tx = self.db.begin().await?;
                                bb_storage::work_items::release_for_retry(
                                    &mut *tx,
                                    &item,
                                    not_before_ms,
                                    Some(&message),
                                    self.clock.epoch_ms(),
                                )
                                .await?;
                                tx.commit().await.map_err(|e| {
                                    bb_core::Error::wrap(bb_core::ErrorCode::Internal, "commit", e)
                                })
                            }
                        })
                        .await
                    }
                    // Backoff exhausted: permanent.
                    None => {
                        self.settle(
                            &item,
                            WorkItemStatus::Failed,
                            Some(&format!("retries exhausted: {}", err.message)),
                            registration.delete_when_settled,
                        )
                        .await
                    }
                }
            }
            HandlerOutcome::Failure(err) => {
                self.settle(
                    &item,
                    WorkItemStatus::Failed,
                    Some(&err.message),
                    registration.delete_when_settled,
                )
                .await
            }
        }
    }

    async fn settle(
        &self,
        item: &WorkItem,
        status: WorkItemStatus,
        detail: Option<&str>,
        delete: bool,
    ) -> Result<(), bb_core::Error> {
        tracing::debug!(item = %item.id, %status, "settling work item");
        self.with_record_retry(|| {
            let item = item.clone();
            let detail = detail.map(str::to_string);
            async move {
                let mut tx = self.db.begin().await?;
                bb_storage::work_items::settle(
                    &mut *tx,
                    &item,
                    status,
                    detail.as_deref(),
                    delete,
                    self.clock.epoch_ms(),
                )
                .await?;
                tx.commit()
                    .await
                    .map_err(|e| bb_core::Error::wrap(bb_core::ErrorCode::Internal, "commit", e))
            }
        })
        .await
    }

    /// Bounded retry for bookkeeping writes (~60 × 2s by default).
    async fn with_record_retry<F, Fut>(&self, mut op: F) -> Result<(), bb_core::Error>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<(), bb_core::Error>>,
    {
        let mut last = None;
        for attempt in 0..RECORD_RETRY_ATTEMPTS {
            match op().await {
                Ok(()) => return Ok(()),
                Err(err) => {
                    tracing::warn!(attempt, error = %err, "work-queue record update failed");
                    last = Some(err);
                    tokio::time::sleep(self.config.record_retry_interval).await;
                }
            }
        }
        Err(last.unwrap_or_else(|| bb_core::Error::internal("record retry exhausted")))
    }
}

/// Running pool handle. `stop()` cancels the fibres and waits for them.
pub struct ProcessorHandle {
    cancel: CancellationToken,
    workers: Vec<tokio::task::JoinHandle<()>>,
}

impl ProcessorHandle {
    pub async fn stop(self) {
        self.cancel.cancel();
        for worker in self.workers {
            let _ = worker.await;
        }
    }
}

#[cfg(test)]
#[path = "processor_tests.rs"]
mod tests;
