// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Handler registry.
//!
//! Handlers classify their own failures into retryable vs permanent;
//! the engine never inspects error contents.

use bb_core::WorkItem;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// How a handler invocation ended.
#[derive(Debug)]
pub enum HandlerOutcome {
    Success,
    Failure(HandlerError),
}

/// A handler failure, classified by the handler itself.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct HandlerError {
    pub message: String,
    pub can_retry: bool,
}

impl HandlerError {
    pub fn retryable(message: impl Into<String>) -> Self {
        Self { message: message.into(), can_retry: true }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self { message: message.into(), can_retry: false }
    }
}

/// A work-item handler. Invoked with a context deadline equal to the
/// registered timeout; must be idempotent (at-least-once delivery).
#[async_trait::async_trait]
pub trait WorkHandler: Send + Sync + 'static {
    async fn handle(&self, item: &WorkItem) -> HandlerOutcome;
}

/// Registration facts for one item type.
#[derive(Clone)]
pub struct Registration {
    pub item_type: String,
    pub timeout: Duration,
    /// Delete the item on settlement instead of keeping it with its
    /// outcome recorded.
    pub delete_when_settled: bool,
    pub handler: Arc<dyn WorkHandler>,
}

/// Process-wide handler registry. Initialised once during startup
/// wiring; reads dominate, so an RW lock guards it.
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    inner: Arc<RwLock<HashMap<String, Registration>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, registration: Registration) {
        let mut map = self.inner.write();
        tracing::debug!(item_type = %registration.item_type, "registered work handler");
        map.insert(registration.item_type.clone(), registration);
    }

    pub fn get(&self, item_type: &str) -> Option<Registration> {
        self.inner.read().get(item_type).cloned()
    }

    /// Item types with a registered handler; the allocation filter.
    pub fn item_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.inner.read().keys().cloned().collect();
        types.sort();
        types
    }
}
