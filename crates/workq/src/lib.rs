// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! bb-workq: the durable, leased, backed-off work-queue engine.
//!
//! Side effects (identity cleanup, purges, sync jobs) are queued as
//! [`WorkItem`](bb_core::WorkItem)s and processed by a fixed pool of
//! worker fibres. Allocation writes a lease on the item's shared state
//! row; items with one concurrency key serialise on that row. Delivery
//! is at-least-once (a crashed worker's lease expires and the item
//! recycles), so handlers must be idempotent.

pub mod backoff;
pub mod processor;
pub mod registry;

pub use backoff::Backoff;
pub use processor::{Processor, ProcessorConfig};
pub use registry::{HandlerError, HandlerOutcome, HandlerRegistry, Registration, WorkHandler};
