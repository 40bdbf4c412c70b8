// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! bb-storage: the relational store behind the build-execution core.
//!
//! One SQLite database holds every entity; all cross-actor coordination
//! happens through its transactions. Table modules expose free functions
//! over a `&mut SqliteConnection` so they compose inside a caller's
//! transaction, the Rust rendition of a nestable `WithTx`: whoever holds
//! the transaction passes it down, and only the opener commits.

pub mod artifacts;
pub mod builds;
pub mod credentials;
pub mod cursor;
pub mod db;
pub mod dialect;
pub mod error;
pub mod events;
pub mod grants;
pub mod groups;
pub mod identities;
pub mod job_dependencies;
pub mod jobs;
pub mod json;
pub mod legal_entities;
pub mod logs;
pub mod memberships;
pub mod ownerships;
pub mod repos;
pub mod resource_links;
pub mod rows;
pub mod runners;
pub mod secrets;
pub mod steps;
pub mod work_items;

pub use cursor::{Cursor, Direction, Page};
pub use db::{Database, Tx};
pub use dialect::Dialect;
pub use error::{map_sqlx, StoreResult};
pub use jobs::DequeueFilter;

#[cfg(test)]
pub(crate) mod test_db;
