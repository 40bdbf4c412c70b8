// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Path lookups: the human-readable side of resource links.
//!
//! Every mutation upserts a `acme/website/builds/42`-style link; these
//! operations are the read side the search surface sits on.

use crate::engine::Engine;
use bb_core::{parse_fqn, Clock, Error, ErrorCode, ResourceLink, Result};

impl<C: Clock> Engine<C> {
    /// Resolve a human-readable path to the resource ID behind it. The
    /// path must satisfy the fully-qualified-name grammar; unknown paths
    /// are `NotFound`.
    pub async fn resolve_path(&self, path: &str) -> Result<String> {
        parse_fqn(path)
            .map_err(|e| Error::new(ErrorCode::InvalidQueryParameter, e.to_string()))?;
        let mut tx = self.db.begin().await?;
        let resource_id = bb_storage::resource_links::resolve(&mut *tx, path).await?;
        Ok(resource_id)
    }

    /// The paths registered for a resource: the reverse of
    /// [`resolve_path`](Self::resolve_path).
    pub async fn paths_for_resource(&self, resource_id: &str) -> Result<Vec<ResourceLink>> {
        let mut tx = self.db.begin().await?;
        let links =
            bb_storage::resource_links::read_for_resource(&mut *tx, resource_id).await?;
        Ok(links)
    }
}

#[cfg(test)]
#[path = "search_tests.rs"]
mod tests;
