// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Work-queue handlers for the engine's side effects.

use bb_core::{BuildId, WorkItem};
use bb_storage::Database;
use bb_workq::{HandlerError, HandlerOutcome, HandlerRegistry, Registration, WorkHandler};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Item type: delete a terminal build's dynamic identity.
pub const DELETE_DYNAMIC_IDENTITY: &str = "delete-dynamic-identity";

#[derive(Deserialize)]
struct DeleteDynamicIdentityPayload {
    build_id: String,
}

/// Deletes the dynamic identity of a build that reached a terminal
/// status. Idempotent: a missing identity is success.
struct DeleteDynamicIdentityHandler {
    db: Database,
}

#[async_trait::async_trait]
impl WorkHandler for DeleteDynamicIdentityHandler {
    async fn handle(&self, item: &WorkItem) -> HandlerOutcome {
        let payload: DeleteDynamicIdentityPayload = match serde_json::from_str(&item.payload) {
            Ok(payload) => payload,
            Err(err) => {
                return HandlerOutcome::Failure(HandlerError::permanent(format!(
                    "malformed payload: {err}"
                )))
            }
        };
        let build_id = BuildId::from_string(&payload.build_id);
        let result = async {
            let mut tx = self.db.begin().await?;
            bb_auth::dynamic::delete_build_identity(&mut *tx, &build_id).await?;
            tx.commit()
                .await
                .map_err(|e| bb_core::Error::wrap(bb_core::ErrorCode::Internal, "commit", e))
        }
        .await;
        match result {
            Ok(()) => HandlerOutcome::Success,
            Err(err) => HandlerOutcome::Failure(HandlerError::retryable(err.to_string())),
        }
    }
}

/// Register the engine's side-effect handlers on a work-queue registry.
pub fn register_handlers(registry: &HandlerRegistry, db: Database) {
    registry.register(Registration {
        item_type: DELETE_DYNAMIC_IDENTITY.to_string(),
        timeout: Duration::from_secs(30),
        delete_when_settled: true,
        handler: Arc::new(DeleteDynamicIdentityHandler { db }),
    });
}
