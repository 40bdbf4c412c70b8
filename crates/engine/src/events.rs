// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event publication and fetch.

use crate::engine::Engine;
use bb_core::{BuildId, Clock, Event, EventId, EventType, ResourceName, Result, SequenceNumber};
use sqlx::SqliteConnection;

/// Upper bound on one fetch page.
const MAX_FETCH_LIMIT: i64 = 1_000;

/// The variable parts of an event being published.
pub(crate) struct Publish<'a> {
    pub event_type: EventType,
    pub resource_id: &'a str,
    pub workflow: Option<&'a ResourceName>,
    pub job_name: Option<&'a ResourceName>,
    pub resource_name: Option<&'a ResourceName>,
    pub payload: String,
}

impl<C: Clock> Engine<C> {
    /// Publish an event inside the caller's transaction. The sequence
    /// number comes from the build's counter row, incremented in the
    /// same transaction; that is the whole ordering guarantee.
    pub(crate) async fn publish_event(
        &self,
        conn: &mut SqliteConnection,
        build_id: &BuildId,
        publish: Publish<'_>,
    ) -> Result<Event> {
        let sequence_number = bb_storage::events::next_sequence_number(conn, build_id).await?;
        let event = Event {
            id: EventId::generate(),
            created_at_ms: self.now_ms(),
            build_id: *build_id,
            sequence_number,
            event_type: publish.event_type,
            resource_id: publish.resource_id.to_string(),
            workflow: publish.workflow.cloned(),
            job_name: publish.job_name.cloned(),
            resource_name: publish.resource_name.cloned(),
            payload: publish.payload,
        };
        bb_storage::events::create(conn, &event).await?;
        tracing::debug!(
            build = %build_id,
            sequence_number,
            event_type = %event.event_type,
            "published event"
        );
        Ok(event)
    }

    /// Events with `sequence_number > after`, ascending, at most
    /// `limit`. Non-blocking; long polling is repeated calls at the
    /// transport.
    pub async fn fetch_events(
        &self,
        build_id: &BuildId,
        after: SequenceNumber,
        limit: i64,
    ) -> Result<Vec<Event>> {
        let limit = bb_core::validate::page_limit(limit, MAX_FETCH_LIMIT)?;
        let mut tx = self.db.begin().await?;
        // Existence check so an unknown build is NotFound, not empty.
        bb_storage::builds::read(&mut *tx, build_id).await?;
        let events = bb_storage::events::fetch(&mut *tx, build_id, after, limit).await?;
        Ok(events)
    }
}

pub(crate) fn status_payload(status: impl std::fmt::Display) -> String {
    status.to_string()
}
