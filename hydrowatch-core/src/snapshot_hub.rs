// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! The read side: the latest published [`Snapshot`] and live updates.
//!
//! Request handlers call [`SnapshotHub::current`]; live viewers call
//! [`SnapshotHub::subscribe`]. Neither touches the mutable buffers.
//!
//! Publication is version-ordered. A snapshot whose version is not newer than
//! the installed one is discarded, so a reset that lands while a cycle is
//! still computing its stats cannot be overwritten by that cycle.

use crate::broadcaster::Broadcaster;
use crate::sensor::SensorId;
use crate::snapshot::Snapshot;
use futures::stream::{self, Stream, StreamExt};
use hydrowatch_error::Result;
use parking_lot::RwLock;
use serde::Serialize;
use std::pin::Pin;
use std::sync::Arc;

/// Why a snapshot was published.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "snapshot", rename_all = "camelCase")]
pub enum SnapshotEvent {
    /// The state at subscription time; always the first event of a stream.
    Current(Arc<Snapshot>),
    /// A sampling cycle finished.
    Cycle(Arc<Snapshot>),
    /// A sampling cycle was counted but its values were discarded by the gate.
    Skipped(Arc<Snapshot>),
    /// History was cleared.
    Reset(Arc<Snapshot>),
}

impl SnapshotEvent {
    #[must_use]
    pub fn snapshot(&self) -> &Arc<Snapshot> {
        match self {
            SnapshotEvent::Current(s)
            | SnapshotEvent::Cycle(s)
            | SnapshotEvent::Skipped(s)
            | SnapshotEvent::Reset(s) => s,
        }
    }

    /// Short name used as the SSE event type.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            SnapshotEvent::Current(_) => "current",
            SnapshotEvent::Cycle(_) => "cycle",
            SnapshotEvent::Skipped(_) => "skipped",
            SnapshotEvent::Reset(_) => "reset",
        }
    }
}

/// Stream of snapshot events handed to each subscriber.
pub type SnapshotStream = Pin<Box<dyn Stream<Item = SnapshotEvent> + Send + 'static>>;

/// Latest snapshot slot plus subscriber fan-out.
pub struct SnapshotHub {
    slot: RwLock<Arc<Snapshot>>,
    broadcaster: Broadcaster<SnapshotEvent>,
}

impl SnapshotHub {
    /// Creates a hub holding the empty snapshot for `sensors`.
    #[must_use]
    pub fn new(sensors: &[SensorId], capacity: usize) -> Self {
        Self::with_initial(Snapshot::empty(sensors, capacity))
    }

    #[must_use]
    pub fn with_initial(initial: Snapshot) -> Self {
        Self {
            slot: RwLock::new(Arc::new(initial)),
            broadcaster: Broadcaster::new(),
        }
    }

    /// The most recently installed snapshot.
    #[must_use]
    pub fn current(&self) -> Arc<Snapshot> {
        self.slot.read().clone()
    }

    /// Installs and broadcasts a cycle snapshot. Returns `false` if it was stale.
    pub fn publish_cycle(&self, snapshot: Snapshot) -> bool {
        self.publish_with(snapshot, SnapshotEvent::Cycle)
    }

    /// Installs and broadcasts the snapshot of a gated-out cycle. Returns `false` if it was stale.
    pub fn publish_skip(&self, snapshot: Snapshot) -> bool {
        self.publish_with(snapshot, SnapshotEvent::Skipped)
    }

    /// Installs and broadcasts a reset snapshot. Returns `false` if it was stale.
    pub fn publish_reset(&self, snapshot: Snapshot) -> bool {
        self.publish_with(snapshot, SnapshotEvent::Reset)
    }

    fn publish_with(&self, snapshot: Snapshot, wrap: fn(Arc<Snapshot>) -> SnapshotEvent) -> bool {
        let mut slot = self.slot.write();
        if snapshot.version <= slot.version {
            debug!(
                "Discarding stale snapshot v{} (installed v{})",
                snapshot.version, slot.version
            );
            return false;
        }

        let snapshot = Arc::new(snapshot);
        *slot = snapshot.clone();

        // Still under the write lock: a concurrent subscribe sees either the old
        // snapshot followed by this event, or this snapshot and no event.
        if let Err(err) = self.broadcaster.publish(wrap(snapshot)) {
            debug!("Snapshot installed but not broadcast: {}", err);
        }
        true
    }

    /// Live updates, starting with the current snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`HydroError::Closed`](hydrowatch_error::HydroError::Closed) after [`close`](Self::close).
    pub fn subscribe(&self) -> Result<SnapshotStream> {
        let slot = self.slot.read();
        let updates = self.broadcaster.subscribe()?;
        let first = SnapshotEvent::Current(slot.clone());
        drop(slot);

        Ok(Box::pin(stream::once(async move { first }).chain(updates)))
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.broadcaster.subscriber_count()
    }

    /// Ends every live stream. `current()` keeps working.
    pub fn close(&self) {
        self.broadcaster.close();
    }
}
