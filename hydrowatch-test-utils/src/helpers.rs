// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use futures::{Stream, StreamExt};
use hydrowatch_core::{SnapshotEvent, SnapshotStream};
use std::time::Duration;
use tokio::time::timeout;

/// Next item of `stream`, or `None` if nothing arrives within `timeout_ms`.
pub async fn recv_timeout<S>(stream: &mut S, timeout_ms: u64) -> Option<S::Item>
where
    S: Stream + Unpin,
{
    timeout(Duration::from_millis(timeout_ms), stream.next())
        .await
        .ok()
        .flatten()
}

/// Panics if `stream` yields within `timeout_ms`.
pub async fn assert_no_recv<S>(stream: &mut S, timeout_ms: u64)
where
    S: Stream + Unpin,
    S::Item: std::fmt::Debug,
{
    if let Ok(Some(item)) = timeout(Duration::from_millis(timeout_ms), stream.next()).await {
        panic!("Unexpected item emitted, expected no output: {item:?}");
    }
}

/// Next snapshot event, panicking if none arrives within `timeout_ms`.
pub async fn next_event(stream: &mut SnapshotStream, timeout_ms: u64) -> SnapshotEvent {
    recv_timeout(stream, timeout_ms)
        .await
        .expect("expected a snapshot event")
}
