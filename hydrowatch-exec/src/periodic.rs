// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Background task that runs a job on a fixed period.
//!
//! The job is awaited to completion before the next tick is considered, and
//! ticks that fall due while it runs are dropped
//! ([`MissedTickBehavior::Skip`]), so iterations never overlap.
//!
//! # Example
//!
//! ```rust
//! use hydrowatch_exec::PeriodicTask;
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let runs = Arc::new(AtomicU32::new(0));
//! let counter = runs.clone();
//!
//! let task = PeriodicTask::spawn("counter", Duration::from_millis(10), move || {
//!     let counter = counter.clone();
//!     async move {
//!         counter.fetch_add(1, Ordering::SeqCst);
//!     }
//! });
//!
//! tokio::time::sleep(Duration::from_millis(35)).await;
//! assert!(task.stop(Duration::from_secs(1)).await);
//! assert!(runs.load(Ordering::SeqCst) >= 1);
//! # }
//! ```

use hydrowatch_core::{debug, info, warn};
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Handle to a running periodic job. Dropping it requests cancellation.
#[derive(Debug)]
pub struct PeriodicTask {
    name: &'static str,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicTask {
    /// Starts running `job` every `period`; the first run is immediate.
    pub fn spawn<F, Fut>(name: &'static str, period: Duration, job: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self::spawn_with_token(name, period, CancellationToken::new(), job)
    }

    /// Like [`spawn`](Self::spawn), stopping also when `cancel` (or a parent of it) fires.
    pub fn spawn_with_token<F, Fut>(
        name: &'static str,
        period: Duration,
        cancel: CancellationToken,
        mut job: F,
    ) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            debug!("{} started with period {:?}", name, period);

            loop {
                tokio::select! {
                    biased;
                    () = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                // Not raced against the token: an in-flight iteration is given
                // the grace period in `stop` instead.
                job().await;
            }
            debug!("{} stopped", name);
        });

        Self {
            name,
            cancel,
            handle: Some(handle),
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Token that stops this task when cancelled.
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Requests cancellation and waits up to `grace` for the job in flight.
    ///
    /// Returns `true` on a clean stop, `false` if the task had to be aborted.
    pub async fn stop(mut self, grace: Duration) -> bool {
        self.cancel.cancel();
        let Some(mut handle) = self.handle.take() else {
            return true;
        };

        match tokio::time::timeout(grace, &mut handle).await {
            Ok(Ok(())) => {
                info!("{} stopped", self.name);
                true
            }
            Ok(Err(join_err)) => {
                warn!("{} ended abnormally: {}", self.name, join_err);
                false
            }
            Err(_) => {
                warn!("{} did not stop within {:?}; aborting", self.name, grace);
                handle.abort();
                false
            }
        }
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
