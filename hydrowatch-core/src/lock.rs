// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Deadline-bounded locking for the consistency boundary.
//!
//! `parking_lot` mutexes never poison, so the only way to fail is to wait too
//! long. A failed acquisition is reported as [`HydroError::Consistency`], which
//! callers treat as transient.

use hydrowatch_error::{HydroError, Result, ResultExt};
use parking_lot::{Mutex, MutexGuard};
use std::time::Duration;

/// Default time a writer or reader waits for the buffer lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(500);

/// Acquire `mutex`, giving up after `timeout`.
///
/// # Arguments
///
/// * `mutex` - The mutex guarding shared state
/// * `timeout` - Longest time to wait
/// * `context` - What the caller is doing (for error messages)
///
/// # Errors
///
/// Returns [`HydroError::Consistency`] if the lock is not acquired in time.
///
/// # Example
///
/// ```
/// use hydrowatch_core::lock::lock_within;
/// use parking_lot::Mutex;
/// use std::time::Duration;
///
/// let state = Mutex::new(42);
/// let guard = lock_within(&state, Duration::from_millis(10), "counter").unwrap();
/// assert_eq!(*guard, 42);
/// ```
pub fn lock_within<'a, T>(
    mutex: &'a Mutex<T>,
    timeout: Duration,
    context: &str,
) -> Result<MutexGuard<'a, T>> {
    mutex
        .try_lock_for(timeout)
        .ok_or_else(|| {
            warn!("Timed out after {:?} waiting for lock: {}", timeout, context);
            HydroError::consistency(format!("lock not acquired within {timeout:?}"))
        })
        .context(context)
}
