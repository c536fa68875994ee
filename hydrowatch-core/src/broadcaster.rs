// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Hot, multi-subscriber fan-out.
//!
//! A [`Broadcaster`] delivers each published item to every live subscriber.
//!
//! ## Characteristics
//!
//! - **Hot**: late subscribers only receive items published after subscribing.
//! - **Non-blocking**: each subscriber has its own unbounded queue, so a slow or
//!   vanished subscriber never delays the publisher or the other subscribers.
//! - **Self-pruning**: subscribers whose stream was dropped are removed on the
//!   next publish.
//! - **Thread-safe**: cheap to clone; all clones share the same state.
//!
//! ## Example
//!
//! ```
//! use hydrowatch_core::Broadcaster;
//! use futures::StreamExt;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let broadcaster = Broadcaster::<u64>::new();
//! let mut stream = broadcaster.subscribe().unwrap();
//!
//! assert_eq!(broadcaster.publish(1).unwrap(), 1);
//! broadcaster.close();
//!
//! assert_eq!(stream.next().await, Some(1));
//! assert_eq!(stream.next().await, None);
//! # }
//! ```

use futures::channel::mpsc::{self, UnboundedSender};
use futures::Stream;
use hydrowatch_error::{HydroError, Result};
use parking_lot::Mutex;
use std::pin::Pin;
use std::sync::Arc;

/// Stream handed to each subscriber.
pub type BroadcastStream<T> = Pin<Box<dyn Stream<Item = T> + Send + 'static>>;

struct BroadcastState<T> {
    closed: bool,
    senders: Vec<UnboundedSender<T>>,
}

/// Fan-out of cloned items to every current subscriber.
pub struct Broadcaster<T: Clone + Send + 'static> {
    state: Arc<Mutex<BroadcastState<T>>>,
}

impl<T: Clone + Send + 'static> Broadcaster<T> {
    /// Creates an open broadcaster with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(BroadcastState {
                closed: false,
                senders: Vec::new(),
            })),
        }
    }

    /// Registers a subscriber.
    ///
    /// # Errors
    ///
    /// Returns [`HydroError::Closed`] after [`close`](Self::close).
    pub fn subscribe(&self) -> Result<BroadcastStream<T>> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(HydroError::Closed);
        }

        let (tx, rx) = mpsc::unbounded();
        state.senders.push(tx);
        Ok(Box::pin(rx))
    }

    /// Delivers `item` to every live subscriber, returning how many received it.
    ///
    /// A failed delivery only drops that subscriber.
    ///
    /// # Errors
    ///
    /// Returns [`HydroError::Closed`] after [`close`](Self::close).
    pub fn publish(&self, item: T) -> Result<usize> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(HydroError::Closed);
        }

        let before = state.senders.len();
        state
            .senders
            .retain(|tx| tx.unbounded_send(item.clone()).is_ok());
        let delivered = state.senders.len();

        if delivered < before {
            debug!("Pruned {} disconnected subscriber(s)", before - delivered);
        }
        Ok(delivered)
    }

    /// Ends every subscriber stream and rejects further use. Idempotent.
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        state.senders.clear();
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Number of registered subscribers.
    ///
    /// Updated lazily: dropped subscribers are removed on the next publish.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.state.lock().senders.len()
    }
}

impl<T: Clone + Send + 'static> Default for Broadcaster<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + 'static> Clone for Broadcaster<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}
