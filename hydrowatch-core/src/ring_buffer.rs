// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Fixed-capacity, insertion-ordered history.

use std::collections::VecDeque;
use std::num::NonZeroUsize;

/// A bounded FIFO sequence that evicts its oldest element when full.
///
/// Insertion order is the only order. Elements leave the buffer either by
/// eviction or by [`reset`](Self::reset).
///
/// # Example
///
/// ```
/// use hydrowatch_core::RingBuffer;
/// use std::num::NonZeroUsize;
///
/// let mut buffer = RingBuffer::new(NonZeroUsize::new(3).unwrap());
/// for v in 1..=5 {
///     buffer.append(v);
/// }
///
/// assert_eq!(buffer.snapshot(), vec![3, 4, 5]);
/// assert!(buffer.is_full());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RingBuffer<T> {
    items: VecDeque<T>,
    capacity: NonZeroUsize,
}

impl<T> RingBuffer<T> {
    /// Creates an empty buffer holding at most `capacity` elements.
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity.get()),
            capacity,
        }
    }

    /// Appends `value`, returning the evicted oldest element if the buffer was full.
    pub fn append(&mut self, value: T) -> Option<T> {
        let evicted = if self.items.len() == self.capacity.get() {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(value);
        evicted
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// `true` once `len() == capacity()`; stays true until [`reset`](Self::reset).
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.items.len() == self.capacity.get()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Most recently appended element.
    #[must_use]
    pub fn latest(&self) -> Option<&T> {
        self.items.back()
    }

    /// Oldest retained element.
    #[must_use]
    pub fn oldest(&self) -> Option<&T> {
        self.items.front()
    }

    /// Iterates from oldest to newest.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &T> + '_ {
        self.items.iter()
    }

    /// Removes every element. Capacity is unchanged.
    pub fn reset(&mut self) {
        self.items.clear();
    }
}

impl<T: Clone> RingBuffer<T> {
    /// Owned copy of the contents, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}
