// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use hydrowatch_core::RingBuffer;
use std::num::NonZeroUsize;

fn buffer(capacity: usize) -> RingBuffer<f64> {
    RingBuffer::new(NonZeroUsize::new(capacity).unwrap())
}

#[test]
fn test_new_buffer_is_empty() {
    let buffer = buffer(5);
    assert!(buffer.is_empty());
    assert!(!buffer.is_full());
    assert_eq!(buffer.capacity(), 5);
    assert_eq!(buffer.latest(), None);
}

#[test]
fn test_length_never_exceeds_capacity() {
    let mut buffer = buffer(7);
    for i in 0..100 {
        buffer.append(f64::from(i));
        assert!(buffer.len() <= buffer.capacity());
    }
    assert_eq!(buffer.len(), 7);
}

#[test]
fn test_keeps_last_capacity_values_in_order() {
    let mut buffer = buffer(4);
    for i in 1..=10 {
        buffer.append(f64::from(i));
    }

    assert_eq!(buffer.snapshot(), vec![7.0, 8.0, 9.0, 10.0]);
    assert_eq!(buffer.oldest(), Some(&7.0));
    assert_eq!(buffer.latest(), Some(&10.0));
}

#[test]
fn test_exactly_capacity_appends_fills_without_eviction() {
    let mut buffer = buffer(3);
    assert_eq!(buffer.append(1.0), None);
    assert_eq!(buffer.append(2.0), None);
    assert_eq!(buffer.append(3.0), None);

    assert!(buffer.is_full());
    assert_eq!(buffer.snapshot(), vec![1.0, 2.0, 3.0]);
}

#[test]
fn test_append_when_full_returns_evicted_oldest() {
    let mut buffer = buffer(2);
    buffer.append(1.0);
    buffer.append(2.0);

    assert_eq!(buffer.append(3.0), Some(1.0));
    assert_eq!(buffer.append(4.0), Some(2.0));
}

#[test]
fn test_snapshot_is_independent_copy() {
    let mut buffer = buffer(3);
    buffer.append(1.0);
    let before = buffer.snapshot();

    buffer.append(2.0);

    assert_eq!(before, vec![1.0]);
    assert_eq!(buffer.snapshot(), vec![1.0, 2.0]);
}

#[test]
fn test_reset_empties_and_keeps_capacity() {
    let mut buffer = buffer(3);
    buffer.append(1.0);
    buffer.append(2.0);
    buffer.append(3.0);

    buffer.reset();
    buffer.reset();

    assert!(buffer.is_empty());
    assert_eq!(buffer.capacity(), 3);
    buffer.append(9.0);
    assert_eq!(buffer.snapshot(), vec![9.0]);
}

#[test]
fn test_capacity_one_always_holds_latest() {
    let mut buffer = buffer(1);
    for v in [5.0, 6.0, 7.0] {
        buffer.append(v);
        assert_eq!(buffer.snapshot(), vec![v]);
    }
}
