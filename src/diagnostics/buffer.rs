// SPDX-License-Identifier: MPL-2.0
//! Circular buffer backing each log category.
//!
//! This module provides a memory-bounded ring buffer that automatically
//! evicts the oldest entries when capacity is reached.

use std::collections::VecDeque;

pub use crate::domain::diagnostics::BufferCapacity;

/// A generic circular buffer with fixed capacity.
///
/// When the buffer is full, pushing a new element evicts the oldest one
/// before the new element is stored, so the length never exceeds the
/// capacity. Elements are stored in insertion order (oldest first).
///
/// # Example
///
/// ```
/// use diaglog::diagnostics::{BufferCapacity, CircularBuffer};
///
/// let mut buffer: CircularBuffer<u32> = CircularBuffer::new(BufferCapacity::new(10));
///
/// for i in 1..=12 {
///     buffer.push(i);
/// }
///
/// assert_eq!(buffer.len(), 10);
/// assert_eq!(buffer.snapshot().first(), Some(&3));
/// ```
#[derive(Debug, Clone)]
pub struct CircularBuffer<T> {
    data: VecDeque<T>,
    capacity: usize,
}

impl<T> CircularBuffer<T> {
    /// Creates a new circular buffer with the specified capacity.
    #[must_use]
    pub fn new(capacity: BufferCapacity) -> Self {
        Self::with_raw_capacity(capacity.value())
    }

    /// Creates a new circular buffer with a raw capacity value.
    ///
    /// This bypasses the [`BufferCapacity`] bounds and is meant for small
    /// internal buffers and tests.
    #[must_use]
    pub fn with_raw_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            data: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Pushes an element, evicting and returning the oldest if at capacity.
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.data.len() >= self.capacity {
            self.data.pop_front()
        } else {
            None
        };
        self.data.push_back(item);
        evicted
    }

    /// Returns an iterator over the elements in insertion order (oldest first).
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.data.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Clears all elements from the buffer. Capacity is unchanged.
    pub fn clear(&mut self) {
        self.data.clear();
    }
}

impl<T: Clone> CircularBuffer<T> {
    /// Copies the current contents, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<T> {
        self.data.iter().cloned().collect()
    }
}
