//! Insertion Order Module
//!
//! Tracks write order so bounded stores can drop their oldest entries first.

use std::collections::VecDeque;

// == Insertion Order ==
/// Tracks keys by the time they were last written.
///
/// Keys are stored in a VecDeque where:
/// - Front = Most recently written
/// - Back = Oldest
#[derive(Debug, Default)]
pub struct InsertionOrder {
    order: VecDeque<String>,
}

impl InsertionOrder {
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    // == Touch ==
    /// Marks a key as newest, moving it to the front if already tracked.
    pub fn touch(&mut self, key: &str) {
        self.remove(key);
        self.order.push_front(key.to_string());
    }

    // == Remove ==
    pub fn remove(&mut self, key: &str) {
        self.order.retain(|k| k != key);
    }

    // == Pop Oldest ==
    /// Returns and removes the oldest key, or None if nothing is tracked.
    pub fn pop_oldest(&mut self) -> Option<String> {
        self.order.pop_back()
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
