//! Bounded memory of delivered message hashes.

use std::collections::{HashSet, VecDeque};

use peerlink_core::Sha256Hash;

/// Remembers the last `capacity` delivered message hashes.
///
/// A peer that resends a message it never saw confirmed gets a fresh
/// confirmation, but the message is surfaced only once.
#[derive(Debug)]
pub struct DeliveredHistory {
    capacity: usize,
    seen: HashSet<Sha256Hash>,
    order: VecDeque<Sha256Hash>,
}

impl DeliveredHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            seen: HashSet::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
        }
    }

    /// Record `hash`. Returns `true` if it was not already remembered.
    pub fn insert(&mut self, hash: Sha256Hash) -> bool {
        if self.capacity == 0 {
            return true;
        }
        if !self.seen.insert(hash) {
            return false;
        }
        self.order.push_back(hash);
        if self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        true
    }

    pub fn contains(&self, hash: &Sha256Hash) -> bool {
        self.seen.contains(hash)
    }

    pub fn clear(&mut self) {
        self.seen.clear();
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_is_rejected() {
        let mut history = DeliveredHistory::new(4);
        let h = Sha256Hash::hash(b"a");
        assert!(history.insert(h));
        assert!(!history.insert(h));
        assert!(history.contains(&h));
    }

    #[test]
    fn test_oldest_is_forgotten() {
        let mut history = DeliveredHistory::new(2);
        let a = Sha256Hash::hash(b"a");
        let b = Sha256Hash::hash(b"b");
        let c = Sha256Hash::hash(b"c");
        history.insert(a);
        history.insert(b);
        history.insert(c);
        assert!(!history.contains(&a));
        assert!(history.contains(&b));
        assert!(history.insert(a));
    }

    #[test]
    fn test_zero_capacity_disables() {
        let mut history = DeliveredHistory::new(0);
        let h = Sha256Hash::hash(b"a");
        assert!(history.insert(h));
        assert!(history.insert(h));
        assert!(!history.contains(&h));
    }
}
