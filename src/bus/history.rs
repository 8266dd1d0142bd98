use std::collections::VecDeque;

/// Append-only log that keeps the `capacity` most recent entries.
///
/// Pushing past capacity evicts the oldest entry first.
#[derive(Debug, Clone)]
pub struct BoundedHistory<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedHistory<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Append `entry`, returning the evicted entry if the log was full.
    pub fn push(&mut self, entry: T) -> Option<T> {
        if self.capacity == 0 {
            return Some(entry);
        }
        let evicted = if self.entries.len() == self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(entry);
        evicted
    }

    /// Entries, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&T> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<T: Clone> BoundedHistory<T> {
    /// Entries, oldest first.
    pub fn to_vec(&self) -> Vec<T> {
        self.entries.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_most_recent_entries() {
        let mut history = BoundedHistory::with_capacity(100);
        for i in 0..250 {
            history.push(i);
        }

        assert_eq!(history.len(), 100);
        assert_eq!(history.iter().next(), Some(&150));
        assert_eq!(history.latest(), Some(&249));
        assert_eq!(history.to_vec(), (150..250).collect::<Vec<_>>());
    }

    #[test]
    fn push_reports_eviction() {
        let mut history = BoundedHistory::with_capacity(2);
        assert_eq!(history.push("a"), None);
        assert_eq!(history.push("b"), None);
        assert_eq!(history.push("c"), Some("a"));
        assert_eq!(history.to_vec(), vec!["b", "c"]);
    }

    #[test]
    fn zero_capacity_keeps_nothing() {
        let mut history = BoundedHistory::with_capacity(0);
        assert_eq!(history.push(1), Some(1));
        assert!(history.is_empty());
    }
}
