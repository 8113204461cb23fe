use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// Shared pool of pending capture targets.
///
/// Loaded once before dispatch and only ever drained afterwards: each item is
/// handed to exactly one caller, and once `take` has reported empty it stays
/// empty for every future caller.
pub struct WorkQueue {
    items: Mutex<VecDeque<String>>,
}

impl WorkQueue {
    pub fn new(items: impl IntoIterator<Item = String>) -> Self {
        Self {
            items: Mutex::new(items.into_iter().collect()),
        }
    }

    /// Non-blocking take; `None` means the queue is exhausted for good.
    pub fn take(&self) -> Option<String> {
        // A panic while holding the lock cannot leave the deque half-mutated,
        // so a poisoned lock is still safe to drain.
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    pub fn len(&self) -> usize {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::mpsc::channel;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_take_returns_each_item_once() {
        let queue = WorkQueue::new(["a", "b", "c"].map(String::from));
        let mut seen = Vec::new();
        while let Some(item) = queue.take() {
            seen.push(item);
        }
        seen.sort();
        assert_eq!(seen, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_empty_is_terminal() {
        let queue = WorkQueue::new(vec!["only".to_string()]);
        assert!(queue.take().is_some());
        for _ in 0..10 {
            assert!(queue.take().is_none());
        }
    }

    #[test]
    fn test_concurrent_takers_see_exactly_once_delivery() {
        let total = 1000;
        let items: Vec<String> = (0..total).map(|i| format!("item-{i}")).collect();
        let queue = Arc::new(WorkQueue::new(items.clone()));
        let (tx, rx) = channel();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let queue = Arc::clone(&queue);
            let tx = tx.clone();
            handles.push(thread::spawn(move || {
                while let Some(item) = queue.take() {
                    tx.send(item).unwrap();
                }
            }));
        }
        drop(tx);

        let taken: Vec<String> = rx.iter().collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(taken.len(), total);
        let unique: HashSet<&String> = taken.iter().collect();
        assert_eq!(unique.len(), total);
        assert_eq!(unique, items.iter().collect());
        assert!(queue.take().is_none());
    }
}
