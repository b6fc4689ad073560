//! A bounded FIFO that carries iterables rather than items.
//!
//! `put` extends the internal deque; `get` atomically swaps in a fresh, empty deque
//! and returns whatever had accumulated. Every inter-stage transfer in the pipeline
//! (receiver -> decoder -> writer, and the buffer-return path back to the receiver)
//! goes through one of these. Compared to a per-item channel this halves the number
//! of lock acquisitions in exchange for looser ordering guarantees within a batch,
//! which the pipeline doesn't need: only cross-batch order matters, and that is
//! preserved because `get` drains everything accumulated so far in one shot.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

pub struct BatchQueue<T> {
    deque: Mutex<VecDeque<T>>,
    not_empty: Condvar,
}

impl<T> Default for BatchQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> BatchQueue<T> {
    pub fn new() -> Self {
        BatchQueue { deque: Mutex::new(VecDeque::new()), not_empty: Condvar::new() }
    }

    /// Extends the queue with every item of `items`. May push the queue's length
    /// past any nominal capacity by one batch; this primitive has no backpressure.
    pub fn put<I: IntoIterator<Item = T>>(&self, items: I) {
        let mut guard = self.deque.lock().unwrap();
        let before = guard.len();
        guard.extend(items);
        if guard.len() > before {
            self.not_empty.notify_one();
        }
    }

    pub fn put_one(&self, item: T) {
        self.put(std::iter::once(item));
    }

    /// Blocks until at least one item is present, then detaches and returns the
    /// entire internal deque, leaving the queue empty.
    pub fn get(&self) -> VecDeque<T> {
        let mut guard = self.deque.lock().unwrap();
        while guard.is_empty() {
            guard = self.not_empty.wait(guard).unwrap();
        }
        std::mem::take(&mut *guard)
    }

    /// Like `get`, but gives up and returns an empty deque if nothing arrives
    /// within `timeout`. Used by the decoder on its Q1 read: it computes the
    /// timeout from how long its oldest buffered Q2 output has been waiting and
    /// wakes up exactly when that accumulator's age threshold would elapse.
    pub fn get_timeout(&self, timeout: Duration) -> VecDeque<T> {
        let deadline = Instant::now() + timeout;
        let mut guard = self.deque.lock().unwrap();
        while guard.is_empty() {
            let now = Instant::now();
            if now >= deadline {
                return VecDeque::new();
            }
            let (g, timeout_result) = self.not_empty.wait_timeout(guard, deadline - now).unwrap();
            guard = g;
            if timeout_result.timed_out() && guard.is_empty() {
                return VecDeque::new();
            }
        }
        std::mem::take(&mut *guard)
    }

    /// Non-blocking variant used by the receiver's opportunistic flush path.
    pub fn try_get(&self) -> VecDeque<T> {
        let mut guard = self.deque.lock().unwrap();
        std::mem::take(&mut *guard)
    }

    pub fn len(&self) -> usize {
        self.deque.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
