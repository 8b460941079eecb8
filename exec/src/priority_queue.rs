//! A thread-safe priority queue.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Jobs ordered by [`Ord`], greatest first. Jobs that compare equal keep
/// their insertion order.
///
/// All methods take `&self`; share the queue behind an `Arc`.
///
/// # Examples
///
/// ```
/// use gblibx_exec::PriorityQueue;
///
/// let queue = PriorityQueue::new();
/// queue.insert_all([1, 5, 3]);
/// assert_eq!(queue.pop(), Some(5));
/// assert_eq!(queue.peek(), Some(3));
/// assert_eq!(queue.len(), 2);
/// ```
#[derive(Debug)]
pub struct PriorityQueue<T> {
    jobs: Mutex<VecDeque<T>>,
}

impl<T: Ord> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord> PriorityQueue<T> {
    pub fn new() -> Self {
        Self {
            jobs: Mutex::new(VecDeque::new()),
        }
    }

    fn jobs(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts `job` ahead of the first queued job it is greater than.
    pub fn insert(&self, job: T) -> &Self {
        let mut jobs = self.jobs();
        let at = jobs.iter().position(|queued| job > *queued).unwrap_or(jobs.len());
        jobs.insert(at, job);
        self
    }

    pub fn insert_all(&self, jobs: impl IntoIterator<Item = T>) -> &Self {
        for job in jobs {
            self.insert(job);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.jobs().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs().is_empty()
    }

    /// Copy of the head of the queue.
    pub fn peek(&self) -> Option<T>
    where
        T: Clone,
    {
        self.jobs().front().cloned()
    }

    /// Removes and returns the head of the queue.
    pub fn pop(&self) -> Option<T> {
        self.jobs().pop_front()
    }
}
