//! Batching of work items on a one-shot timer.
//!
//! The first [`PeriodicWork::add`] after an idle period starts a timer
//! thread. When the period elapses everything accumulated so far is handed
//! to the consumer as one batch and the timer stops; the next `add` arms a
//! new one.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use tracing::debug;

type Consumer<T> = dyn Fn(Vec<T>) + Send + Sync + 'static;

struct State<T> {
    work: Vec<T>,
    timer_running: bool,
}

struct Shared<T> {
    state: Mutex<State<T>>,
    consumer: Box<Consumer<T>>,
    period: Duration,
}

impl<T> Shared<T> {
    fn state(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Accumulates items and delivers them in batches at most once per period.
///
/// # Examples
///
/// ```
/// use std::sync::mpsc;
/// use std::time::Duration;
/// use gblibx_exec::PeriodicWork;
///
/// let (tx, rx) = mpsc::channel();
/// let work = PeriodicWork::new(Duration::from_millis(20), move |batch: Vec<u32>| {
///     tx.send(batch).unwrap();
/// });
/// assert_eq!(work.add([1, 2]), 2);
/// assert_eq!(work.add([3]), 3);
/// assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), vec![1, 2, 3]);
/// ```
pub struct PeriodicWork<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Send + 'static> PeriodicWork<T> {
    pub fn new<F>(period: Duration, consumer: F) -> Self
    where
        F: Fn(Vec<T>) + Send + Sync + 'static,
    {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    work: Vec::new(),
                    timer_running: false,
                }),
                consumer: Box::new(consumer),
                period,
            }),
        }
    }

    /// Queues `items`, arming the timer if it is idle. Returns the number of
    /// pending items.
    pub fn add(&self, items: impl IntoIterator<Item = T>) -> usize {
        let mut state = self.shared.state();
        state.work.extend(items);
        if !state.timer_running && !state.work.is_empty() {
            state.timer_running = true;
            let shared = Arc::clone(&self.shared);
            thread::spawn(move || run_timer(&shared));
        }
        state.work.len()
    }

    pub fn timer_running(&self) -> bool {
        self.shared.state().timer_running
    }

    pub fn has_work(&self) -> bool {
        !self.shared.state().work.is_empty()
    }

    pub fn how_much_work(&self) -> usize {
        self.shared.state().work.len()
    }
}

fn run_timer<T>(shared: &Shared<T>) {
    thread::sleep(shared.period);
    let batch = {
        let mut state = shared.state();
        state.timer_running = false;
        std::mem::take(&mut state.work)
    };
    if !batch.is_empty() {
        debug!(items = batch.len(), "delivering periodic batch");
        (shared.consumer)(batch);
    }
}
