//! Per-level message counting.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tracing::{Event, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

use crate::LogLevel;

#[derive(Debug)]
struct Counts {
    by_level: [AtomicU64; LogLevel::ALL.len()],
    started: Instant,
}

/// Shared view of the message counts and the start time of a logging setup.
///
/// Counts include events below the configured level that were not written.
#[derive(Debug, Clone)]
pub struct LogHandle {
    counts: Arc<Counts>,
}

impl LogHandle {
    pub(crate) fn new() -> Self {
        Self {
            counts: Arc::new(Counts {
                by_level: Default::default(),
                started: Instant::now(),
            }),
        }
    }

    /// Events seen at `level`.
    pub fn count(&self, level: LogLevel) -> u64 {
        self.counts.by_level[level.index()].load(Ordering::Relaxed)
    }

    /// Warnings plus errors.
    pub fn problems(&self) -> u64 {
        self.count(LogLevel::Warn) + self.count(LogLevel::Error)
    }

    /// Time since logging was set up.
    pub fn elapsed(&self) -> Duration {
        self.counts.started.elapsed()
    }

    pub(crate) fn layer(&self) -> CountingLayer {
        CountingLayer {
            counts: Arc::clone(&self.counts),
        }
    }
}

/// Layer incrementing the counter of each event's level.
pub(crate) struct CountingLayer {
    counts: Arc<Counts>,
}

impl<S: Subscriber> Layer<S> for CountingLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let level = LogLevel::from(*event.metadata().level());
        self.counts.by_level[level.index()].fetch_add(1, Ordering::Relaxed);
    }
}
