//! Process and work-scheduling helpers.
//!
//! - [`RunCmd`]: run a subprocess, streaming its stdout and stderr line by
//!   line to callbacks, with an optional timeout.
//! - [`run_command`], [`run_command_stdout`], [`run_shell`]: one-call
//!   conveniences on top of it.
//! - [`PriorityQueue`]: a shared queue that pops the greatest job first.
//! - [`PeriodicWork`]: collects items and hands them to a consumer in
//!   batches on a one-shot timer.

mod periodic_work;
mod priority_queue;
mod run_cmd;

pub use periodic_work::PeriodicWork;
pub use priority_queue::PriorityQueue;
pub use run_cmd::{
    LineSink, NO_EXIT_CODE, RunCmd, RunError, RunStatus, SHELL, run_command, run_command_stdout,
    run_shell,
};
