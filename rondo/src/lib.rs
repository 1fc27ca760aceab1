//! Architecture-independent core of rondo, a round-robin preemptive kernel.
//!
//! A fixed set of tasks is created at boot, then a periodic timer interrupt
//! switches between them in strict cyclic order. Tasks never yield; the only
//! way a task leaves the CPU is the next tick.
//!
//! The register-level part of the switch lives in an architecture crate
//! (e.g. `rondo-cortex-m`), which implements the hooks declared in [`arch`].

#![cfg_attr(not(test), no_std)]

pub mod arch;
pub mod context;
mod log_wrapper;
pub mod scheduler;
pub mod task;
pub mod timer;

pub use arch::StackAllocation;
pub use portable_atomic;
pub use scheduler::{Scheduler, SchedulerConfig};
pub use task::{TaskEntry, TaskHandle};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    TaskFull,
    NotFound,
    NotInitialized,
    AlreadyStarted,
    StackTooSmall,
}
