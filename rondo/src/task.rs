//! Task handles.

use crate::{Error, scheduler::current_task_id};

/// Entry routine of a task. It is expected to loop forever; returning from it
/// lands in the fatal trap.
pub type TaskEntry = extern "C" fn();

/// Handle object for a task.
///
/// This is just a surrogate for a task ID (its slot index).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskHandle {
    pub(crate) id: usize,
}

impl TaskHandle {
    pub fn id(&self) -> usize {
        self.id
    }
}

/// Returns the handle of the running task.
///
/// Fails with [`Error::NotFound`] before the first tick, while the boot code
/// is still running.
pub fn current() -> Result<TaskHandle, Error> {
    Ok(TaskHandle {
        id: current_task_id()?,
    })
}
