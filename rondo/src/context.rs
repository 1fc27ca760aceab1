//! Task Context Store.
//!
//! Every task owns a stack region and a resume pointer, the address inside
//! that region where its suspended register image lives. The scheduler's own
//! context has a resume pointer too ([`SCHEDULER_SLOT`]), which the switch
//! handler uses as its scratch stack while it does the round-robin
//! bookkeeping.

use core::{ops::Range, sync::atomic::Ordering};

use heapless::Vec;
use portable_atomic::AtomicUsize;

use crate::{Error, arch, task::TaskEntry};

/// Capacity of the context arena.
pub const MAX_TASKS: usize = 8;

/// Resume pointer of the scheduler context.
///
/// Loaded and stored by the architecture's switch handler with plain word
/// accesses. Zero until the first tick; afterwards it points into the stack
/// the boot code was running on when the timer fired for the first time.
pub static SCHEDULER_SLOT: SchedulerSlot = SchedulerSlot::new();

#[repr(transparent)]
pub struct SchedulerSlot(AtomicUsize);

impl SchedulerSlot {
    const fn new() -> Self {
        Self(AtomicUsize::new(0))
    }

    pub fn resume_pointer(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }
}

/// Read-only view of a task slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotInfo {
    pub stack: Range<usize>,
    pub resume_pointer: usize,
    pub entry: usize,
}

#[derive(Clone, Debug)]
struct TaskSlot {
    stack: Range<usize>,
    resume_pointer: usize,
    entry: usize,
}

/// Fixed-capacity arena of task slots. Slot ids are assigned in creation order.
#[derive(Clone, Debug)]
pub(crate) struct ContextArena {
    slots: Vec<TaskSlot, MAX_TASKS>,
}

impl ContextArena {
    pub(crate) const fn new() -> Self {
        Self { slots: Vec::new() }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    /// Prepares `stack` so that resuming the new slot starts `entry`, and
    /// returns the slot id.
    ///
    /// `exit` becomes the return address of `entry`.
    pub(crate) fn initialize(
        &mut self,
        stack: &mut [u8],
        entry: TaskEntry,
        exit: usize,
    ) -> Result<usize, Error> {
        if self.slots.is_full() {
            return Err(Error::TaskFull);
        }
        if stack.len() < unsafe { arch::_rondo_min_stack_size() } {
            return Err(Error::StackTooSmall);
        }

        let range = stack.as_mut_ptr_range();
        let resume_pointer =
            unsafe { arch::_rondo_init_frame(range.end, entry as usize, exit) } as usize;

        let id = self.slots.len();
        self.slots
            .push(TaskSlot {
                stack: range.start as usize..range.end as usize,
                resume_pointer,
                entry: entry as usize,
            })
            .or(Err(Error::TaskFull))?;

        Ok(id)
    }

    /// Records where the register image of a just-suspended task lives.
    pub(crate) fn suspend(&mut self, id: usize, resume_pointer: usize) {
        self.slots[id].resume_pointer = resume_pointer;
    }

    pub(crate) fn resume_pointer(&self, id: usize) -> usize {
        self.slots[id].resume_pointer
    }

    pub(crate) fn info(&self, id: usize) -> Option<SlotInfo> {
        self.slots.get(id).map(|slot| SlotInfo {
            stack: slot.stack.clone(),
            resume_pointer: slot.resume_pointer,
            entry: slot.entry,
        })
    }
}
