use core::cell::RefCell;

use critical_section::Mutex;

use crate::{
    Error, StackAllocation, arch,
    context::{ContextArena, SlotInfo},
    debug, error, info,
    task::{TaskEntry, TaskHandle},
    timer::{Heartbeat, TickCounter},
    trace,
};

pub(crate) static SCHEDULER_STATE: Mutex<RefCell<Option<SchedulerState>>> =
    Mutex::new(RefCell::new(None));

/// Round-robin cursor.
///
/// `None` until the first tick, while the boot code is running.
#[derive(Clone, Debug)]
struct RoundRobin {
    current: Option<usize>,
}

impl RoundRobin {
    const fn new() -> Self {
        Self { current: None }
    }

    fn current(&self) -> Option<usize> {
        self.current
    }

    /// Moves to the slot after the current one out of `count` slots.
    fn advance(&mut self, count: usize) -> usize {
        let next = match self.current {
            Some(current) => (current + 1) % count,
            None => 0,
        };
        self.current = Some(next);
        next
    }
}

#[derive(Clone, Debug)]
pub(crate) struct SchedulerState {
    contexts: ContextArena,
    cursor: RoundRobin,
    pub(crate) timer: TickCounter,
    config: SchedulerConfig,
    started: bool,
}

impl SchedulerState {
    fn new(config: SchedulerConfig) -> Self {
        Self {
            contexts: ContextArena::new(),
            cursor: RoundRobin::new(),
            timer: TickCounter::new(config.heartbeat),
            config,
            started: false,
        }
    }

    fn spawn(&mut self, stack: &mut [u8], entry: TaskEntry) -> Result<usize, Error> {
        if self.started {
            return Err(Error::AlreadyStarted);
        }

        let exit = (task_returned as extern "C" fn() -> !) as usize;
        self.contexts.initialize(stack, entry, exit)
    }

    /// Bookkeeping of one tick.
    ///
    /// Returns the resume pointer of the task to run next and the heartbeat
    /// hook if it is due.
    fn switch(&mut self, suspended: usize) -> (usize, Option<fn()>) {
        // The boot context is abandoned on the first tick
        if let Some(current) = self.cursor.current() {
            self.contexts.suspend(current, suspended);
        }

        let next = self.cursor.advance(self.contexts.len());
        let heartbeat = self.timer.tick();

        (self.contexts.resume_pointer(next), heartbeat)
    }
}

#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct SchedulerConfig {
    pub tick_freq: u32,
    pub heartbeat: Option<Heartbeat>,
    pub fatal_hook: Option<fn(usize)>,
}

impl SchedulerConfig {
    pub fn with_tick_freq(self, tick_freq: u32) -> Self {
        Self { tick_freq, ..self }
    }

    /// Runs `hook` from the tick path every `period` ticks. A zero period disables it.
    pub fn with_heartbeat(self, period: u32, hook: fn()) -> Self {
        Self {
            heartbeat: Some(Heartbeat::new(period, hook)),
            ..self
        }
    }

    /// Sets the hook called with the task id when a task returns from its entry routine.
    pub fn with_fatal_hook(self, hook: fn(usize)) -> Self {
        Self {
            fatal_hook: Some(hook),
            ..self
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_freq: 1000,
            heartbeat: None,
            fatal_hook: None,
        }
    }
}

pub struct Scheduler {
    clock_freq: u32,
    tick_freq: u32,
}

impl Scheduler {
    /// Creates the scheduler state.
    ///
    /// Returns `None` if it already exists, or if `config.tick_freq` is zero
    /// or higher than `clock_freq`.
    ///
    /// # Safety
    /// The architecture crate must own the timer peripheral used for ticks.
    pub unsafe fn init(clock_freq: u32, config: SchedulerConfig) -> Option<Self> {
        let tick_freq = config.tick_freq;
        if !tick_freq_is_usable(clock_freq, tick_freq) {
            error!("Unusable tick frequency {} Hz for a {} Hz clock", tick_freq, clock_freq);
            return None;
        }

        let created = critical_section::with(|cs| {
            let mut scheduler_state = SCHEDULER_STATE.borrow_ref_mut(cs);
            if scheduler_state.is_some() {
                // Scheduler is already initialized
                false
            } else {
                *scheduler_state = Some(SchedulerState::new(config));
                true
            }
        });

        created.then_some(Scheduler {
            clock_freq,
            tick_freq,
        })
    }

    /// Arms the tick timer and idles until the first tick switches to task #0.
    ///
    /// Panics if no task was spawned.
    pub fn start(&self) -> ! {
        let task_count = critical_section::with(|cs| {
            let state = SCHEDULER_STATE.borrow_ref(cs);
            state.as_ref().map_or(0, |state| state.contexts.len())
        });
        assert!(task_count > 0, "No task to run");

        unsafe {
            arch::_rondo_setup(self.clock_freq, self.tick_freq);
        }

        critical_section::with(|cs| {
            let mut state = SCHEDULER_STATE.borrow_ref_mut(cs);
            if let Some(state) = state.as_mut() {
                state.started = true;
            }
        });

        unsafe {
            arch::_rondo_start_timer();
        }

        info!("Kernel started with {} tasks", task_count);

        loop {
            trace!("Idle");
            unsafe {
                arch::_rondo_wait_for_interrupt();
            }
        }
    }

    /// Creates a task in the next free slot.
    ///
    /// Only allowed before [`Scheduler::start`]. The stack is owned by the
    /// task for the rest of the program.
    pub fn spawn<S: StackAllocation + 'static>(
        &self,
        entry: TaskEntry,
        mut stack: S,
    ) -> Result<TaskHandle, Error> {
        let stack = stack.as_mut_slice();
        let range = stack.as_ptr_range();

        let task_id = critical_section::with(|cs| {
            let mut state = SCHEDULER_STATE.borrow_ref_mut(cs);
            let Some(state) = state.as_mut() else {
                // The init of `SCHEDULER_STATE` is guaranteed by the existence of `Scheduler`
                unreachable!()
            };

            state.spawn(stack, entry)
        })?;

        info!("Task #{} created", task_id);
        debug!(
            "Stack from={:#x} to={:#x}",
            range.start as usize,
            range.end as usize
        );

        Ok(TaskHandle { id: task_id })
    }
}

fn tick_freq_is_usable(clock_freq: u32, tick_freq: u32) -> bool {
    tick_freq != 0 && tick_freq <= clock_freq
}

/// Tick bookkeeping, called by the architecture's switch handler while it
/// runs on the scheduler stack.
///
/// Stores `suspended` as the resume pointer of the task that was running,
/// advances the round-robin cursor, counts the tick and returns the resume
/// pointer of the task to run next.
///
/// # Safety
/// `suspended` must be the address of a complete register image of the
/// interrupted task. The returned value is trusted blindly by the handler.
pub unsafe extern "C" fn switch_context(suspended: usize) -> usize {
    let (next, heartbeat) = critical_section::with(|cs| {
        let mut state = SCHEDULER_STATE.borrow_ref_mut(cs);
        let Some(state) = state.as_mut() else {
            panic!("Scheduler not initialized")
        };

        state.switch(suspended)
    });

    if let Some(hook) = heartbeat {
        hook();
    }

    trace!(
        "Context switch: suspended = {:#x}, next = {:#x}",
        suspended, next
    );
    next
}

/// Return address of every task entry routine.
extern "C" fn task_returned() -> ! {
    // Nothing else gets scheduled from here on
    unsafe {
        arch::_rondo_mask_interrupts();
    }

    let (id, hook) = critical_section::with(|cs| {
        let state = SCHEDULER_STATE.borrow_ref(cs);
        let Some(state) = state.as_ref() else {
            unreachable!()
        };
        let Some(id) = state.cursor.current() else {
            unreachable!()
        };
        (id, state.config.fatal_hook)
    });

    error!("Task #{} returned", id);

    if let Some(hook) = hook {
        hook(id);
    }

    loop {
        unsafe {
            arch::_rondo_wait_for_interrupt();
        }
    }
}

pub(crate) fn current_task_id() -> Result<usize, Error> {
    critical_section::with(|cs| {
        let state = SCHEDULER_STATE.borrow_ref(cs);
        let Some(state) = state.as_ref() else {
            return Err(Error::NotInitialized);
        };

        state.cursor.current().ok_or(Error::NotFound)
    })
}

/// Number of task slots in use.
pub fn task_count() -> Result<usize, Error> {
    critical_section::with(|cs| {
        let state = SCHEDULER_STATE.borrow_ref(cs);
        let Some(state) = state.as_ref() else {
            return Err(Error::NotInitialized);
        };

        Ok(state.contexts.len())
    })
}

/// Snapshot of a task slot, for diagnostics.
pub fn slot_info(id: usize) -> Result<SlotInfo, Error> {
    critical_section::with(|cs| {
        let state = SCHEDULER_STATE.borrow_ref(cs);
        let Some(state) = state.as_ref() else {
            return Err(Error::NotInitialized);
        };

        state.contexts.info(id).ok_or(Error::NotFound)
    })
}

pub fn get_config() -> Result<SchedulerConfig, Error> {
    critical_section::with(|cs| {
        let state = SCHEDULER_STATE.borrow_ref(cs);
        let Some(state) = state.as_ref() else {
            return Err(Error::NotInitialized);
        };

        Ok(state.config.clone())
    })
}
