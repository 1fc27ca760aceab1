//! Tick counting and the heartbeat.
//!
//! Time is represented as the number of ticks since the timer was armed.

use crate::{Error, scheduler::SCHEDULER_STATE};

/// Low-frequency hook run from the tick path every `period` ticks.
#[derive(Clone, Copy, Debug)]
pub struct Heartbeat {
    pub(crate) period: u32,
    pub(crate) hook: fn(),
}

impl Heartbeat {
    pub fn new(period: u32, hook: fn()) -> Self {
        Self { period, hook }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct TickCounter {
    ticks: u64,
    heartbeat: Option<Heartbeat>,
    divider: u32,
}

impl TickCounter {
    pub(crate) fn new(heartbeat: Option<Heartbeat>) -> Self {
        Self {
            ticks: 0,
            heartbeat: heartbeat.filter(|beat| beat.period > 0),
            divider: 0,
        }
    }

    pub(crate) fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Counts one tick and returns the heartbeat hook if it is due.
    pub(crate) fn tick(&mut self) -> Option<fn()> {
        self.ticks += 1;

        let beat = self.heartbeat?;
        self.divider = (self.divider + 1) % beat.period;
        (self.divider == 0).then_some(beat.hook)
    }
}

/// Retrieves current time (in ticks).
pub fn current_tick() -> Result<u64, Error> {
    critical_section::with(|cs| {
        let state = SCHEDULER_STATE.borrow_ref(cs);
        let Some(state) = state.as_ref() else {
            return Err(Error::NotInitialized);
        };

        Ok(state.timer.ticks())
    })
}
