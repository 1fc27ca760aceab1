//! `embedded-hal`-compatible delay measured in scheduler ticks instead of calibrated busy loops.
//!
//! Tasks cannot block, so waiting still spins, but other tasks keep getting
//! their time slices meanwhile and the duration no longer depends on the CPU
//! clock or the number of tasks. The precision is limited by the tick
//! frequency setting of the scheduler (usually order of a millisecond or more).

use rondo::{Error, scheduler::get_config, timer::current_tick};

const NANOS_PER_SEC: u64 = 1_000_000_000;
const MICROS_PER_SEC: u64 = 1_000_000;
const MILLIS_PER_SEC: u64 = 1_000;

#[derive(Clone)]
pub struct Delay {
    tick_freq: u32,
}

impl Delay {
    pub fn new() -> Result<Self, Error> {
        let tick_freq = get_config()?.tick_freq;

        Ok(Self { tick_freq })
    }

    /// Spins until at least `ticks` ticks have elapsed.
    pub fn delay_ticks(&mut self, ticks: u64) {
        let start = current_tick().expect("Failed to acquire current time");
        while current_tick().expect("Failed to acquire current time") - start < ticks {
            core::hint::spin_loop();
        }
    }
}

/// Number of ticks covering `amount` units of `1 / units_per_sec` seconds, rounded up.
fn to_ticks(amount: u32, units_per_sec: u64, tick_freq: u32) -> u64 {
    (amount as u64 * tick_freq as u64).div_ceil(units_per_sec)
}

impl embedded_hal::delay::DelayNs for Delay {
    fn delay_ns(&mut self, ns: u32) {
        self.delay_ticks(to_ticks(ns, NANOS_PER_SEC, self.tick_freq));
    }

    fn delay_us(&mut self, us: u32) {
        self.delay_ticks(to_ticks(us, MICROS_PER_SEC, self.tick_freq));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay_ticks(to_ticks(ms, MILLIS_PER_SEC, self.tick_freq));
    }
}
