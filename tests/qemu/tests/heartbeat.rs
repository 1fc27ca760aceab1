//! Test of the heartbeat cadence: one beat every `PERIOD` ticks, whatever the tasks do

#![no_std]
#![no_main]


use core::cell::RefCell;

use cortex_m_semihosting::{
    debug::{self, EXIT_FAILURE, EXIT_SUCCESS},
    hprint, hprintln,
};
use critical_section::Mutex;
use heapless::Vec;
use panic_semihosting as _;
use rondo::{SchedulerConfig, timer};
use static_cell::StaticCell;
use utils::{Stack, init_scheduler};

const PERIOD: u32 = 10;

static TASK1_STACK: StaticCell<Stack<2048>> = StaticCell::new();
static TASK2_STACK: StaticCell<Stack<2048>> = StaticCell::new();
static TASK3_STACK: StaticCell<Stack<2048>> = StaticCell::new();

/// Tick count at each beat
static BEATS: Mutex<RefCell<Vec<u64, 5>>> = Mutex::new(RefCell::new(Vec::new()));

#[cortex_m_rt::entry]
fn main() -> ! {
    let scheduler = init_scheduler(
        SchedulerConfig::default()
            .with_tick_freq(1000)
            .with_heartbeat(PERIOD, beat),
    );

    let _task1 = scheduler.spawn(spin, TASK1_STACK.init(Stack::new())).unwrap();
    let _task2 = scheduler.spawn(spin, TASK2_STACK.init(Stack::new())).unwrap();
    let _task3 = scheduler.spawn(spin, TASK3_STACK.init(Stack::new())).unwrap();

    scheduler.start();
}

extern "C" fn spin() {
    loop {
        core::hint::spin_loop();
    }
}

fn beat() {
    let tick = timer::current_tick().unwrap();

    critical_section::with(|cs| {
        let mut beats = BEATS.borrow_ref_mut(cs);
        if beats.push(tick).is_err() {
            return;
        }

        if beats.is_full() {
            let expected = (1..=5).map(|n| n * PERIOD as u64);
            if beats.iter().cloned().eq(expected) {
                debug::exit(EXIT_SUCCESS);
            } else {
                for tick in beats.iter() {
                    hprint!("{} ", tick);
                }
                hprintln!("");
                debug::exit(EXIT_FAILURE);
            }
        }
    });
}
