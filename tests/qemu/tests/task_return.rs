//! Test of the fatal trap: a task whose entry routine returns must end up there exactly once

#![no_std]
#![no_main]


use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use cortex_m_semihosting::{
    debug::{self, EXIT_FAILURE, EXIT_SUCCESS},
    hprintln,
};
use panic_semihosting as _;
use rondo::SchedulerConfig;
use static_cell::StaticCell;
use utils::{Stack, init_scheduler};

static TASK1_STACK: StaticCell<Stack<2048>> = StaticCell::new();
static TASK2_STACK: StaticCell<Stack<2048>> = StaticCell::new();

static TRAPPED: AtomicUsize = AtomicUsize::new(0);
static SPUN: AtomicBool = AtomicBool::new(false);

#[cortex_m_rt::entry]
fn main() -> ! {
    let scheduler = init_scheduler(
        SchedulerConfig::default()
            .with_tick_freq(1000)
            .with_fatal_hook(on_task_return),
    );

    let _task1 = scheduler.spawn(spinner, TASK1_STACK.init(Stack::new())).unwrap();
    let _task2 = scheduler.spawn(returns_at_once, TASK2_STACK.init(Stack::new())).unwrap();

    scheduler.start();
}

extern "C" fn spinner() {
    loop {
        SPUN.store(true, Ordering::Relaxed);
    }
}

extern "C" fn returns_at_once() {}

fn on_task_return(id: usize) {
    // Interrupts are masked in the trap
    let trapped = TRAPPED.load(Ordering::Relaxed) + 1;
    TRAPPED.store(trapped, Ordering::Relaxed);

    // Task #1 returned on its first time slice, after task #0 had its own
    if id == 1 && trapped == 1 && SPUN.load(Ordering::Relaxed) {
        debug::exit(EXIT_SUCCESS);
    } else {
        hprintln!("task #{} trapped {} times", id, trapped);
        debug::exit(EXIT_FAILURE);
    }
}
