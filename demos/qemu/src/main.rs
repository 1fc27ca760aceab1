//! Three tasks on a virtual board, plus a heartbeat LED.
//!
//! - Task A mirrors the test button on the blue LED.
//! - Task B blinks the yellow LED with a tick-based delay.
//! - Task C toggles the red LED on every press of the change button.
//!
//! The green LED toggles once per second from the scheduler heartbeat.

#![no_std]
#![no_main]

mod board;

use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin, StatefulOutputPin},
};
use log::{error, info};
use panic_semihosting as _;
use rondo::SchedulerConfig;
use rondo_cortex_m::{Stack, init_scheduler};
use rondo_utils::Delay;
use static_cell::StaticCell;

use crate::board::{BUTTON_CHANGE, BUTTON_TEST, LED_BLUE, LED_GREEN, LED_RED, LED_YELLOW};

const CLOCK_FREQ: u32 = 12_000_000;
const TICK_FREQ: u32 = 1000;

static LOGGER: Logger = Logger;

static TASK_A_STACK: StaticCell<Stack<4096>> = StaticCell::new();
static TASK_B_STACK: StaticCell<Stack<4096>> = StaticCell::new();
static TASK_C_STACK: StaticCell<Stack<4096>> = StaticCell::new();

#[cortex_m_rt::entry]
fn main() -> ! {
    log::set_logger(&LOGGER).unwrap();
    log::set_max_level(log::LevelFilter::Info);

    info!("Started");

    let peripherals = cortex_m::Peripherals::take().unwrap();
    let scheduler = init_scheduler(
        peripherals.SYST,
        peripherals.SCB,
        CLOCK_FREQ,
        SchedulerConfig::default()
            .with_tick_freq(TICK_FREQ)
            .with_heartbeat(TICK_FREQ, heartbeat)
            .with_fatal_hook(task_fault),
    )
    .unwrap();

    let _task_a = scheduler.spawn(task_a, TASK_A_STACK.init(Stack::new())).unwrap();
    let _task_b = scheduler.spawn(task_b, TASK_B_STACK.init(Stack::new())).unwrap();
    let _task_c = scheduler.spawn(task_c, TASK_C_STACK.init(Stack::new())).unwrap();

    scheduler.start();
}

fn heartbeat() {
    let _ = (&LED_GREEN).toggle();
}

fn task_fault(task_id: usize) {
    error!("task #{} returned", task_id);
    let _ = (&LED_RED).set_high();
}

extern "C" fn task_a() {
    let mut button = &BUTTON_TEST;
    let mut led = &LED_BLUE;
    loop {
        let pressed = button.is_high().unwrap_or(false);
        let _ = led.set_state(pressed.into());
    }
}

extern "C" fn task_b() {
    let mut delay = Delay::new().unwrap();
    let mut led = &LED_YELLOW;
    loop {
        let _ = led.toggle();
        delay.delay_ms(250);
    }
}

extern "C" fn task_c() {
    let mut button = &BUTTON_CHANGE;
    let mut led = &LED_RED;
    let mut was_pressed = false;
    loop {
        let pressed = button.is_high().unwrap_or(false);
        if pressed && !was_pressed {
            let _ = led.toggle();
        }
        was_pressed = pressed;
    }
}

struct Logger;

impl log::Log for Logger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::Level::Info
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            cortex_m_semihosting::hprintln!("[{}] {}: {}", record.level(), record.target(), record.args())
        }
    }

    fn flush(&self) {}
}
