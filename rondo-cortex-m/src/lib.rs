//! Cortex-M specific code for rondo
//!
//! This is the Cortex-M specific part of the rondo round-robin kernel.
//! It supports Armv6-M, Armv7-M and Armv8-M mainline, with or without FPU.
//!
//! Ticks come from SysTick. Its handler saves the running task's registers,
//! selects the next task in round-robin order and resumes it, all in a single
//! naked exception handler. Tasks run in Thread mode on the main stack.

#![cfg_attr(not(test), no_std)]

pub mod frame;
#[cfg(all(target_arch = "arm", target_os = "none"))]
mod switch;

#[cfg(all(target_arch = "arm", target_os = "none"))]
use cortex_m::peripheral::{SCB, SYST, scb::SystemHandler, syst::SystClkSource};
use rondo::arch::StackAllocation;
#[cfg(all(target_arch = "arm", target_os = "none"))]
use rondo::scheduler::{Scheduler, SchedulerConfig};

/// Largest value of the 24-bit SysTick reload register.
pub const SYST_RELOAD_MAX: u32 = 0x00FF_FFFF;

/// Safely initializes the scheduler.
///
/// Taking `SYST` and `SCB` by value keeps the rest of the firmware from
/// reconfiguring the tick source.
///
/// Returns `None` if the scheduler already exists or SysTick cannot tick at
/// `config.tick_freq` from `clock_freq` (see [`systick_reload`]).
#[cfg(all(target_arch = "arm", target_os = "none"))]
pub fn init_scheduler(
    _syst: SYST,
    _scb: SCB,
    clock_freq: u32,
    config: SchedulerConfig,
) -> Option<Scheduler> {
    systick_reload(clock_freq, config.tick_freq)?;
    unsafe { Scheduler::init(clock_freq, config) }
}

/// SysTick reload value for `tick_freq` ticks per second of a `clock_freq` core clock.
///
/// `None` when `tick_freq` is zero, when the period is shorter than two
/// clock cycles (a zero reload stops the counter) or longer than the 24-bit
/// counter can hold.
pub fn systick_reload(clock_freq: u32, tick_freq: u32) -> Option<u32> {
    let reload = clock_freq.checked_div(tick_freq)?.checked_sub(1)?;
    (1..=SYST_RELOAD_MAX).contains(&reload).then_some(reload)
}

/// INTERNAL USE ONLY
#[cfg(all(target_arch = "arm", target_os = "none"))]
#[unsafe(no_mangle)]
pub fn _rondo_setup(clock_freq: u32, tick_freq: u32) {
    let peripherals = unsafe { cortex_m::Peripherals::steal() };
    let mut scb = peripherals.SCB;
    let mut syst = peripherals.SYST;

    // On armv6m `set_priority` is not atomic
    critical_section::with(|_| unsafe {
        // SysTick must never preempt another handler, since the switch
        // treats whatever it interrupted as a task
        scb.set_priority(
            SystemHandler::SysTick,
            255, /* Lowest possible priority */
        );
    });

    // Configure the SysTick timer
    let Some(reload) = systick_reload(clock_freq, tick_freq) else {
        panic!("SysTick cannot tick at {} Hz from a {} Hz clock", tick_freq, clock_freq);
    };
    syst.set_clock_source(SystClkSource::Core);
    syst.set_reload(reload);
    syst.clear_current();
    syst.enable_interrupt();
}

/// INTERNAL USE ONLY
#[cfg(all(target_arch = "arm", target_os = "none"))]
#[unsafe(no_mangle)]
pub fn _rondo_start_timer() {
    let peripherals = unsafe { cortex_m::Peripherals::steal() };
    let mut syst = peripherals.SYST;

    // Start the SysTick timer
    syst.enable_counter();
}

/// INTERNAL USE ONLY
#[unsafe(no_mangle)]
pub fn _rondo_init_frame(stack_top: *mut u8, entry: usize, exit: usize) -> *mut u8 {
    unsafe { frame::init_frame(stack_top, entry, exit).cast() }
}

/// INTERNAL USE ONLY
#[unsafe(no_mangle)]
pub fn _rondo_min_stack_size() -> usize {
    frame::MIN_STACK_SIZE
}

/// INTERNAL USE ONLY
#[cfg(all(target_arch = "arm", target_os = "none"))]
#[unsafe(no_mangle)]
pub fn _rondo_mask_interrupts() {
    cortex_m::interrupt::disable();
}

/// INTERNAL USE ONLY
#[cfg(all(target_arch = "arm", target_os = "none"))]
#[unsafe(no_mangle)]
pub fn _rondo_wait_for_interrupt() {
    cortex_m::asm::wfi();
}

/// Correctly aligned stack allocation helper.
///
/// It ensures allocation of a task-specific stack region correctly aligned at 8 bytes.
/// Modeled after [rp2040-hal implementation](https://docs.rs/rp2040-hal/0.11.0/rp2040_hal/multicore/struct.Stack.html).
#[repr(align(8))]
pub struct Stack<const N: usize>([u8; N]);

impl<const N: usize> Stack<N> {
    pub const fn new() -> Self {
        Self([0u8; N])
    }
}

impl<const N: usize> Default for Stack<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> StackAllocation for &mut Stack<N> {
    fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.0
    }
}
