//! Interface for architecture-dependent functions implemented in separate crates.

unsafe extern "Rust" {
    /// INTERNAL USE ONLY
    pub unsafe fn _rondo_setup(clock_freq: u32, tick_freq: u32);
    /// INTERNAL USE ONLY
    pub unsafe fn _rondo_start_timer();
    /// INTERNAL USE ONLY
    ///
    /// Builds the register image of a task that has never run just below
    /// `stack_top` and returns its address (the initial resume pointer).
    pub unsafe fn _rondo_init_frame(stack_top: *mut u8, entry: usize, exit: usize) -> *mut u8;
    /// INTERNAL USE ONLY
    pub unsafe fn _rondo_min_stack_size() -> usize;
    /// INTERNAL USE ONLY
    pub unsafe fn _rondo_mask_interrupts();
    /// INTERNAL USE ONLY
    pub unsafe fn _rondo_wait_for_interrupt();
}

/// Trait for a stack allocation that meets architecture-specific requirements such as alignment.
/// Modeled after `rp2040_hal`. https://docs.rs/rp2040-hal/0.11.0/rp2040_hal/multicore/struct.StackAllocation.html
pub trait StackAllocation {
    fn as_mut_slice(&mut self) -> &mut [u8];
}
