//! Register image of a suspended task.
//!
//! The image is stored on the task's own stack at its resume pointer and has
//! two contiguous halves. The lower one is pushed and popped by the SysTick
//! handler, the upper one by the exception entry/return hardware. Resuming a
//! task pops the manual half and then performs an exception return, which
//! consumes the automatic half sitting right above it.

use core::mem::size_of;

/// EXC_RETURN for Thread mode, main stack, basic frame.
pub const EXC_RETURN_THREAD_MSP: u32 = 0xFFFF_FFF9;

/// xPSR with only the Thumb state bit set.
pub const XPSR_THUMB: u32 = 1 << 24;

/// Smallest stack that can hold an initial image after aligning its top.
pub const MIN_STACK_SIZE: usize = RegisterImage::SIZE + 8;

/// Registers stacked by the hardware on exception entry, lowest address first.
#[repr(C)]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AutomaticHalf {
    pub r0: u32,
    pub r1: u32,
    pub r2: u32,
    pub r3: u32,
    pub r12: u32,
    pub lr: u32,
    pub pc: u32,
    pub xpsr: u32,
}

/// Registers the SysTick handler saves itself with `push {r4-r11, lr}`.
#[repr(C)]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ManualHalf {
    pub r4: u32,
    pub r5: u32,
    pub r6: u32,
    pub r7: u32,
    pub r8: u32,
    pub r9: u32,
    pub r10: u32,
    pub r11: u32,
    pub exc_return: u32, // LR on exception
}

#[repr(C)]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegisterImage {
    pub manual: ManualHalf,
    pub automatic: AutomaticHalf,
}

impl RegisterImage {
    pub const SIZE: usize = size_of::<Self>();
}

/// Builds the image of a task that has never run just below `stack_top`.
///
/// Resuming it starts `entry` with zeroed argument registers on an 8-byte
/// aligned stack; returning from `entry` jumps to `exit`.
///
/// # Safety
/// `stack_top` must be the end of a writable region of at least
/// [`MIN_STACK_SIZE`] bytes.
pub unsafe fn init_frame(stack_top: *mut u8, entry: usize, exit: usize) -> *mut RegisterImage {
    // The hardware frame must start on an 8-byte boundary
    let top = stack_top.map_addr(|addr| addr & !7);

    unsafe {
        let image = top.byte_sub(RegisterImage::SIZE).cast::<RegisterImage>();
        image.write_bytes(0, 1);

        let regs = &mut *image;
        regs.manual.r7 = top.addr() as u32;
        regs.manual.exc_return = EXC_RETURN_THREAD_MSP;
        regs.automatic.lr = exit as u32;
        regs.automatic.pc = (entry & !1) as u32; // Exception return wants a halfword-aligned PC
        regs.automatic.xpsr = XPSR_THUMB;

        image
    }
}
