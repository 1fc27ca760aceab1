//! The SysTick handler, which is the whole preemption switch.
//!
//! Tasks run in Thread mode on the main stack, so on exception entry the
//! hardware stacks {R0-R3, R12, LR, PC, xPSR} on the interrupted task's own
//! stack. The handler pushes the rest right below, hops to the scheduler stack
//! for the bookkeeping in [`rondo::scheduler::switch_context`], then unwinds
//! the same sequence on the next task's stack.
//!
//! On the very first tick the scheduler slot is still empty; the handler keeps
//! running on the boot stack and that stack becomes the scheduler stack.

use core::mem::size_of;

use crate::frame::AutomaticHalf;

// The automatic half is the frame `cortex-m-rt` hands to exception handlers
const _: () = assert!(size_of::<cortex_m_rt::ExceptionFrame>() == size_of::<AutomaticHalf>());

/// Preemption switch (Armv6-M)
#[cfg(all(not(target_has_atomic), target_abi = "eabi"))] // No atomic => thumbv6m
#[unsafe(no_mangle)]
#[unsafe(naked)]
extern "C" fn SysTick() {
    core::arch::naked_asm!(
        // Only R4-R7 can be pushed directly, so stage R8-R11 in the already saved R0-R3
        "mov r0, r8",
        "mov r1, r9",
        "mov r2, r10",
        "mov r3, r11",
        "push {{r0-r3, lr}}", // R8-R11 and EXC_RETURN
        "push {{r4-r7}}",     // Same layout as `push {r4-r11, lr}`

        "mov r0, sp",   // Resume pointer of the interrupted context (first argument)

        "ldr r1, ={scheduler_slot}",
        "ldr r2, [r1]",
        "cmp r2, #0",
        "beq 2f",       // First tick: stay on the boot stack
        "mov sp, r2",   // Switch to the scheduler stack
        "2:",
        "mov r2, sp",
        "movs r3, #7",
        "bics r2, r3",  // AAPCS stack alignment
        "mov sp, r2",

        "bl {switch_context}",  // R0 = resume pointer of the next task

        "mov r2, sp",
        "ldr r1, ={scheduler_slot}",
        "str r2, [r1]", // Keep the scheduler stack for the next tick

        "mov sp, r0",   // Switch to the next task's stack

        "pop {{r4-r7}}",
        "pop {{r0-r3}}",
        "mov r8, r0",
        "mov r9, r1",
        "mov r10, r2",
        "mov r11, r3",
        "pop {{r0}}",   // EXC_RETURN

        "bx r0",
        scheduler_slot = sym rondo::context::SCHEDULER_SLOT,
        switch_context = sym rondo::scheduler::switch_context,
    );
    // Hardware restores R0-R3, R12, LR, PC and xPSR from the next task's stack
}

/// Preemption switch (Armv7-M and above, no FPU)
#[cfg(all(target_has_atomic, target_abi = "eabi"))] // Has atomic => thumbv7m or above, No FPU
#[unsafe(no_mangle)]
#[unsafe(naked)]
extern "C" fn SysTick() {
    core::arch::naked_asm!(
        "push {{r4-r11, lr}}", // Manual half, right below the hardware frame

        "mov r0, sp",   // Resume pointer of the interrupted context (first argument)

        "ldr r1, ={scheduler_slot}",
        "ldr r2, [r1]",
        "cbz r2, 2f",   // First tick: stay on the boot stack
        "mov sp, r2",   // Switch to the scheduler stack
        "2:",
        "mov r2, sp",
        "bic r2, r2, #7",   // AAPCS stack alignment
        "mov sp, r2",

        "bl {switch_context}",  // R0 = resume pointer of the next task

        "mov r2, sp",
        "ldr r1, ={scheduler_slot}",
        "str r2, [r1]", // Keep the scheduler stack for the next tick

        "mov sp, r0",   // Switch to the next task's stack
        "pop {{r4-r11, lr}}",

        "bx lr",
        scheduler_slot = sym rondo::context::SCHEDULER_SLOT,
        switch_context = sym rondo::scheduler::switch_context,
    );
    // Hardware restores R0-R3, R12, LR, PC and xPSR from the next task's stack
}

/// Preemption switch (Armv7E-M and above with FPU)
///
/// A task that used the FPU is interrupted with an extended frame (FType bit
/// of EXC_RETURN cleared); its S16-S31 are saved between the hardware frame
/// and the manual half.
#[cfg(target_abi = "eabihf")] // FPU
#[unsafe(no_mangle)]
#[unsafe(naked)]
extern "C" fn SysTick() {
    core::arch::naked_asm!(
        "tst lr, #0x00000010",  // Check Bit 4 (FType) of EXC_RETURN
        "it eq",
        "vpusheq {{s16-s31}}",  // Save the FP registers not saved by the hardware (if FType==0)
        "push {{r4-r11, lr}}",

        "mov r0, sp",   // Resume pointer of the interrupted context (first argument)

        "ldr r1, ={scheduler_slot}",
        "ldr r2, [r1]",
        "cbz r2, 2f",   // First tick: stay on the boot stack
        "mov sp, r2",   // Switch to the scheduler stack
        "2:",
        "mov r2, sp",
        "bic r2, r2, #7",   // AAPCS stack alignment
        "mov sp, r2",

        "bl {switch_context}",  // R0 = resume pointer of the next task

        "mov r2, sp",
        "ldr r1, ={scheduler_slot}",
        "str r2, [r1]", // Keep the scheduler stack for the next tick

        "mov sp, r0",   // Switch to the next task's stack
        "pop {{r4-r11, lr}}",
        "tst lr, #0x00000010",
        "it eq",
        "vpopeq {{s16-s31}}",

        "bx lr",
        scheduler_slot = sym rondo::context::SCHEDULER_SLOT,
        switch_context = sym rondo::scheduler::switch_context,
    );
    // Hardware restores R0-R3, R12, LR, PC and xPSR (and S0-S15, FPSCR) from the next task's stack
}
