//! Minimal interrupt-flag primitives.
//!
//! `IrqMutex` needs to disable interrupts for the duration of a critical
//! section and restore whatever state they were in beforehand. This is the
//! entire contract; anything arch-specific beyond `cli`/`sti`/`pushf`/`popf`
//! lives in the embedding kernel, not here.

use core::arch::asm;

/// Disable interrupts unconditionally.
#[inline(always)]
pub fn disable_interrupts() {
    unsafe {
        asm!("cli", options(nomem, nostack, preserves_flags));
    }
}

/// Enable interrupts unconditionally.
#[inline(always)]
pub fn enable_interrupts() {
    unsafe {
        asm!("sti", options(nomem, nostack, preserves_flags));
    }
}

/// Save RFLAGS, disable interrupts, and return the saved flags.
///
/// Pair with [`restore_flags`] to return interrupts to whatever state they
/// were in before this call, rather than unconditionally re-enabling them —
/// callers may themselves be nested inside an interrupt-disabled region.
#[inline(always)]
pub fn save_flags_cli() -> u64 {
    let flags: u64;
    unsafe {
        asm!(
            "pushfq",
            "pop {flags}",
            "cli",
            flags = out(reg) flags,
            options(nomem, preserves_flags)
        );
    }
    flags
}

/// Restore RFLAGS previously saved by [`save_flags_cli`].
#[inline(always)]
pub fn restore_flags(flags: u64) {
    unsafe {
        asm!(
            "push {flags}",
            "popfq",
            flags = in(reg) flags,
            options(nomem)
        );
    }
}
