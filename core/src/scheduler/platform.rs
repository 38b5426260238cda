//! Hardware hooks consumed by the scheduler: a monotonic cycle counter and
//! a one-shot timer. Both are stored as registrable backend function
//! pointers behind an `AtomicPtr`, the same indirection `slopos_lib::klog`
//! uses for its log backend — this lets the scheduler core build and be
//! exercised in tests without touching real hardware.

use core::sync::atomic::{AtomicPtr, Ordering};

pub type NowFn = fn() -> u64;
pub type TimerOneshotFn = fn(u64);

static NOW: AtomicPtr<()> = AtomicPtr::new(core::ptr::null_mut());
static TIMER_ONESHOT: AtomicPtr<()> = AtomicPtr::new(core::ptr::null_mut());

/// Deterministic stand-in for the cycle counter until a backend is
/// registered: always zero. A scheduler exercised against this default
/// never observes elapsed time, which is enough for structural tests that
/// drive `now` explicitly through other means.
fn stub_now() -> u64 {
    0
}

fn stub_timer_oneshot(_ticks: u64) {}

/// Register the backend that answers `now()`.
pub fn register_now(backend: NowFn) {
    NOW.store(backend as *mut (), Ordering::Release);
}

/// Register the backend that programs the one-shot timer.
pub fn register_timer_oneshot(backend: TimerOneshotFn) {
    TIMER_ONESHOT.store(backend as *mut (), Ordering::Release);
}

/// Sample the monotonic cycle counter.
pub fn now() -> u64 {
    let ptr = NOW.load(Ordering::Acquire);
    if ptr.is_null() {
        stub_now()
    } else {
        // SAFETY: only `register_now` stores into `NOW`, and only with a
        // valid `NowFn` pointer, which has the same representation as
        // `*mut ()` on every target this crate builds for.
        let f: NowFn = unsafe { core::mem::transmute(ptr) };
        f()
    }
}

/// Program the local one-shot timer for `ticks` cycles from now.
pub fn timer_oneshot(ticks: u64) {
    let ptr = TIMER_ONESHOT.load(Ordering::Acquire);
    if ptr.is_null() {
        stub_timer_oneshot(ticks);
    } else {
        // SAFETY: see `now()`.
        let f: TimerOneshotFn = unsafe { core::mem::transmute(ptr) };
        f(ticks);
    }
}
