//! Compile-time scheduler configuration.
//!
//! The utilization bounds and queue capacity are part of the ABI (callers
//! need them to reason about admission up front), so they live in
//! `slopos_abi` and are just re-exported here alongside the constants that
//! are purely internal to this crate.

pub use slopos_abi::{APERIODIC_UTIL, MAX_QUEUE, PERIODIC_UTIL, QUANTUM, SPORADIC_UTIL, UTIL_SCALE};

/// Extra slack added to a budget-based timer arm to absorb bookkeeping
/// cost between the timer firing and the next dispatch actually running.
/// Zero by default, as the spec allows.
pub const TIMER_SLACK: u64 = 0;

/// Number of per-CPU scheduler instances the registry has room for.
pub const MAX_CPUS: usize = 32;
