//! Real-time scheduler ABI types.
//!
//! This crate provides the canonical definitions for the types shared
//! between the per-CPU scheduler core (`slopos_core::scheduler`) and its
//! callers: the thread layer that creates threads, and anything consuming
//! scheduler diagnostics. Keeping these in one crate avoids duplicate
//! enum definitions drifting apart from the scheduler's own internal
//! notion of thread state.

#![no_std]
#![forbid(unsafe_code)]

pub mod error;
pub mod thread;

pub use error::SchedError;
pub use thread::{
    APERIODIC_UTIL, Constraints, MAX_QUEUE, PERIODIC_UTIL, QUANTUM, QueueId, SPORADIC_UTIL,
    ThreadClass, ThreadHandle, ThreadId, ThreadStatus, UTIL_SCALE,
};
