//! Thread ABI types: class, constraints, lifecycle status, queue identity.
//!
//! This module contains **only** the types that form the stable interface
//! between the scheduler core and its callers. Scheduler-internal state
//! (the descriptor arena, the `start_time`/`run_time` bookkeeping fields)
//! lives in `slopos_core::scheduler::thread`.

// --- Scheduler configuration ---

/// Default aperiodic timer bound, in ticks.
pub const QUANTUM: u64 = 10_000_000;

/// Utilization bounds are percent-of-CPU in units of 10^-5, i.e. a value of
/// `65_000` means 0.65 of a CPU.
pub const UTIL_SCALE: u64 = 100_000;
pub const PERIODIC_UTIL: u64 = 65_000;
pub const SPORADIC_UTIL: u64 = 18_000;
pub const APERIODIC_UTIL: u64 = 9_000;

/// Fixed capacity of every heap/ring queue owned by a scheduler instance.
pub const MAX_QUEUE: usize = 256;

/// Identity of a thread descriptor: an index into the owning CPU's
/// descriptor arena. Queues store `ThreadId` values, never pointers, so a
/// descriptor is never referenced from more than one owner at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThreadId(pub u32);

impl ThreadId {
    pub const INVALID: ThreadId = ThreadId(u32::MAX);

    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }
}

impl Default for ThreadId {
    #[inline]
    fn default() -> Self {
        ThreadId::INVALID
    }
}

/// Opaque back-reference to the underlying OS thread handle (context,
/// stack, whatever the thread layer needs). The scheduler core never
/// interprets this value, only stores and returns it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ThreadHandle(pub u64);

/// Which of the seven scheduler queues a descriptor is currently parked on,
/// or none (the descriptor is `Running`).
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum QueueId {
    #[default]
    None = 0,
    Runnable = 1,
    Pending = 2,
    Aperiodic = 3,
    Arrival = 4,
    Waiting = 5,
    Sleeping = 6,
    Exited = 7,
}

/// Scheduling class of a thread. Determines which constraint variant is
/// valid and which dispatch branch applies (see the dispatcher).
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThreadClass {
    Periodic = 0,
    Sporadic = 1,
    Aperiodic = 2,
}

/// Per-class scheduling constraints, given at thread creation.
///
/// `Aperiodic::priority` is re-tagged by the dispatcher at every preemption
/// to the preempted thread's accumulated `run_time`, turning the aperiodic
/// queue into an aging / longest-idle-wins policy rather than a fixed
/// priority.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Constraints {
    Periodic { period: u64, slice: u64 },
    Sporadic { work: u64 },
    Aperiodic { priority: u64 },
}

impl Constraints {
    #[inline]
    pub const fn class(&self) -> ThreadClass {
        match self {
            Constraints::Periodic { .. } => ThreadClass::Periodic,
            Constraints::Sporadic { .. } => ThreadClass::Sporadic,
            Constraints::Aperiodic { .. } => ThreadClass::Aperiodic,
        }
    }
}

/// Lifecycle state of a thread descriptor.
///
/// Only the dispatcher may set `Running`; only the housekeeper may perform
/// the `ToBeRemoved -> Removed` transition and free the descriptor's arena
/// slot. `can_transition_to` encodes the legal edges so an illegal move is a
/// compile-visible match arm rather than an unchecked field write.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ThreadStatus {
    #[default]
    Arrived = 0,
    Admitted = 1,
    Waiting = 2,
    Running = 3,
    ToBeRemoved = 4,
    Removed = 5,
    Sleeping = 6,
}

impl ThreadStatus {
    #[inline]
    pub const fn can_transition_to(self, target: Self) -> bool {
        use ThreadStatus::*;
        match self {
            Arrived => matches!(target, Admitted | ToBeRemoved),
            Admitted => matches!(target, Running | Waiting | Sleeping | ToBeRemoved),
            Waiting => matches!(target, Running | Admitted | ToBeRemoved),
            Running => matches!(target, Admitted | Waiting | Sleeping | ToBeRemoved),
            Sleeping => matches!(target, Admitted | Running | ToBeRemoved),
            ToBeRemoved => matches!(target, Removed),
            Removed => false,
        }
    }
}
