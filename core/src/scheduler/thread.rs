//! Scheduler-internal thread descriptor.
//!
//! The ABI-visible pieces (`ThreadClass`, `Constraints`, `ThreadStatus`,
//! `QueueId`) live in `slopos_abi`; this struct adds the bookkeeping fields
//! the dispatcher needs and that no caller outside the scheduler should
//! touch directly.

use slopos_abi::{Constraints, QueueId, ThreadClass, ThreadHandle, ThreadStatus};

#[derive(Clone, Copy, Debug)]
pub struct ThreadDescriptor {
    pub class: ThreadClass,
    pub constraints: Constraints,
    pub status: ThreadStatus,
    pub current_queue: QueueId,
    /// Cycle at which the current dispatch of this thread began.
    pub start_time: u64,
    /// Cycles billed to the current release (periodic: since last period
    /// boundary; sporadic: cumulative for this job).
    pub run_time: u64,
    /// Absolute cycle by which this release must complete. Zero for
    /// aperiodic threads, which have no deadline.
    pub deadline: u64,
    /// Cycle at which the thread last yielded the CPU.
    pub exit_time: u64,
    pub handle: ThreadHandle,
}

impl ThreadDescriptor {
    pub fn new(class: ThreadClass, constraints: Constraints, deadline: u64, handle: ThreadHandle) -> Self {
        Self {
            class,
            constraints,
            status: ThreadStatus::Arrived,
            current_queue: QueueId::None,
            start_time: 0,
            run_time: 0,
            deadline,
            exit_time: 0,
            handle,
        }
    }

    /// Transition `status`. Setting the status a descriptor already holds
    /// is always a no-op; any other edge is asserted legal per
    /// `ThreadStatus::can_transition_to` in debug builds (release builds
    /// trust the caller, since every call site here is scheduler-internal).
    #[inline]
    pub fn set_status(&mut self, target: ThreadStatus) {
        if self.status == target {
            return;
        }
        debug_assert!(
            self.status.can_transition_to(target),
            "illegal thread status transition"
        );
        self.status = target;
    }
}
