//! The per-CPU scheduler instance: composition of the descriptor arena,
//! the seven queues, and the operations exposed to the thread layer
//! (§6 of the design: create, admit, enqueue/dequeue, exit, reschedule).

use slopos_abi::{
    Constraints, MAX_QUEUE, QueueId, SchedError, ThreadClass, ThreadHandle, ThreadId, ThreadStatus,
};

use super::admission;
use super::arena::Arena;
use super::diag;
use super::dispatcher;
use super::platform;
use super::queue::{HeapQueue, Queue, RingQueue};
use super::thread::ThreadDescriptor;

fn deadline_key(desc: &ThreadDescriptor) -> u64 {
    desc.deadline
}

fn aperiodic_priority_key(desc: &ThreadDescriptor) -> u64 {
    match desc.constraints {
        Constraints::Aperiodic { priority } => priority,
        _ => u64::MAX,
    }
}

pub struct Scheduler {
    pub(super) arena: Arena<MAX_QUEUE>,
    pub(super) runnable: HeapQueue<MAX_QUEUE>,
    pub(super) pending: HeapQueue<MAX_QUEUE>,
    pub(super) aperiodic: HeapQueue<MAX_QUEUE>,
    pub(super) arrival: RingQueue<MAX_QUEUE>,
    pub(super) waiting: RingQueue<MAX_QUEUE>,
    pub(super) sleeping: RingQueue<MAX_QUEUE>,
    pub(super) exited: RingQueue<MAX_QUEUE>,
    pub(super) current: Option<ThreadId>,
    stats: diag::SchedStats,
}

impl Scheduler {
    fn empty() -> Self {
        Self {
            arena: Arena::new(),
            runnable: HeapQueue::new(QueueId::Runnable, deadline_key),
            pending: HeapQueue::new(QueueId::Pending, deadline_key),
            aperiodic: HeapQueue::new(QueueId::Aperiodic, aperiodic_priority_key),
            arrival: RingQueue::new(QueueId::Arrival),
            waiting: RingQueue::new(QueueId::Waiting),
            sleeping: RingQueue::new(QueueId::Sleeping),
            exited: RingQueue::new(QueueId::Exited),
            current: None,
            stats: diag::SchedStats::default(),
        }
    }

    /// Initialize a scheduler instance with `bootstrap` placed on the
    /// aperiodic queue, so there is always an eligible fallback thread.
    pub fn init(bootstrap: ThreadHandle) -> Self {
        let mut sched = Self::empty();
        let now = platform::now();
        let desc = ThreadDescriptor::new(
            ThreadClass::Aperiodic,
            Constraints::Aperiodic { priority: 0 },
            0,
            bootstrap,
        );
        let tid = sched
            .arena
            .alloc(desc)
            .expect("scheduler: arena exhausted during bootstrap");
        // The bootstrap thread starts as the CPU's running thread, not
        // merely eligible, so it is never parked on the aperiodic queue
        // itself -- the first reschedule() call enqueues it there like any
        // other preempted aperiodic thread.
        sched.arena.get_mut(tid).set_status(ThreadStatus::Admitted);
        sched.arena.get_mut(tid).set_status(ThreadStatus::Running);
        sched.current = Some(tid);
        sched.arena.get_mut(tid).start_time = now;
        sched
    }

    /// Create a new thread descriptor and push it onto the arrival queue.
    /// Deadline is seeded per class: periodic threads are always released
    /// immediately on admission, so `deadline` here is the first release
    /// time (`now`) rather than a completion deadline -- `admit` converts
    /// it to one via the same transform as a periodic re-release. Sporadic
    /// -> now + relative_deadline (fixed for the job's life). Aperiodic -> 0.
    pub fn create(
        &mut self,
        constraints: Constraints,
        relative_deadline: u64,
        handle: ThreadHandle,
    ) -> Result<ThreadId, SchedError> {
        let now = platform::now();
        let class = constraints.class();
        let deadline = match constraints {
            Constraints::Periodic { .. } => now,
            Constraints::Sporadic { .. } => now + relative_deadline,
            Constraints::Aperiodic { .. } => 0,
        };
        let desc = ThreadDescriptor::new(class, constraints, deadline, handle);
        let tid = self
            .arena
            .alloc(desc)
            .ok_or(SchedError::QueueFull(QueueId::Arrival))?;
        match self.arrival.enqueue(&mut self.arena, tid) {
            Ok(()) => Ok(tid),
            Err(err) => {
                self.arena.release(tid);
                diag::log_queue_error(err);
                Err(err)
            }
        }
    }

    /// Run admission for `tid` and, on acceptance, park it on runnable or
    /// pending per §4.6. Returns whether it was admitted.
    pub fn admit(&mut self, tid: ThreadId) -> bool {
        let now = platform::now();
        let desc = *self.arena.get(tid);
        let accepted = admission::admit(&desc, &self.runnable, &self.pending, &self.arena, now);

        if !accepted {
            diag::log_admit_reject(desc.class);
            self.bump_rejected(desc.class);
            return false;
        }

        self.arena.get_mut(tid).set_status(ThreadStatus::Admitted);
        diag::log_admit_accept(desc.class, tid);
        self.stats.admitted += 1;

        let target_pending = matches!(desc.class, ThreadClass::Periodic) && desc.deadline > now;
        let result = if desc.class == ThreadClass::Aperiodic {
            self.aperiodic.enqueue(&mut self.arena, tid)
        } else if target_pending {
            self.pending.enqueue(&mut self.arena, tid)
        } else {
            if desc.class == ThreadClass::Periodic {
                // First release is due now: convert the release-time
                // deadline seeded at creation into a completion deadline,
                // the same transform a periodic re-release applies.
                dispatcher::periodic_rerelease(&mut self.arena, tid, now);
            }
            self.runnable.enqueue(&mut self.arena, tid)
        };

        if let Err(err) = result {
            diag::log_queue_error(err);
        }
        true
    }

    fn bump_rejected(&mut self, class: ThreadClass) {
        match class {
            ThreadClass::Periodic => self.stats.rejected_periodic += 1,
            ThreadClass::Sporadic => self.stats.rejected_sporadic += 1,
            ThreadClass::Aperiodic => {}
        }
    }

    /// Mark `tid` as exiting and push it onto the exited ring. Leaves
    /// `current_queue` untouched so the housekeeper can still find wherever
    /// it is physically parked (if anywhere) and evict it from there.
    pub fn exit(&mut self, tid: ThreadId) -> Result<(), SchedError> {
        self.arena.get_mut(tid).set_status(ThreadStatus::ToBeRemoved);
        match self.exited.push_raw(tid) {
            Ok(()) => Ok(()),
            Err(err) => {
                diag::log_queue_error(err);
                Err(err)
            }
        }
    }

    /// The dispatcher entry point: bill `current`, drain releases, pick the
    /// next thread per §4.2, and program the timer. Returns the chosen
    /// thread's handle.
    pub fn reschedule(&mut self) -> ThreadHandle {
        let next = dispatcher::reschedule(self);
        self.current = Some(next);
        self.arena.get(next).handle
    }

    /// Drain arrival and exited per §4.7. Intended to be invoked from the
    /// housekeeper's own periodic release.
    pub fn housekeep(&mut self) {
        super::housekeeper::housekeep(self);
    }

    pub fn stats(&self) -> diag::SchedStats {
        let mut snapshot = self.stats;
        snapshot.runnable_len = self.runnable.len();
        snapshot.pending_len = self.pending.len();
        snapshot.aperiodic_len = self.aperiodic.len();
        snapshot
    }

    pub(super) fn record_deadline_miss(&mut self) {
        self.stats.deadline_misses += 1;
    }
}
