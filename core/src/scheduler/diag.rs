//! Scheduler diagnostics: one leveled log line per admission decision,
//! queue condition, deadline miss, and dispatch transition, plus the
//! counters `stats()` exposes.

use slopos_abi::{QueueId, SchedError, ThreadClass, ThreadId};
use slopos_lib::{klog_debug, klog_warn};

/// Read-only snapshot of a scheduler's counters, for diagnostics and tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct SchedStats {
    pub admitted: u32,
    pub rejected_periodic: u32,
    pub rejected_sporadic: u32,
    pub deadline_misses: u32,
    pub runnable_len: usize,
    pub pending_len: usize,
    pub aperiodic_len: usize,
}

pub fn log_admit_accept(class: ThreadClass, tid: ThreadId) {
    klog_debug!("SCHED: admit accept class={:?} tid={:?}", class, tid);
}

pub fn log_admit_reject(class: ThreadClass) {
    klog_warn!("SCHED: admit reject class={:?} (utilization bound exceeded)", class);
}

pub fn log_queue_error(err: SchedError) {
    match err {
        // The aperiodic queue always has the idle thread as a fallback;
        // dropping an enqueue onto it is silent, not logged.
        SchedError::QueueFull(QueueId::Aperiodic) => {}
        SchedError::QueueFull(q) => klog_warn!("SCHED: queue {:?} full, dropping", q),
        SchedError::QueueEmpty(q) => klog_debug!("SCHED: queue {:?} empty", q),
        SchedError::NotFound(q, tid) => {
            klog_warn!("SCHED: tid={:?} not found on queue {:?}", tid, q)
        }
        SchedError::Fatal => klog_warn!("SCHED: fatal dispatch condition"),
    }
}

pub fn log_deadline_miss(tid: ThreadId, class: ThreadClass, deadline: u64, exit_time: u64) {
    klog_warn!(
        "SCHED: deadline miss tid={:?} class={:?} deadline={} exit_time={}",
        tid,
        class,
        deadline,
        exit_time
    );
}

pub fn log_dispatch(cur: ThreadId, next: ThreadId, branch: &str) {
    klog_debug!("SCHED: dispatch {:?} -> {:?} ({})", cur, next, branch);
}

pub fn log_descriptor_freed(tid: ThreadId) {
    klog_debug!("SCHED: freed tid={:?}", tid);
}
