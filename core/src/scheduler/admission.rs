//! Admission controller (§4.6): utilization-bound feasibility check run by
//! the housekeeper on each arrival-queue candidate.

use slopos_abi::{Constraints, MAX_QUEUE, PERIODIC_UTIL, SPORADIC_UTIL, ThreadClass, UTIL_SCALE};

use super::arena::Arena;
use super::queue::HeapQueue;
use super::thread::ThreadDescriptor;

/// Accept or reject `candidate` against the queue contents it would join.
/// Aperiodic candidates are always accepted (§4.6).
pub fn admit(
    candidate: &ThreadDescriptor,
    runnable: &HeapQueue<MAX_QUEUE>,
    pending: &HeapQueue<MAX_QUEUE>,
    arena: &Arena<MAX_QUEUE>,
    now: u64,
) -> bool {
    match candidate.class {
        ThreadClass::Aperiodic => true,
        ThreadClass::Periodic => periodic_feasible(candidate, runnable, pending, arena),
        ThreadClass::Sporadic => sporadic_feasible(runnable, arena, now),
    }
}

fn periodic_feasible(
    candidate: &ThreadDescriptor,
    runnable: &HeapQueue<MAX_QUEUE>,
    pending: &HeapQueue<MAX_QUEUE>,
    arena: &Arena<MAX_QUEUE>,
) -> bool {
    let mut util: u64 = 0;
    for tid in runnable.iter().chain(pending.iter()) {
        let desc = arena.get(tid);
        if let Constraints::Periodic { period, slice } = desc.constraints {
            util += slice * UTIL_SCALE / period;
        }
    }
    if let Constraints::Periodic { period, slice } = candidate.constraints {
        util += slice * UTIL_SCALE / period;
    }
    util <= PERIODIC_UTIL
}

/// §4.6: sums utilization over `runnable`'s existing sporadic members only
/// -- the candidate itself is not part of the sum, unlike the periodic
/// rule above.
fn sporadic_feasible(runnable: &HeapQueue<MAX_QUEUE>, arena: &Arena<MAX_QUEUE>, now: u64) -> bool {
    let mut util: u64 = 0;
    for tid in runnable.iter() {
        let desc = arena.get(tid);
        if desc.class == ThreadClass::Sporadic {
            if let Constraints::Sporadic { work } = desc.constraints {
                let relative = desc.deadline.saturating_sub(now).max(1);
                util += work * UTIL_SCALE / relative;
            }
        }
    }
    util <= SPORADIC_UTIL
}
