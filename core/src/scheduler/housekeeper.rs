//! §4.7's periodic housekeeping pass: admit what arrived, and finish
//! removing what exited.

use slopos_abi::QueueId;

use super::diag;
use super::queue::Queue;
use super::scheduler::Scheduler;

pub fn housekeep(sched: &mut Scheduler) {
    drain_arrivals(sched);
    drain_exits(sched);
}

fn drain_arrivals(sched: &mut Scheduler) {
    loop {
        match sched.arrival.dequeue(&mut sched.arena) {
            Ok(tid) => {
                sched.admit(tid);
            }
            Err(_) => break,
        }
    }
}

fn drain_exits(sched: &mut Scheduler) {
    while let Some(tid) = sched.exited.pop_raw() {
        let parked_on = sched.arena.get(tid).current_queue;
        let removed = match parked_on {
            QueueId::None | QueueId::Exited => Ok(tid),
            QueueId::Runnable => sched.runnable.remove_by_identity(&mut sched.arena, tid),
            QueueId::Pending => sched.pending.remove_by_identity(&mut sched.arena, tid),
            QueueId::Aperiodic => sched.aperiodic.remove_by_identity(&mut sched.arena, tid),
            QueueId::Arrival => sched.arrival.remove_by_identity(&mut sched.arena, tid),
            QueueId::Waiting => sched.waiting.remove_by_identity(&mut sched.arena, tid),
            QueueId::Sleeping => sched.sleeping.remove_by_identity(&mut sched.arena, tid),
        };
        if let Err(err) = removed {
            diag::log_queue_error(err);
        }

        sched.arena.get_mut(tid).current_queue = QueueId::None;
        // A dispatcher dequeue may already have finalized this descriptor
        // via the ToBeRemoved skip path; set_status no-ops if so.
        sched.arena.get_mut(tid).set_status(slopos_abi::ThreadStatus::Removed);
        sched.arena.release(tid);
        diag::log_descriptor_freed(tid);
    }
}
