//! The dispatcher: §4.2's `reschedule` entry point, plus the periodic
//! re-release (§4.3), deadline check (§4.4), and timer programming (§4.5)
//! it calls into.

use slopos_abi::{Constraints, QUANTUM, SchedError, ThreadClass, ThreadId, ThreadStatus};

use super::arena::Arena;
use super::config::TIMER_SLACK;
use super::diag;
use super::platform;
use super::queue::Queue;
use super::scheduler::Scheduler;

/// Entry point invoked on every reschedule event. Bills the outgoing
/// thread, drains due releases from `pending`, selects the next thread per
/// `cur`'s class, programs the timer, and returns the chosen thread.
pub fn reschedule(sched: &mut Scheduler) -> ThreadId {
    let now = platform::now();
    let cur = sched
        .current
        .expect("dispatcher: reschedule called with no current thread");

    bill(sched, cur, now);
    drain_releases(sched, now);

    let class = sched.arena.get(cur).class;
    let next = match class {
        ThreadClass::Aperiodic => select_aperiodic(sched, cur),
        ThreadClass::Sporadic => select_sporadic(sched, cur),
        ThreadClass::Periodic => select_periodic(sched, cur, now),
    };

    diag::log_dispatch(cur, next, class_label(class));
    program_timer(sched, next, now);
    sched.arena.get_mut(next).set_status(ThreadStatus::Running);
    sched.arena.get_mut(next).start_time = now;
    next
}

fn class_label(class: ThreadClass) -> &'static str {
    match class {
        ThreadClass::Periodic => "periodic",
        ThreadClass::Sporadic => "sporadic",
        ThreadClass::Aperiodic => "aperiodic",
    }
}

fn bill(sched: &mut Scheduler, cur: ThreadId, now: u64) {
    let desc = sched.arena.get_mut(cur);
    desc.run_time += now.saturating_sub(desc.start_time);
    desc.exit_time = now;
}

fn drain_releases(sched: &mut Scheduler, now: u64) {
    loop {
        let Some(top) = sched.pending.peek(&sched.arena) else {
            break;
        };
        if sched.arena.get(top).deadline > now {
            break;
        }
        match sched.pending.dequeue(&mut sched.arena) {
            Ok(tid) => {
                periodic_rerelease(&mut sched.arena, tid, now);
                if let Err(err) = sched.runnable.enqueue(&mut sched.arena, tid) {
                    diag::log_queue_error(err);
                }
            }
            Err(err) => {
                diag::log_queue_error(err);
                break;
            }
        }
    }
}

/// §4.3: run_time resets and deadline advances by one period.
pub(super) fn periodic_rerelease(arena: &mut Arena<{ slopos_abi::MAX_QUEUE }>, tid: ThreadId, now: u64) {
    let desc = arena.get_mut(tid);
    if let Constraints::Periodic { period, .. } = desc.constraints {
        desc.deadline = now + period;
    }
    desc.run_time = 0;
}

/// §4.4: returns whether the just-stopped thread missed its deadline,
/// recording the counter and diagnostic as a side effect when it did.
fn deadline_check(sched: &mut Scheduler, tid: ThreadId) -> bool {
    let desc = *sched.arena.get(tid);
    let missed = desc.exit_time > desc.deadline;
    if missed {
        sched.record_deadline_miss();
        diag::log_deadline_miss(tid, desc.class, desc.deadline, desc.exit_time);
    }
    missed
}

fn select_aperiodic(sched: &mut Scheduler, cur: ThreadId) -> ThreadId {
    // Re-tag to accumulated run_time: an aging / longest-idle policy.
    let run_time = sched.arena.get(cur).run_time;
    sched.arena.get_mut(cur).constraints = Constraints::Aperiodic { priority: run_time };
    sched.arena.get_mut(cur).set_status(ThreadStatus::Admitted);
    if let Err(err) = sched.aperiodic.enqueue(&mut sched.arena, cur) {
        diag::log_queue_error(err);
    }

    if !sched.runnable.is_empty() {
        match sched.runnable.dequeue(&mut sched.arena) {
            Ok(tid) => return tid,
            Err(err) => diag::log_queue_error(err),
        }
    }
    dequeue_aperiodic_or_fatal(sched)
}

fn select_sporadic(sched: &mut Scheduler, cur: ThreadId) -> ThreadId {
    let desc = *sched.arena.get(cur);
    let Constraints::Sporadic { work } = desc.constraints else {
        unreachable!("select_sporadic called on a non-sporadic descriptor")
    };

    if desc.run_time >= work {
        deadline_check(sched, cur);
        // Job complete; not re-released (§I4). Parked nowhere until
        // something external re-creates or wakes it.
        sched.arena.get_mut(cur).set_status(ThreadStatus::Waiting);
        pick_from_runnable_else_aperiodic(sched)
    } else {
        preempt_or_keep(sched, cur, desc.deadline)
    }
}

fn select_periodic(sched: &mut Scheduler, cur: ThreadId, now: u64) -> ThreadId {
    let desc = *sched.arena.get(cur);
    let Constraints::Periodic { slice, .. } = desc.constraints else {
        unreachable!("select_periodic called on a non-periodic descriptor")
    };

    if desc.run_time >= slice {
        let missed = deadline_check(sched, cur);
        sched.arena.get_mut(cur).set_status(ThreadStatus::Admitted);
        if missed {
            if let Err(err) = sched.pending.enqueue(&mut sched.arena, cur) {
                diag::log_queue_error(err);
            }
        } else {
            periodic_rerelease(&mut sched.arena, cur, now);
            if let Err(err) = sched.runnable.enqueue(&mut sched.arena, cur) {
                diag::log_queue_error(err);
            }
        }
        pick_from_runnable_else_aperiodic(sched)
    } else {
        preempt_or_keep(sched, cur, desc.deadline)
    }
}

/// Preempt `cur` if `runnable`'s earliest deadline beats `cur_deadline`;
/// otherwise keep running `cur`. Shared by the sporadic and periodic
/// "slice not yet consumed" branches.
fn preempt_or_keep(sched: &mut Scheduler, cur: ThreadId, cur_deadline: u64) -> ThreadId {
    let Some(top) = sched.runnable.peek(&sched.arena) else {
        return cur;
    };
    if sched.arena.get(top).deadline >= cur_deadline {
        return cur;
    }
    sched.arena.get_mut(cur).set_status(ThreadStatus::Admitted);
    if let Err(err) = sched.runnable.enqueue(&mut sched.arena, cur) {
        diag::log_queue_error(err);
        return cur;
    }
    match sched.runnable.dequeue(&mut sched.arena) {
        Ok(tid) => tid,
        Err(err) => {
            diag::log_queue_error(err);
            cur
        }
    }
}

fn pick_from_runnable_else_aperiodic(sched: &mut Scheduler) -> ThreadId {
    if !sched.runnable.is_empty() {
        match sched.runnable.dequeue(&mut sched.arena) {
            Ok(tid) => return tid,
            Err(err) => diag::log_queue_error(err),
        }
    }
    dequeue_aperiodic_or_fatal(sched)
}

fn dequeue_aperiodic_or_fatal(sched: &mut Scheduler) -> ThreadId {
    match sched.aperiodic.dequeue(&mut sched.arena) {
        Ok(tid) => tid,
        Err(_) => {
            diag::log_queue_error(SchedError::Fatal);
            panic!("SCHED: fatal - dispatch found no eligible thread (aperiodic empty)")
        }
    }
}

/// §4.5: arm the timer to the minimum of `next`'s remaining budget and the
/// gap until the earliest pending release, plus a configurable slack on
/// the budget term (zero by default).
fn program_timer(sched: &Scheduler, next: ThreadId, now: u64) {
    let desc = sched.arena.get(next);
    let budget = match desc.constraints {
        Constraints::Periodic { slice, .. } => slice.saturating_sub(desc.run_time),
        Constraints::Sporadic { work } => work.saturating_sub(desc.run_time),
        Constraints::Aperiodic { .. } => QUANTUM,
    };

    let mut interval = budget.saturating_add(TIMER_SLACK);
    if let Some(near) = sched.pending.peek(&sched.arena) {
        let gap = sched.arena.get(near).deadline.saturating_sub(now);
        interval = interval.min(gap);
    }

    platform::timer_oneshot(interval);
}
