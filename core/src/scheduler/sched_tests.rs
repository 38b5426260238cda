//! Scheduler test suite: universal invariants, admission bounds, and the
//! end-to-end dispatch scenarios the design was built against.

use core::sync::atomic::{AtomicU64, Ordering};

use slopos_abi::{Constraints, QUANTUM, QueueId, ThreadHandle, ThreadId};
use slopos_lib::testing::TestResult;
use slopos_lib::{define_test_suite, fail, pass};

use super::dispatcher;
use super::housekeeper;
use super::platform;
use super::queue::Queue;
use super::scheduler::Scheduler;

static TEST_CLOCK: AtomicU64 = AtomicU64::new(0);

fn test_now() -> u64 {
    TEST_CLOCK.load(Ordering::Relaxed)
}

fn set_clock(t: u64) {
    TEST_CLOCK.store(t, Ordering::Relaxed);
    platform::register_now(test_now);
}

fn advance_clock(dt: u64) -> u64 {
    let next = TEST_CLOCK.load(Ordering::Relaxed) + dt;
    TEST_CLOCK.store(next, Ordering::Relaxed);
    next
}

fn new_scheduler() -> Scheduler {
    set_clock(0);
    Scheduler::init(ThreadHandle(0))
}

fn create_and_admit(sched: &mut Scheduler, constraints: Constraints, relative_deadline: u64, handle: u64) -> bool {
    let tid = sched
        .create(constraints, relative_deadline, ThreadHandle(handle))
        .expect("arena has room");
    housekeeper::housekeep(sched);
    sched.arena.get(tid).status == slopos_abi::ThreadStatus::Admitted
}

/// Detach `tid` from wherever admission parked it and make it the CPU's
/// current thread, as it would be partway through its own quantum.
fn become_current(sched: &mut Scheduler, tid: ThreadId) {
    match sched.arena.get(tid).current_queue {
        QueueId::Runnable => {
            sched.runnable.remove_by_identity(&mut sched.arena, tid).unwrap();
        }
        QueueId::Pending => {
            sched.pending.remove_by_identity(&mut sched.arena, tid).unwrap();
        }
        QueueId::Aperiodic => {
            sched.aperiodic.remove_by_identity(&mut sched.arena, tid).unwrap();
        }
        _ => {}
    }
    sched.current = Some(tid);
}

// ---------------------------------------------------------------------------
// P1: a thread is parked on exactly one queue (or none) at any time.
// ---------------------------------------------------------------------------

fn test_single_queue_membership() -> TestResult {
    let mut sched = new_scheduler();
    let periodic = Constraints::Periodic { period: 1000, slice: 100 };
    let tid = sched
        .create(periodic, 0, ThreadHandle(1))
        .expect("room in arena");
    housekeeper::housekeep(&mut sched);

    let on_runnable = sched.runnable.iter().any(|t| t == tid);
    let on_pending = sched.pending.iter().any(|t| t == tid);
    if on_runnable == on_pending {
        return fail!("thread parked on zero or both of runnable/pending");
    }
    pass!()
}

// ---------------------------------------------------------------------------
// P2 / admission: periodic utilization bound.
// ---------------------------------------------------------------------------

fn test_periodic_admission_accepts_within_bound() -> TestResult {
    let mut sched = new_scheduler();
    // 100/1000 = 0.10 of a CPU, well under PERIODIC_UTIL.
    let admitted = create_and_admit(
        &mut sched,
        Constraints::Periodic { period: 1000, slice: 100 },
        0,
        1,
    );
    if !admitted {
        return fail!("periodic thread under the utilization bound was rejected");
    }
    pass!()
}

fn test_periodic_admission_rejects_over_bound() -> TestResult {
    let mut sched = new_scheduler();
    // A{1000,100} + B{500,50} = 0.10 + 0.10 = 0.20, then C{100,80} = 0.80 more,
    // pushing total utilization past PERIODIC_UTIL (0.65).
    assert!(create_and_admit(
        &mut sched,
        Constraints::Periodic { period: 1000, slice: 100 },
        0,
        1
    ));
    assert!(create_and_admit(
        &mut sched,
        Constraints::Periodic { period: 500, slice: 50 },
        0,
        2
    ));
    let admitted = create_and_admit(
        &mut sched,
        Constraints::Periodic { period: 100, slice: 80 },
        0,
        3,
    );
    if admitted {
        return fail!("over-subscribing periodic thread was admitted");
    }
    if sched.stats().rejected_periodic != 1 {
        return fail!("rejection counter did not advance");
    }
    pass!()
}

fn test_sporadic_admission_bound() -> TestResult {
    let mut sched = new_scheduler();
    // Place a sporadic thread directly on runnable whose own utilization
    // (work=100 over a relative deadline of 100, i.e. 1.0) alone already
    // exceeds SPORADIC_UTIL (0.18) -- independent of any later candidate.
    let hog = sched
        .create(Constraints::Sporadic { work: 100 }, 100, ThreadHandle(1))
        .unwrap();
    sched.arrival.dequeue(&mut sched.arena).unwrap();
    sched.arena.get_mut(hog).set_status(slopos_abi::ThreadStatus::Admitted);
    sched.runnable.enqueue(&mut sched.arena, hog).unwrap();

    // A trivial second candidate must still be rejected, since the bound
    // is already exceeded by runnable's existing sporadic members alone.
    let admitted = create_and_admit(&mut sched, Constraints::Sporadic { work: 1 }, 1000, 2);
    if admitted {
        return fail!("sporadic admission should reject once runnable's existing members alone exceed the utilization bound");
    }
    pass!()
}

fn test_aperiodic_always_admitted() -> TestResult {
    let mut sched = new_scheduler();
    let admitted = create_and_admit(&mut sched, Constraints::Aperiodic { priority: 0 }, 0, 1);
    if !admitted {
        return fail!("aperiodic candidates must always be admitted");
    }
    pass!()
}

// ---------------------------------------------------------------------------
// S1: two periodic threads, earliest deadline runs first.
// ---------------------------------------------------------------------------

fn test_two_periodic_edf_order() -> TestResult {
    let mut sched = new_scheduler();
    let a = Constraints::Periodic { period: 1000, slice: 100 };
    let b = Constraints::Periodic { period: 500, slice: 50 };

    let tid_a = sched.create(a, 0, ThreadHandle(1)).unwrap();
    let tid_b = sched.create(b, 0, ThreadHandle(2)).unwrap();
    housekeeper::housekeep(&mut sched);

    // Both threads are released immediately (first job due now) and land
    // on runnable with deadline == period. B's deadline (500) is earlier
    // than A's (1000), so it runs first once the bootstrap aperiodic
    // thread yields.
    if sched.arena.get(tid_a).deadline != 1000 || sched.arena.get(tid_b).deadline != 500 {
        return fail!("periodic admission did not seed the first completion deadline");
    }
    let next = dispatcher::reschedule(&mut sched);
    if next != sched.arena.get(tid_b).handle {
        return fail!("expected earlier-deadline thread B to be dispatched first");
    }
    pass!()
}

// ---------------------------------------------------------------------------
// S2: aperiodic re-tagging to accumulated run_time, runnable preferred.
// ---------------------------------------------------------------------------

fn test_aperiodic_preempted_by_runnable() -> TestResult {
    let mut sched = new_scheduler();
    let ap = sched
        .create(Constraints::Aperiodic { priority: 0 }, 0, ThreadHandle(1))
        .unwrap();
    housekeeper::housekeep(&mut sched);

    become_current(&mut sched, ap);
    sched.arena.get_mut(ap).run_time = 500;

    let periodic = sched
        .create(Constraints::Periodic { period: 1000, slice: 100 }, 0, ThreadHandle(2))
        .unwrap();
    // Bypass admission's housekeeping path to place it directly on runnable,
    // simulating a thread released mid-quantum.
    sched.arena.get_mut(periodic).set_status(slopos_abi::ThreadStatus::Admitted);
    sched.runnable.enqueue(&mut sched.arena, periodic).unwrap();

    let next = dispatcher::reschedule(&mut sched);
    if next != sched.arena.get(periodic).handle {
        return fail!("runnable thread should preempt an aperiodic thread at dispatch");
    }
    // The preempted aperiodic thread's priority should now read its run_time.
    if let Constraints::Aperiodic { priority } = sched.arena.get(ap).constraints {
        if priority != 500 {
            return fail!("aperiodic priority was not re-tagged to accumulated run_time");
        }
    } else {
        return fail!("aperiodic descriptor lost its Aperiodic constraints");
    }
    pass!()
}

fn test_aperiodic_quantum_used_as_timer_budget() -> TestResult {
    let mut sched = new_scheduler();
    let ap = sched
        .create(Constraints::Aperiodic { priority: 0 }, 0, ThreadHandle(1))
        .unwrap();
    housekeeper::housekeep(&mut sched);
    become_current(&mut sched, ap);

    let next = dispatcher::reschedule(&mut sched);
    if next != sched.arena.get(ap).handle {
        return fail!("sole aperiodic thread should remain scheduled");
    }
    pass!()
}

// ---------------------------------------------------------------------------
// S3: sporadic job runs to completion, no re-release.
// ---------------------------------------------------------------------------

fn test_sporadic_runs_to_completion_no_rerelease() -> TestResult {
    let mut sched = new_scheduler();
    let s = sched
        .create(Constraints::Sporadic { work: 200 }, 300, ThreadHandle(1))
        .unwrap();
    housekeeper::housekeep(&mut sched);

    become_current(&mut sched, s);
    advance_clock(200);
    sched.arena.get_mut(s).run_time = 200; // work consumed

    let _next = dispatcher::reschedule(&mut sched);
    if sched.pending.iter().any(|t| t == s) {
        return fail!("completed sporadic job must not be re-released onto pending");
    }
    if sched.runnable.iter().any(|t| t == s) {
        return fail!("completed sporadic job must not be re-released onto runnable");
    }
    pass!()
}

// ---------------------------------------------------------------------------
// S5: preemption by a thread with an earlier deadline.
// ---------------------------------------------------------------------------

fn test_periodic_preempted_by_earlier_deadline() -> TestResult {
    let mut sched = new_scheduler();
    let slow = sched
        .create(Constraints::Periodic { period: 1000, slice: 100 }, 0, ThreadHandle(1))
        .unwrap();
    housekeeper::housekeep(&mut sched);
    become_current(&mut sched, slow);
    sched.arena.get_mut(slow).run_time = 10; // slice not yet consumed

    let urgent = sched
        .create(Constraints::Periodic { period: 50, slice: 10 }, 0, ThreadHandle(2))
        .unwrap();
    sched.arena.get_mut(urgent).set_status(slopos_abi::ThreadStatus::Admitted);
    sched.arena.get_mut(urgent).deadline = 50; // its own period, well before slow's 1000
    sched.runnable.enqueue(&mut sched.arena, urgent).unwrap();

    let next = dispatcher::reschedule(&mut sched);
    if next != sched.arena.get(urgent).handle {
        return fail!("thread with earlier deadline should preempt a mid-slice thread");
    }
    if !sched.runnable.iter().any(|t| t == slow) {
        return fail!("preempted thread should be put back on runnable");
    }
    pass!()
}

// ---------------------------------------------------------------------------
// S6: a ToBeRemoved descriptor is skipped transparently on dequeue.
// ---------------------------------------------------------------------------

fn test_tobe_removed_skipped_on_dequeue() -> TestResult {
    let mut sched = new_scheduler();
    let a = sched
        .create(Constraints::Aperiodic { priority: 5 }, 0, ThreadHandle(1))
        .unwrap();
    let b = sched
        .create(Constraints::Aperiodic { priority: 10 }, 0, ThreadHandle(2))
        .unwrap();
    housekeeper::housekeep(&mut sched);

    sched.exit(a).expect("exit should succeed");
    // `a` is still parked on `aperiodic` (current_queue untouched by exit()).
    match sched.aperiodic.dequeue(&mut sched.arena) {
        Ok(tid) if tid == b => {}
        Ok(_) => return fail!("dequeue returned the ToBeRemoved thread instead of skipping it"),
        Err(_) => return fail!("dequeue should still find the remaining live thread"),
    }
    if sched.arena.get(a).status != slopos_abi::ThreadStatus::Removed {
        return fail!("skipped ToBeRemoved descriptor should finalize to Removed");
    }
    pass!()
}

fn test_housekeeper_frees_exited_descriptor() -> TestResult {
    let mut sched = new_scheduler();
    let before = sched.arena.occupied_count();
    let a = sched
        .create(Constraints::Aperiodic { priority: 0 }, 0, ThreadHandle(1))
        .unwrap();
    housekeeper::housekeep(&mut sched);
    sched.exit(a).expect("exit should succeed");
    housekeeper::housekeep(&mut sched);

    if sched.arena.occupied_count() != before {
        return fail!("exited descriptor's arena slot was not freed");
    }
    pass!()
}

// ---------------------------------------------------------------------------
// Timer programming (§4.5): armed interval never exceeds the remaining
// budget nor the gap to the next pending release.
// ---------------------------------------------------------------------------

fn test_timer_budget_matches_quantum_when_alone() -> TestResult {
    let mut sched = new_scheduler();
    static ARMED: AtomicU64 = AtomicU64::new(0);
    fn capture(ticks: u64) {
        ARMED.store(ticks, Ordering::Relaxed);
    }
    platform::register_timer_oneshot(capture);

    let ap = sched
        .create(Constraints::Aperiodic { priority: 0 }, 0, ThreadHandle(1))
        .unwrap();
    housekeeper::housekeep(&mut sched);
    become_current(&mut sched, ap);

    let _ = dispatcher::reschedule(&mut sched);
    if ARMED.load(Ordering::Relaxed) != QUANTUM {
        return fail!("sole aperiodic thread should be armed for exactly QUANTUM ticks");
    }
    pass!()
}

define_test_suite!(
    scheduler,
    [
        test_single_queue_membership,
        test_periodic_admission_accepts_within_bound,
        test_periodic_admission_rejects_over_bound,
        test_sporadic_admission_bound,
        test_aperiodic_always_admitted,
        test_two_periodic_edf_order,
        test_aperiodic_preempted_by_runnable,
        test_aperiodic_quantum_used_as_timer_budget,
        test_sporadic_runs_to_completion_no_rerelease,
        test_periodic_preempted_by_earlier_deadline,
        test_tobe_removed_skipped_on_dequeue,
        test_housekeeper_frees_exited_descriptor,
        test_timer_budget_matches_quantum_when_alone,
    ]
);
