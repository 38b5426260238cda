//! Per-CPU scheduler registry (§5 expansion): one `Scheduler` instance per
//! logical CPU, guarded by a single lock since the table itself is only
//! touched at boot (one-time instance creation) and during cross-CPU
//! diagnostics reads.

use slopos_abi::ThreadHandle;
use slopos_lib::IrqMutex;

use super::config::MAX_CPUS;
use super::scheduler::Scheduler;

static REGISTRY: IrqMutex<[Option<Scheduler>; MAX_CPUS]> = IrqMutex::new([const { None }; MAX_CPUS]);

/// Initialize the scheduler for `cpu_index`, seeding its aperiodic queue
/// with the bootstrap thread. Called once per CPU during boot.
pub fn init_scheduler(cpu_index: usize, bootstrap: ThreadHandle) {
    let mut table = REGISTRY.lock();
    assert!(cpu_index < MAX_CPUS, "registry: cpu_index out of range");
    assert!(
        table[cpu_index].is_none(),
        "registry: scheduler already initialized for this cpu"
    );
    table[cpu_index] = Some(Scheduler::init(bootstrap));
}

/// Run `f` against the scheduler owned by `cpu_index`, returning its
/// result. Panics if that CPU has no scheduler yet.
pub fn with_scheduler<R>(cpu_index: usize, f: impl FnOnce(&mut Scheduler) -> R) -> R {
    let mut table = REGISTRY.lock();
    let sched = table[cpu_index]
        .as_mut()
        .expect("registry: scheduler not initialized for this cpu");
    f(sched)
}

/// Whether `cpu_index` has an initialized scheduler.
pub fn is_initialized(cpu_index: usize) -> bool {
    let table = REGISTRY.lock();
    cpu_index < MAX_CPUS && table[cpu_index].is_some()
}
