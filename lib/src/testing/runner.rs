use super::TestResult;

/// Run a single test closure, logging its name and outcome.
///
/// The host kernel's runner additionally wraps this in a panic-recovery
/// longjmp; this crate targets `panic = "abort"` like the rest of the
/// scheduler, so a panicking test takes down the whole suite run exactly
/// as a real dispatch-time panic would.
pub fn run_single_test<F: FnOnce() -> TestResult>(name: &str, test_fn: F) -> TestResult {
    let result = test_fn();
    if result.is_failure() {
        crate::klog_info!("TEST: {} FAILED", name);
    } else {
        crate::klog_debug!("TEST: {} passed", name);
    }
    result
}
