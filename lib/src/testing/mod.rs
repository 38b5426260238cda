use core::ffi::c_int;

pub mod config;
pub mod harness;
mod runner;

mod assertions;
pub use config::{TestConfig, Verbosity, config_from_cmdline};
pub use harness::{
    HARNESS_MAX_SUITES, TestRunSummary, TestSuiteResult, cycles_to_ms, estimate_cycles_per_ms,
    measure_elapsed_ms,
};
pub use runner::run_single_test;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TestResult {
    Pass,
    Fail,
    Skipped,
}

impl TestResult {
    #[inline]
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }

    #[inline]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Fail)
    }

    #[inline]
    pub fn to_c_int(self) -> c_int {
        match self {
            Self::Pass | Self::Skipped => 0,
            Self::Fail => -1,
        }
    }
}

#[macro_export]
macro_rules! pass {
    () => {
        $crate::testing::TestResult::Pass
    };
}

#[macro_export]
macro_rules! fail {
    () => {
        $crate::testing::TestResult::Fail
    };
    ($msg:expr) => {{
        $crate::klog_info!("TEST FAIL: {}", $msg);
        $crate::testing::TestResult::Fail
    }};
    ($fmt:expr, $($arg:tt)*) => {{
        $crate::klog_info!(concat!("TEST FAIL: ", $fmt), $($arg)*);
        $crate::testing::TestResult::Fail
    }};
}

#[macro_export]
macro_rules! run_test {
    ($passed:expr, $total:expr, $test_fn:expr) => {{
        $total += 1;
        let result = $crate::testing::run_single_test(stringify!($test_fn), || $test_fn());
        if result.is_pass() {
            $passed += 1;
        }
        result
    }};

    ($test_fn:expr) => {{ $crate::testing::run_single_test(stringify!($test_fn), || $test_fn()) }};

    ($name:expr, $test_fn:expr) => {{ $crate::testing::run_single_test($name, || $test_fn()) }};
}

/// Registers a suite of scheduler tests, each a `fn() -> TestResult`, under
/// a named group. Mirrors the host kernel's test-registry convention, minus
/// the link-section auto-registration (there is no boot-time test runner in
/// this crate — suites are invoked directly, e.g. from an integration test
/// binary or a harness the embedding kernel provides).
#[macro_export]
macro_rules! define_test_suite {
    ($suite_name:ident, [$($test_fn:path),* $(,)?]) => {
        $crate::paste::paste! {
            #[doc = concat!("Run every test registered in the `", stringify!($suite_name), "` suite.")]
            pub fn [<run_ $suite_name _suite>]() -> $crate::testing::TestSuiteResult {
                let start = $crate::tsc::rdtsc();
                let mut passed = 0u32;
                let mut total = 0u32;

                $(
                    $crate::run_test!(passed, total, $test_fn);
                )*

                let elapsed = $crate::testing::measure_elapsed_ms(start, $crate::tsc::rdtsc());
                let mut result = $crate::testing::TestSuiteResult::new(core::ptr::null());
                result.fill(passed, total, elapsed);
                result
            }
        }
    };
}
