// Test harness types. Suites are auto-registered via
// #[link_section = ".test_registry"] in define_test_suite!.

use core::ffi::c_char;
use core::ptr;

/// Maximum number of test suites that can be registered.
pub const HARNESS_MAX_SUITES: usize = 16;

/// Default cycles per millisecond estimate (3 GHz).
const DEFAULT_CYCLES_PER_MS: u64 = 3_000_000;

/// Result of executing a single test suite.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct TestSuiteResult {
    pub name: *const c_char,
    pub total: u32,
    pub passed: u32,
    pub failed: u32,
    pub elapsed_ms: u32,
}

impl Default for TestSuiteResult {
    fn default() -> Self {
        Self {
            name: ptr::null(),
            total: 0,
            passed: 0,
            failed: 0,
            elapsed_ms: 0,
        }
    }
}

impl TestSuiteResult {
    /// Check if all tests in this suite passed.
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

pub type SuiteRunnerFn = fn(*mut TestSuiteResult) -> i32;

#[repr(C)]
#[derive(Clone, Copy)]
pub struct TestSuiteDesc {
    pub name: *const c_char,
    pub run: Option<SuiteRunnerFn>,
}

// SAFETY: TestSuiteDesc contains only raw pointers to static data and
// function pointers, which are read-only after registration.
unsafe impl Sync for TestSuiteDesc {}

/// Measure elapsed time in milliseconds between two TSC readings.
///
/// Uses a fixed cycles-per-ms estimate; suite timing is coarse diagnostics,
/// not a benchmark.
#[inline]
pub fn measure_elapsed_ms(start: u64, end: u64) -> u32 {
    let ms = end.wrapping_sub(start) / DEFAULT_CYCLES_PER_MS;
    if ms > u32::MAX as u64 {
        return u32::MAX;
    }
    ms as u32
}
