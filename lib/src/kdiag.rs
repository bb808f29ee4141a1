//! Diagnostic timestamps.
//!
//! [`kdiag_timestamp`] is the monotonic time base used for execution-time
//! metrics (e.g. the worst-case tick-sweep duration) and for stamping pend
//! completions. It accumulates TSC deltas so a core frequency change or a
//! TSC write can never make it run backwards.

use core::sync::atomic::{AtomicU64, Ordering};

use crate::tsc;

static MONOTONIC_TIME: AtomicU64 = AtomicU64::new(0);
static LAST_TSC: AtomicU64 = AtomicU64::new(0);

/// Monotonic diagnostic timestamp in TSC cycles.
pub fn kdiag_timestamp() -> u64 {
    let now = tsc::rdtsc();
    let last = LAST_TSC.load(Ordering::Relaxed);
    if now > last {
        MONOTONIC_TIME.fetch_add(now - last, Ordering::Relaxed);
        LAST_TSC.store(now, Ordering::Relaxed);
    }
    MONOTONIC_TIME.load(Ordering::Relaxed)
}
