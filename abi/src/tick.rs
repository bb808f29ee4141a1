//! Tick and timing-wheel ABI.
//!
//! All delay and timeout arithmetic is done in wrapping 32-bit tick units.
//! Wraparound is not an error condition: "already due" is detected by the
//! unsigned subtraction `time - ctr - 1` landing beyond [`TICK_HORIZON`],
//! which caps the representable delay at half the counter range.

/// Free-running kernel tick counter unit. Wraps on overflow.
pub type Tick = u32;

/// Maximum schedulable distance into the future, in ticks.
///
/// Derived from the tick width: anything further than half the counter
/// range is indistinguishable from a match tick in the past.
pub const TICK_HORIZON: Tick = Tick::MAX / 2;

/// Number of spokes in the tick wheel.
///
/// Sized at roughly `MAX_TASKS / 4` so that a fully loaded kernel averages
/// a handful of entries per spoke.
pub const TICK_WHEEL_SIZE: usize = 8;

/// How the `time` argument of a tick-wheel insert is interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickMode {
    /// `time` is a delay relative to the current tick counter.
    Delay,
    /// Same arithmetic as `Delay`, but arming a pend timeout.
    Timeout,
    /// `time` is a period; successive waits are anchored to the previous
    /// match tick so the period does not drift.
    Periodic,
    /// `time` is an absolute tick-counter value to match.
    Match,
}
