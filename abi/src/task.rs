//! Task ABI types shared between kernel subsystems.
//!
//! The task state machine has three independent dimensions folded into one
//! discriminant: whether the task is runnable, whether it is waiting on a
//! tick-driven wait (a pure delay or a pend with a timeout), and whether it
//! has been suspended on top of that. The combined states are what the tick
//! sweep dispatches on, so the full product is spelled out rather than
//! split across flag bits.

use bitflags::bitflags;

// --- Task configuration ---

pub const MAX_TASKS: usize = 32;
pub const TASK_NAME_MAX_LEN: usize = 32;
pub const TASK_STACK_SIZE_MIN: u64 = 0x1000; // 4 KiB
pub const INVALID_TASK_ID: u32 = 0xFFFF_FFFF;

// --- TaskState ---

/// Combined task state, dispatched on by the tick sweep.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TaskState {
    /// Runnable, sitting in (or about to enter) the ready queue.
    #[default]
    Ready = 0,
    /// Waiting for a delay to expire.
    Delayed = 1,
    /// Waiting on a kernel object with no timeout.
    Pending = 2,
    /// Waiting on a kernel object, with a tick-driven timeout armed.
    PendingTimeout = 3,
    /// Suspended; not waiting on anything tick-driven.
    Suspended = 4,
    /// Delayed, then suspended on top of the delay.
    DelayedSuspended = 5,
    /// Pending without timeout, then suspended.
    PendingSuspended = 6,
    /// Pending with timeout, then suspended.
    PendingTimeoutSuspended = 7,
}

impl TaskState {
    #[inline]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Ready,
            1 => Self::Delayed,
            2 => Self::Pending,
            3 => Self::PendingTimeout,
            4 => Self::Suspended,
            5 => Self::DelayedSuspended,
            6 => Self::PendingSuspended,
            7 => Self::PendingTimeoutSuspended,
            _ => Self::Ready,
        }
    }

    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// True for the two states whose wait is a pure delay.
    #[inline]
    pub const fn is_delayed(self) -> bool {
        matches!(self, Self::Delayed | Self::DelayedSuspended)
    }

    /// True when a suspension is stacked on top of whatever else the task
    /// is doing.
    #[inline]
    pub const fn is_suspended(self) -> bool {
        matches!(
            self,
            Self::Suspended
                | Self::DelayedSuspended
                | Self::PendingSuspended
                | Self::PendingTimeoutSuspended
        )
    }

    /// True when the task should be linked into the tick wheel.
    #[inline]
    pub const fn is_tick_wait(self) -> bool {
        matches!(
            self,
            Self::Delayed
                | Self::PendingTimeout
                | Self::DelayedSuspended
                | Self::PendingTimeoutSuspended
        )
    }
}

// --- Pend bookkeeping ---

/// Outcome of the most recent pend operation, recorded on the task.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PendStatus {
    /// The pend completed normally (object posted / signal received).
    #[default]
    Ok = 0,
    /// The pend was abandoned because its timeout expired.
    Timeout = 1,
    /// The pend was aborted by another task.
    Abort = 2,
}

/// Which kind of kernel object a task is pending on, if any.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PendOn {
    #[default]
    Nothing = 0,
    Semaphore = 1,
    /// The task's own built-in counting signal (used by the tick task).
    TaskSignal = 2,
}

bitflags! {
    /// Per-task flag bits.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct TaskFlags: u16 {
        /// Task runs entirely in kernel mode.
        const KERNEL_MODE = 1 << 0;
        /// Task is kernel infrastructure, never deleted by user request.
        const SYSTEM = 1 << 1;
        /// This is the dedicated tick-driver task.
        const TICK_TASK = 1 << 2;
    }
}

// --- Priorities ---
//
// Lower numeric value is higher priority. The idle priority is reserved:
// exactly one task (the idle task) may sit there, and the tick task must
// be the only task at the priority directly above it.

pub const TASK_PRIO_LEVELS: u8 = 8;
pub const TASK_PRIO_HIGHEST: u8 = 0;
pub const TASK_PRIO_IDLE: u8 = TASK_PRIO_LEVELS - 1;
pub const TASK_PRIO_TICK: u8 = TASK_PRIO_IDLE - 1;
