//! Kernel time: the tick wheel, delays and the tick driver task.
//!
//! The free functions here are the public surface; they take the task
//! table lock first and the tick state lock second. Everything below them
//! operates on explicit `&mut` state and is directly testable.

pub mod tick_task;
pub mod wheel;

pub mod tick_task_tests;

use tickos_abi::task::TaskState;
use tickos_abi::tick::{Tick, TickMode};
use tickos_lib::IrqMutex;

use crate::scheduler::readyqueue;
use crate::scheduler::task;
use crate::time::wheel::{TickError, TickState};

static TICK_STATE: IrqMutex<TickState> = IrqMutex::new(TickState::new());

/// Empty all wheel spokes.
pub fn tick_wheel_init() {
    TICK_STATE.lock().init();
}

/// Reset counter, spokes and the worst-case scan metric.
pub fn tick_reset() {
    TICK_STATE.lock().reset();
}

/// Schedule a timed wait for `id` and link it into the wheel.
pub fn tick_list_insert(id: u32, time: Tick, mode: TickMode) -> Result<(), TickError> {
    let mut tasks = task::table().lock();
    TICK_STATE.lock().insert(&mut tasks, id, time, mode)
}

/// Unlink `id` from the wheel. No-op if it is not linked.
pub fn tick_list_remove(id: u32) {
    let mut tasks = task::table().lock();
    TICK_STATE.lock().remove(&mut tasks, id);
}

/// Advance the tick counter by one and expire due waits.
pub fn tick_list_update() {
    let mut tasks = task::table().lock();
    TICK_STATE.lock().update(&mut tasks);
}

pub fn tick_reset_peak() {
    TICK_STATE.lock().reset_peak();
}

/// Current value of the tick counter.
pub fn tick_ctr() -> Tick {
    TICK_STATE.lock().ctr()
}

/// Set the tick counter, normally only while the wheel is empty.
pub fn tick_set_ctr(ctr: Tick) {
    TICK_STATE.lock().set_ctr(ctr);
}

pub fn tick_spoke_stats(spoke: usize) -> Option<(u16, u16)> {
    TICK_STATE.lock().spoke_stats(spoke)
}

/// Worst-case duration of a single wheel update, in timestamp units.
pub fn tick_update_time_max() -> u64 {
    TICK_STATE.lock().update_time_max()
}

/// Put the calling task to sleep for `time` ticks.
///
/// `mode` selects how the expiry tick is derived; `Timeout` is reserved
/// for pends and is rejected here. On success the task leaves the ready
/// queues and is woken by the tick driver when the wait expires.
pub fn time_dly(id: u32, time: Tick, mode: TickMode) -> Result<(), TickError> {
    if mode == TickMode::Timeout {
        return Err(TickError::InvalidMode);
    }
    let mut tasks = task::table().lock();
    TICK_STATE.lock().insert(&mut tasks, id, time, mode)?;
    if let Some(t) = tasks.get_mut(id) {
        readyqueue::ready_remove(id, t.priority);
        t.state = TaskState::Delayed;
    }
    Ok(())
}

/// Cut a delay short, making the task ready now.
pub fn time_dly_resume(id: u32) -> Result<(), TickError> {
    let mut tasks = task::table().lock();
    let mut state = TICK_STATE.lock();
    let Some(t) = tasks.get(id) else {
        return Err(TickError::InvalidTask);
    };
    match t.state {
        TaskState::Delayed => {
            state.remove(&mut tasks, id);
            if let Some(t) = tasks.get_mut(id) {
                t.state = TaskState::Ready;
                readyqueue::make_task_ready(t);
            }
            Ok(())
        }
        TaskState::DelayedSuspended => {
            state.remove(&mut tasks, id);
            if let Some(t) = tasks.get_mut(id) {
                t.state = TaskState::Suspended;
            }
            Ok(())
        }
        _ => Err(TickError::NotDelayed),
    }
}
