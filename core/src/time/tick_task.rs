//! Tick driver task.
//!
//! The timer interrupt never walks the wheel itself; it only posts the
//! tick signal. A dedicated high-priority task consumes the signal and
//! runs the wheel update at task level, so interrupt latency stays bounded
//! regardless of how many waits expire on a given tick.

use core::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use spin::Once;

use tickos_abi::task::{PendOn, TASK_PRIO_IDLE, TASK_STACK_SIZE_MIN, TaskFlags, TaskState};
use tickos_lib::{cpu, kdiag_timestamp, klog_error, klog_info};

use crate::kernel;
use crate::scheduler::task;
use crate::time;

/// Placement of the tick driver task.
#[derive(Clone, Copy, Debug)]
pub struct TickTaskConfig {
    pub stack_base: u64,
    pub stack_size: u64,
    pub priority: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickTaskInitError {
    InvalidStack,
    UndersizedStack,
    InvalidPriority,
    AlreadyInitialized,
    CreateFailed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignalWaitError {
    NotInitialized,
}

static TICK_TASK_ID: Once<u32> = Once::new();

/// Signal counter posted by the timer interrupt and drained by the driver
/// task. Kept outside the task table so the interrupt path never takes a
/// lock.
static TICK_SEM_COUNT: AtomicU32 = AtomicU32::new(0);
static TICK_SEM_TS: AtomicU64 = AtomicU64::new(0);

pub fn tick_task_id() -> Option<u32> {
    TICK_TASK_ID.get().copied()
}

/// Create the tick driver task and reset the timing state.
///
/// The stack and priority are validated before anything is touched in the
/// task table. The driver must sit above the idle priority; by convention
/// it runs at [`tickos_abi::task::TASK_PRIO_TICK`].
pub fn tick_task_init(config: &TickTaskConfig) -> Result<u32, TickTaskInitError> {
    if config.stack_base == 0 {
        return Err(TickTaskInitError::InvalidStack);
    }
    if config.stack_size < TASK_STACK_SIZE_MIN {
        return Err(TickTaskInitError::UndersizedStack);
    }
    if config.priority >= TASK_PRIO_IDLE {
        return Err(TickTaskInitError::InvalidPriority);
    }
    if TICK_TASK_ID.is_completed() {
        return Err(TickTaskInitError::AlreadyInitialized);
    }

    time::tick_reset();

    let id = task::task_create(
        "tick",
        config.priority,
        TaskFlags::KERNEL_MODE | TaskFlags::SYSTEM | TaskFlags::TICK_TASK,
        config.stack_base,
        config.stack_size,
    )
    .map_err(|err| {
        klog_error!("tick: driver task creation failed: {:?}", err);
        TickTaskInitError::CreateFailed
    })?;

    TICK_TASK_ID.call_once(|| id);
    klog_info!(
        "tick: driver task {} created at priority {}",
        id,
        config.priority
    );
    Ok(id)
}

/// Post one tick signal. Called from the timer interrupt handler.
pub fn tick_signal() {
    TICK_SEM_TS.store(kdiag_timestamp(), Ordering::Relaxed);
    TICK_SEM_COUNT.fetch_add(1, Ordering::Release);
}

/// Consume one tick signal, blocking until one is available.
///
/// Returns the timestamp recorded when the signal was posted, for measuring
/// signal-to-update latency.
pub fn tick_sem_pend() -> Result<u64, SignalWaitError> {
    loop {
        let count = TICK_SEM_COUNT.load(Ordering::Acquire);
        if count > 0
            && TICK_SEM_COUNT
                .compare_exchange(count, count - 1, Ordering::AcqRel, Ordering::Relaxed)
                .is_ok()
        {
            set_driver_wait_state(TaskState::Ready, PendOn::Nothing);
            return Ok(TICK_SEM_TS.load(Ordering::Relaxed));
        }

        if tick_task_id().is_none() {
            return Err(SignalWaitError::NotInitialized);
        }
        set_driver_wait_state(TaskState::Pending, PendOn::TaskSignal);
        cpu::halt();
    }
}

/// One iteration of the driver loop: wait for a signal, then run the tick
/// update if the kernel is running. Returns whether an update ran.
pub fn tick_task_run_once() -> Result<bool, SignalWaitError> {
    let _signal_ts = tick_sem_pend()?;
    if !kernel::is_running() {
        return Ok(false);
    }
    time::tick_list_update();
    Ok(true)
}

/// Main loop of the tick driver task.
pub fn tick_task_body() -> ! {
    loop {
        match tick_task_run_once() {
            Ok(_) => {}
            Err(_) => cpu::halt(),
        }
    }
}

fn set_driver_wait_state(state: TaskState, pend_on: PendOn) {
    if let Some(id) = tick_task_id()
        && let Some(driver) = task::table().lock().get_mut(id)
    {
        driver.state = state;
        driver.pend_on = pend_on;
    }
}
