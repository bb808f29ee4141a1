//! Tick driver task tests.
//!
//! These run against the global task table and tick state. The driver can
//! only be created once per boot, so the validation tests come first and
//! the suite creates the real driver task exactly once.

use tickos_abi::task::{TASK_PRIO_IDLE, TASK_PRIO_TICK, TaskFlags, TaskState};
use tickos_lib::testing::TestResult;
use tickos_lib::{assert_eq_test, assert_test, fail};

use crate::kernel;
use crate::scheduler::task;
use crate::time;
use crate::time::tick_task::{
    TickTaskConfig, TickTaskInitError, tick_sem_pend, tick_signal, tick_task_id, tick_task_init,
    tick_task_run_once,
};

const TEST_STACK_BASE: u64 = 0x0008_0000;
const TEST_STACK_SIZE: u64 = 0x4000;

fn valid_config() -> TickTaskConfig {
    TickTaskConfig {
        stack_base: TEST_STACK_BASE,
        stack_size: TEST_STACK_SIZE,
        priority: TASK_PRIO_TICK,
    }
}

/// Create the driver if no earlier test has; either way return its id.
fn ensure_driver() -> Option<u32> {
    match tick_task_init(&valid_config()) {
        Ok(id) => Some(id),
        Err(TickTaskInitError::AlreadyInitialized) => tick_task_id(),
        Err(_) => None,
    }
}

pub fn test_init_rejects_null_stack() -> TestResult {
    let config = TickTaskConfig {
        stack_base: 0,
        ..valid_config()
    };
    assert_eq_test!(tick_task_init(&config), Err(TickTaskInitError::InvalidStack));
    TestResult::Pass
}

pub fn test_init_rejects_undersized_stack() -> TestResult {
    let config = TickTaskConfig {
        stack_size: 0x100,
        ..valid_config()
    };
    assert_eq_test!(
        tick_task_init(&config),
        Err(TickTaskInitError::UndersizedStack)
    );
    TestResult::Pass
}

pub fn test_init_rejects_idle_priority() -> TestResult {
    let config = TickTaskConfig {
        priority: TASK_PRIO_IDLE,
        ..valid_config()
    };
    assert_eq_test!(
        tick_task_init(&config),
        Err(TickTaskInitError::InvalidPriority)
    );
    TestResult::Pass
}

pub fn test_init_creates_driver_task() -> TestResult {
    let Some(id) = ensure_driver() else {
        return fail!("driver init failed");
    };
    assert_eq_test!(tick_task_id(), Some(id));
    assert_eq_test!(time::tick_ctr(), 0);
    assert_eq_test!(time::tick_update_time_max(), 0);

    let tasks = task::table().lock();
    let Some(driver) = tasks.get(id) else {
        return fail!("driver task missing from table");
    };
    assert_test!(driver.flags.contains(TaskFlags::TICK_TASK));
    assert_test!(driver.flags.contains(TaskFlags::SYSTEM));
    assert_eq_test!(driver.priority, TASK_PRIO_TICK);
    assert_eq_test!(driver.name_str(), "tick");
    TestResult::Pass
}

pub fn test_init_twice_rejected() -> TestResult {
    if ensure_driver().is_none() {
        return fail!("driver init failed");
    }
    assert_eq_test!(
        tick_task_init(&valid_config()),
        Err(TickTaskInitError::AlreadyInitialized)
    );
    TestResult::Pass
}

pub fn test_signal_then_pend() -> TestResult {
    let Some(id) = ensure_driver() else {
        return fail!("driver init failed");
    };

    tick_signal();
    let Ok(_ts) = tick_sem_pend() else {
        return fail!("pend failed with a signal posted");
    };
    assert_eq_test!(task::task_state(id), Some(TaskState::Ready));

    // Signals queue up; none are lost if the driver falls behind.
    tick_signal();
    tick_signal();
    assert_test!(tick_sem_pend().is_ok());
    assert_test!(tick_sem_pend().is_ok());
    TestResult::Pass
}

pub fn test_update_gated_on_run_state() -> TestResult {
    if ensure_driver().is_none() {
        return fail!("driver init failed");
    }

    kernel::kernel_stop();
    let before = time::tick_ctr();
    tick_signal();
    assert_eq_test!(tick_task_run_once(), Ok(false));
    assert_eq_test!(time::tick_ctr(), before);

    kernel::kernel_start();
    tick_signal();
    assert_eq_test!(tick_task_run_once(), Ok(true));
    assert_eq_test!(time::tick_ctr(), before.wrapping_add(1));

    kernel::kernel_stop();
    TestResult::Pass
}

tickos_lib::define_test_suite!(
    tick_task,
    [
        test_init_rejects_null_stack,
        test_init_rejects_undersized_stack,
        test_init_rejects_idle_priority,
        test_init_creates_driver_task,
        test_init_twice_rejected,
        test_signal_then_pend,
        test_update_gated_on_run_state,
    ]
);
