//! Task table, ready queue and pend queue tests.
//!
//! Table-shape tests run on local [`TaskTable`] instances; the global
//! table is only touched by the suspend/resume tests, which create their
//! own tasks and free them again rather than resetting the table (other
//! suites hold ids into it).

use tickos_abi::task::{MAX_TASKS, PendOn, TaskFlags, TaskState};
use tickos_lib::testing::TestResult;
use tickos_lib::{assert_eq_test, assert_test, fail};

use crate::scheduler::pend::{pend_queue_insert, pend_queue_len, pend_queue_unlink};
use crate::scheduler::readyqueue::{
    is_ready_queued, make_task_ready, ready_count, ready_remove, reset_ready_queues,
    take_highest_ready,
};
use crate::scheduler::task::{self, TaskCreateError, TaskTable};
use crate::scheduler::{TaskError, task_resume, task_suspend};

const STACK_BASE: u64 = 0x0010_0000;
const STACK_SIZE: u64 = 0x2000;

fn create(tasks: &mut TaskTable, name: &str, priority: u8) -> u32 {
    tasks
        .create(name, priority, TaskFlags::KERNEL_MODE, STACK_BASE, STACK_SIZE)
        .unwrap_or(u32::MAX)
}

// ---------------------------------------------------------------------------
// Task table
// ---------------------------------------------------------------------------

pub fn test_create_validates_arguments() -> TestResult {
    let mut tasks = TaskTable::new();
    assert_eq_test!(
        tasks.create("", 2, TaskFlags::empty(), STACK_BASE, STACK_SIZE),
        Err(TaskCreateError::InvalidName)
    );
    assert_eq_test!(
        tasks.create("t", 2, TaskFlags::empty(), 0, STACK_SIZE),
        Err(TaskCreateError::InvalidStack)
    );
    assert_eq_test!(
        tasks.create("t", 2, TaskFlags::empty(), STACK_BASE, 0x100),
        Err(TaskCreateError::UndersizedStack)
    );
    assert_eq_test!(
        tasks.create("t", 8, TaskFlags::empty(), STACK_BASE, STACK_SIZE),
        Err(TaskCreateError::InvalidPriority)
    );
    assert_eq_test!(tasks.count_in_use(), 0);
    TestResult::Pass
}

pub fn test_create_assigns_slot_ids() -> TestResult {
    let mut tasks = TaskTable::new();
    let a = create(&mut tasks, "first", 1);
    let b = create(&mut tasks, "second", 3);
    assert_eq_test!(a, 0);
    assert_eq_test!(b, 1);
    assert_eq_test!(tasks.get(a).map(|t| t.name_str()), Some("first"));
    assert_eq_test!(tasks.get(b).map(|t| t.priority), Some(3));
    assert_eq_test!(tasks.count_in_use(), 2);

    // Freed slots are reused; stale ids stop resolving.
    tasks.free(a);
    assert_test!(tasks.get(a).is_none());
    let c = create(&mut tasks, "third", 1);
    assert_eq_test!(c, 0);
    TestResult::Pass
}

pub fn test_create_at_capacity_fails() -> TestResult {
    let mut tasks = TaskTable::new();
    for i in 0..MAX_TASKS {
        let id = create(&mut tasks, "filler", 2);
        assert_eq_test!(id, i as u32);
    }
    assert_eq_test!(
        tasks.create("extra", 2, TaskFlags::empty(), STACK_BASE, STACK_SIZE),
        Err(TaskCreateError::TableFull)
    );
    TestResult::Pass
}

// ---------------------------------------------------------------------------
// Ready queues
// ---------------------------------------------------------------------------

pub fn test_ready_queue_priority_and_fifo_order() -> TestResult {
    reset_ready_queues();
    let mut tasks = TaskTable::new();
    let low = create(&mut tasks, "low", 5);
    let mid_a = create(&mut tasks, "mid_a", 2);
    let mid_b = create(&mut tasks, "mid_b", 2);
    let high = create(&mut tasks, "high", 0);

    for id in [low, mid_a, mid_b, high] {
        let Some(task) = tasks.get(id) else {
            return fail!("task vanished");
        };
        assert_test!(make_task_ready(task));
    }

    assert_eq_test!(take_highest_ready(), Some(high));
    assert_eq_test!(take_highest_ready(), Some(mid_a));
    assert_eq_test!(take_highest_ready(), Some(mid_b));
    assert_eq_test!(take_highest_ready(), Some(low));
    assert_eq_test!(take_highest_ready(), None);
    TestResult::Pass
}

pub fn test_make_ready_skips_suspended() -> TestResult {
    reset_ready_queues();
    let mut tasks = TaskTable::new();
    let id = create(&mut tasks, "susp", 2);
    if let Some(t) = tasks.get_mut(id) {
        t.state = TaskState::Suspended;
    }

    let Some(task) = tasks.get(id) else {
        return fail!("task vanished");
    };
    assert_test!(!make_task_ready(task));
    assert_eq_test!(ready_count(), 0);
    TestResult::Pass
}

pub fn test_ready_remove_targets_one_task() -> TestResult {
    reset_ready_queues();
    let mut tasks = TaskTable::new();
    let a = create(&mut tasks, "a", 2);
    let b = create(&mut tasks, "b", 2);
    for id in [a, b] {
        let Some(task) = tasks.get(id) else {
            return fail!("task vanished");
        };
        make_task_ready(task);
    }

    assert_test!(ready_remove(a, 2));
    assert_test!(!is_ready_queued(a));
    assert_eq_test!(take_highest_ready(), Some(b));
    assert_test!(!ready_remove(a, 2), "double remove should find nothing");
    TestResult::Pass
}

// ---------------------------------------------------------------------------
// Suspend / resume (global table)
// ---------------------------------------------------------------------------

pub fn test_suspend_resume_ready_task() -> TestResult {
    reset_ready_queues();
    let Ok(id) = task::task_create("sr", 2, TaskFlags::KERNEL_MODE, STACK_BASE, STACK_SIZE) else {
        return fail!("create failed");
    };
    {
        let tasks = task::table().lock();
        if let Some(task) = tasks.get(id) {
            make_task_ready(task);
        }
    }

    assert_eq_test!(task_suspend(id), Ok(()));
    assert_eq_test!(task::task_state(id), Some(TaskState::Suspended));
    assert_test!(!is_ready_queued(id));
    // Suspending twice is rejected; suspension does not nest.
    assert_eq_test!(task_suspend(id), Err(TaskError::InvalidState));

    assert_eq_test!(task_resume(id), Ok(()));
    assert_eq_test!(task::task_state(id), Some(TaskState::Ready));
    assert_test!(is_ready_queued(id));
    assert_eq_test!(task_resume(id), Err(TaskError::InvalidState));

    reset_ready_queues();
    task::table().lock().free(id);
    TestResult::Pass
}

pub fn test_suspend_layers_on_waits() -> TestResult {
    let Ok(id) = task::task_create("wait", 2, TaskFlags::KERNEL_MODE, STACK_BASE, STACK_SIZE)
    else {
        return fail!("create failed");
    };

    for (wait, suspended) in [
        (TaskState::Delayed, TaskState::DelayedSuspended),
        (TaskState::Pending, TaskState::PendingSuspended),
        (TaskState::PendingTimeout, TaskState::PendingTimeoutSuspended),
    ] {
        if let Some(t) = task::table().lock().get_mut(id) {
            t.state = wait;
        }
        assert_eq_test!(task_suspend(id), Ok(()));
        assert_eq_test!(task::task_state(id), Some(suspended));
        assert_eq_test!(task_resume(id), Ok(()));
        assert_eq_test!(task::task_state(id), Some(wait));
    }

    assert_eq_test!(task_suspend(9999), Err(TaskError::InvalidTask));
    task::table().lock().free(id);
    TestResult::Pass
}

// ---------------------------------------------------------------------------
// Pend queues
// ---------------------------------------------------------------------------

pub fn test_pend_queue_membership() -> TestResult {
    let mut tasks = TaskTable::new();
    let id = create(&mut tasks, "pender", 2);
    let Some(task) = tasks.get_mut(id) else {
        return fail!("task vanished");
    };

    assert_test!(pend_queue_insert(2, task, PendOn::Semaphore));
    assert_eq_test!(task.pend_queue, Some(2));
    assert_eq_test!(task.pend_on, PendOn::Semaphore);
    assert_eq_test!(pend_queue_len(2), 1);

    pend_queue_unlink(task);
    assert_eq_test!(task.pend_queue, None);
    assert_eq_test!(pend_queue_len(2), 0);
    // Unlinking a task that is not pending is a no-op.
    pend_queue_unlink(task);
    assert_eq_test!(pend_queue_len(2), 0);

    assert_test!(!pend_queue_insert(99, task, PendOn::Semaphore));
    TestResult::Pass
}

tickos_lib::define_test_suite!(
    task_management,
    [
        test_create_validates_arguments,
        test_create_assigns_slot_ids,
        test_create_at_capacity_fails,
        test_ready_queue_priority_and_fifo_order,
        test_make_ready_skips_suspended,
        test_ready_remove_targets_one_task,
        test_suspend_resume_ready_task,
        test_suspend_layers_on_waits,
        test_pend_queue_membership,
    ]
);
