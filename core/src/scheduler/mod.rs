//! Task management: the task table, ready queues and pend queues.

pub mod pend;
pub mod readyqueue;
pub mod task;

pub mod task_tests;

use tickos_abi::task::TaskState;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskError {
    InvalidTask,
    InvalidState,
}

/// Suspend a task, layering the suspension on top of whatever wait it is
/// already in. A suspended waiter keeps its tick wheel entry; expiry then
/// strips the wait but leaves the task suspended.
pub fn task_suspend(id: u32) -> Result<(), TaskError> {
    let mut tasks = task::table().lock();
    let Some(t) = tasks.get_mut(id) else {
        return Err(TaskError::InvalidTask);
    };
    let next = match t.state {
        TaskState::Ready => {
            readyqueue::ready_remove(id, t.priority);
            TaskState::Suspended
        }
        TaskState::Delayed => TaskState::DelayedSuspended,
        TaskState::Pending => TaskState::PendingSuspended,
        TaskState::PendingTimeout => TaskState::PendingTimeoutSuspended,
        TaskState::Suspended
        | TaskState::DelayedSuspended
        | TaskState::PendingSuspended
        | TaskState::PendingTimeoutSuspended => return Err(TaskError::InvalidState),
    };
    t.state = next;
    Ok(())
}

/// Undo a suspension. A plain suspended task goes straight back to the
/// ready queues; a suspended waiter drops back into its original wait.
pub fn task_resume(id: u32) -> Result<(), TaskError> {
    let mut tasks = task::table().lock();
    let Some(t) = tasks.get_mut(id) else {
        return Err(TaskError::InvalidTask);
    };
    match t.state {
        TaskState::Suspended => {
            t.state = TaskState::Ready;
            readyqueue::make_task_ready(t);
        }
        TaskState::DelayedSuspended => t.state = TaskState::Delayed,
        TaskState::PendingSuspended => t.state = TaskState::Pending,
        TaskState::PendingTimeoutSuspended => t.state = TaskState::PendingTimeout,
        TaskState::Ready
        | TaskState::Delayed
        | TaskState::Pending
        | TaskState::PendingTimeout => return Err(TaskError::InvalidState),
    }
    Ok(())
}
