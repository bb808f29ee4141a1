//! Pend queues.
//!
//! A small fixed pool of wait queues for blocking synchronisation objects.
//! Membership is unordered; wake policy belongs to the object layer. The
//! tick wheel calls [`pend_queue_unlink`] when a timed pend expires.

use tickos_abi::task::{INVALID_TASK_ID, MAX_TASKS, PendOn};
use tickos_lib::IrqMutex;

use crate::scheduler::task::Task;

pub const MAX_PEND_QUEUES: usize = 8;

struct PendQueue {
    ids: [u32; MAX_TASKS],
    count: usize,
}

impl PendQueue {
    const fn new() -> Self {
        Self {
            ids: [INVALID_TASK_ID; MAX_TASKS],
            count: 0,
        }
    }

    fn insert(&mut self, id: u32) -> bool {
        for slot in self.ids.iter_mut() {
            if *slot == INVALID_TASK_ID {
                *slot = id;
                self.count += 1;
                return true;
            }
        }
        false
    }

    fn remove(&mut self, id: u32) -> bool {
        for slot in self.ids.iter_mut() {
            if *slot == id {
                *slot = INVALID_TASK_ID;
                self.count -= 1;
                return true;
            }
        }
        false
    }
}

static PEND_QUEUES: IrqMutex<[PendQueue; MAX_PEND_QUEUES]> =
    IrqMutex::new([const { PendQueue::new() }; MAX_PEND_QUEUES]);

/// Link a task into a pend queue and record what it is waiting on.
pub fn pend_queue_insert(queue: u8, task: &mut Task, on: PendOn) -> bool {
    let Some(entry) = usize::try_from(queue)
        .ok()
        .filter(|&q| q < MAX_PEND_QUEUES)
    else {
        return false;
    };
    if !PEND_QUEUES.lock()[entry].insert(task.id) {
        return false;
    }
    task.pend_on = on;
    task.pend_queue = Some(queue);
    true
}

/// Unlink a task from whatever pend queue it is on. No-op if it is not
/// pending; `pend_on` and `pend_status` are left for the caller to settle.
pub fn pend_queue_unlink(task: &mut Task) {
    if let Some(queue) = task.pend_queue.take() {
        PEND_QUEUES.lock()[queue as usize].remove(task.id);
    }
}

pub fn pend_queue_len(queue: u8) -> usize {
    PEND_QUEUES
        .lock()
        .get(queue as usize)
        .map_or(0, |q| q.count)
}

pub fn reset_pend_queues() {
    *PEND_QUEUES.lock() = [const { PendQueue::new() }; MAX_PEND_QUEUES];
}
