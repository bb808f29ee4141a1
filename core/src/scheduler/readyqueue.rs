//! Per-priority ready queues.
//!
//! One fixed-capacity FIFO of task ids per priority level. The dispatcher
//! always drains the lowest-numbered non-empty level; within a level tasks
//! run round-robin in enqueue order.

use tickos_abi::task::{INVALID_TASK_ID, MAX_TASKS, TASK_PRIO_LEVELS};
use tickos_lib::IrqMutex;

use crate::scheduler::task::Task;

struct ReadyFifo {
    ids: [u32; MAX_TASKS],
    head: usize,
    len: usize,
}

impl ReadyFifo {
    const fn new() -> Self {
        Self {
            ids: [INVALID_TASK_ID; MAX_TASKS],
            head: 0,
            len: 0,
        }
    }

    fn push(&mut self, id: u32) -> bool {
        if self.len == MAX_TASKS {
            return false;
        }
        let tail = (self.head + self.len) % MAX_TASKS;
        self.ids[tail] = id;
        self.len += 1;
        true
    }

    fn pop(&mut self) -> Option<u32> {
        if self.len == 0 {
            return None;
        }
        let id = self.ids[self.head];
        self.ids[self.head] = INVALID_TASK_ID;
        self.head = (self.head + 1) % MAX_TASKS;
        self.len -= 1;
        Some(id)
    }

    fn contains(&self, id: u32) -> bool {
        (0..self.len).any(|i| self.ids[(self.head + i) % MAX_TASKS] == id)
    }

    fn remove(&mut self, id: u32) -> bool {
        for i in 0..self.len {
            let at = (self.head + i) % MAX_TASKS;
            if self.ids[at] != id {
                continue;
            }
            for j in i..self.len - 1 {
                let a = (self.head + j) % MAX_TASKS;
                let b = (self.head + j + 1) % MAX_TASKS;
                self.ids[a] = self.ids[b];
            }
            let last = (self.head + self.len - 1) % MAX_TASKS;
            self.ids[last] = INVALID_TASK_ID;
            self.len -= 1;
            return true;
        }
        false
    }
}

struct ReadySet {
    levels: [ReadyFifo; TASK_PRIO_LEVELS as usize],
}

impl ReadySet {
    const fn new() -> Self {
        Self {
            levels: [const { ReadyFifo::new() }; TASK_PRIO_LEVELS as usize],
        }
    }
}

static READY: IrqMutex<ReadySet> = IrqMutex::new(ReadySet::new());

/// Enqueue a task at its priority level.
///
/// Suspended tasks are never enqueued; their wait may expire but they only
/// become runnable again through an explicit resume.
pub fn make_task_ready(task: &Task) -> bool {
    if task.state.is_suspended() {
        return false;
    }
    let level = (task.priority % TASK_PRIO_LEVELS) as usize;
    READY.lock().levels[level].push(task.id)
}

/// Dequeue the highest-priority ready task, if any.
pub fn take_highest_ready() -> Option<u32> {
    let mut set = READY.lock();
    set.levels.iter_mut().find_map(|fifo| fifo.pop())
}

pub fn ready_remove(id: u32, priority: u8) -> bool {
    let level = (priority % TASK_PRIO_LEVELS) as usize;
    READY.lock().levels[level].remove(id)
}

pub fn is_ready_queued(id: u32) -> bool {
    READY.lock().levels.iter().any(|fifo| fifo.contains(id))
}

pub fn ready_count() -> usize {
    READY.lock().levels.iter().map(|fifo| fifo.len).sum()
}

pub fn reset_ready_queues() {
    let mut set = READY.lock();
    set.levels = [const { ReadyFifo::new() }; TASK_PRIO_LEVELS as usize];
}
