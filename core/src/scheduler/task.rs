//! Task table.
//!
//! Tasks live in a fixed arena indexed by task id; the id doubles as the
//! slot index. All cross-task links (tick wheel neighbours, pend queue
//! membership, ready queues) are stored as ids, never as references, so a
//! link can be validated before it is followed.

use core::ffi::c_void;
use core::ptr;

use tickos_abi::task::{
    MAX_TASKS, PendOn, PendStatus, TASK_NAME_MAX_LEN, TASK_PRIO_LEVELS, TASK_STACK_SIZE_MIN,
    TaskFlags, TaskState,
};
use tickos_abi::tick::Tick;
use tickos_lib::IrqMutex;

/// Timing fields of a task, maintained by the tick wheel.
///
/// `spoke` is `Some` exactly while the task is linked into a wheel spoke;
/// `next`/`prev` are only meaningful in that case.
#[derive(Clone, Copy, Debug)]
pub struct TickEntry {
    /// Absolute tick at which the wait expires.
    pub ctr_match: Tick,
    /// Ticks remaining, relative to the counter value it was last computed
    /// against. Refreshed lazily during spoke walks.
    pub remain: Tick,
    /// Expiry tick of the previous period, anchor for periodic re-insertion.
    pub ctr_prev: Tick,
    /// Index of the spoke this entry is linked into, if any.
    pub spoke: Option<u16>,
    pub next: Option<u32>,
    pub prev: Option<u32>,
}

impl TickEntry {
    pub const fn empty() -> Self {
        Self {
            ctr_match: 0,
            remain: 0,
            ctr_prev: 0,
            spoke: None,
            next: None,
            prev: None,
        }
    }

    #[inline]
    pub fn is_linked(&self) -> bool {
        self.spoke.is_some()
    }
}

/// One task control block.
pub struct Task {
    pub id: u32,
    pub name: [u8; TASK_NAME_MAX_LEN],
    pub state: TaskState,
    pub priority: u8,
    pub flags: TaskFlags,
    pub stack_base: u64,
    pub stack_size: u64,
    pub tick: TickEntry,
    pub pend_status: PendStatus,
    pub pend_on: PendOn,
    /// Pend queue index the task is waiting on, if any.
    pub pend_queue: Option<u8>,
    /// Message delivered by a post; cleared on timeout.
    pub msg_ptr: *mut c_void,
    pub msg_size: usize,
    /// Timestamp of the event that last readied this task.
    pub ts: u64,
    in_use: bool,
}

// SAFETY: the raw message pointer is never dereferenced by this crate and
// all access to the table is serialised through its IrqMutex.
unsafe impl Send for Task {}

impl Task {
    pub const fn empty() -> Self {
        Self {
            id: 0,
            name: [0; TASK_NAME_MAX_LEN],
            state: TaskState::Ready,
            priority: 0,
            flags: TaskFlags::empty(),
            stack_base: 0,
            stack_size: 0,
            tick: TickEntry::empty(),
            pend_status: PendStatus::Ok,
            pend_on: PendOn::Nothing,
            pend_queue: None,
            msg_ptr: ptr::null_mut(),
            msg_size: 0,
            ts: 0,
            in_use: false,
        }
    }

    #[inline]
    pub fn is_in_use(&self) -> bool {
        self.in_use
    }

    /// Task name as a str, up to the first NUL.
    pub fn name_str(&self) -> &str {
        let len = self
            .name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(TASK_NAME_MAX_LEN);
        core::str::from_utf8(&self.name[..len]).unwrap_or("<invalid>")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskCreateError {
    InvalidName,
    InvalidStack,
    UndersizedStack,
    InvalidPriority,
    TableFull,
}

pub struct TaskTable {
    tasks: [Task; MAX_TASKS],
}

impl TaskTable {
    pub const fn new() -> Self {
        Self {
            tasks: [const { Task::empty() }; MAX_TASKS],
        }
    }

    /// Release every slot. Links held elsewhere become stale and are
    /// rejected by `get`/`get_mut` until the slot is reused.
    pub fn reset(&mut self) {
        self.tasks = [const { Task::empty() }; MAX_TASKS];
    }

    pub fn create(
        &mut self,
        name: &str,
        priority: u8,
        flags: TaskFlags,
        stack_base: u64,
        stack_size: u64,
    ) -> Result<u32, TaskCreateError> {
        if name.is_empty() {
            return Err(TaskCreateError::InvalidName);
        }
        if stack_base == 0 {
            return Err(TaskCreateError::InvalidStack);
        }
        if stack_size < TASK_STACK_SIZE_MIN {
            return Err(TaskCreateError::UndersizedStack);
        }
        if priority >= TASK_PRIO_LEVELS {
            return Err(TaskCreateError::InvalidPriority);
        }

        let slot = self
            .tasks
            .iter()
            .position(|t| !t.in_use)
            .ok_or(TaskCreateError::TableFull)?;

        let task = &mut self.tasks[slot];
        *task = Task::empty();
        task.id = slot as u32;
        task.in_use = true;
        let copy_len = name.len().min(TASK_NAME_MAX_LEN);
        task.name[..copy_len].copy_from_slice(&name.as_bytes()[..copy_len]);
        task.state = TaskState::Ready;
        task.priority = priority;
        task.flags = flags;
        task.stack_base = stack_base;
        task.stack_size = stack_size;
        Ok(slot as u32)
    }

    /// Free a slot. The caller must have unlinked the task from the tick
    /// wheel and any pend queue first.
    pub fn free(&mut self, id: u32) {
        if let Some(task) = self.tasks.get_mut(id as usize)
            && task.in_use
        {
            *task = Task::empty();
        }
    }

    pub fn get(&self, id: u32) -> Option<&Task> {
        self.tasks.get(id as usize).filter(|t| t.in_use)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut Task> {
        self.tasks.get_mut(id as usize).filter(|t| t.in_use)
    }

    /// Shortcut to a live task's timing fields.
    pub fn tick_mut(&mut self, id: u32) -> Option<&mut TickEntry> {
        self.get_mut(id).map(|t| &mut t.tick)
    }

    pub fn count_in_use(&self) -> usize {
        self.tasks.iter().filter(|t| t.in_use).count()
    }
}

static TASK_TABLE: IrqMutex<TaskTable> = IrqMutex::new(TaskTable::new());

pub(crate) fn table() -> &'static IrqMutex<TaskTable> {
    &TASK_TABLE
}

/// Create a task in the global table.
pub fn task_create(
    name: &str,
    priority: u8,
    flags: TaskFlags,
    stack_base: u64,
    stack_size: u64,
) -> Result<u32, TaskCreateError> {
    TASK_TABLE
        .lock()
        .create(name, priority, flags, stack_base, stack_size)
}

pub fn task_state(id: u32) -> Option<TaskState> {
    TASK_TABLE.lock().get(id).map(|t| t.state)
}

pub fn task_table_reset() {
    TASK_TABLE.lock().reset();
}
