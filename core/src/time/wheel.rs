//! Hashed tick wheel.
//!
//! Every timed wait hangs off one of [`TICK_WHEEL_SIZE`] spokes, chosen by
//! `ctr_match % TICK_WHEEL_SIZE`. Each spoke is a doubly-linked list of
//! task ids kept sorted by ascending time remaining, so the per-tick scan
//! stops at the first entry that is not yet due.
//!
//! All tick arithmetic wraps. A wait is "due" only on exact equality of
//! the counter and the match tick, which keeps comparisons meaningful
//! across counter wraparound.

use core::ptr;

use tickos_abi::task::{PendOn, PendStatus, TaskState};
use tickos_abi::tick::{TICK_HORIZON, TICK_WHEEL_SIZE, Tick, TickMode};
use tickos_lib::kdiag_timestamp;

use crate::scheduler::pend;
use crate::scheduler::readyqueue;
use crate::scheduler::task::TaskTable;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickError {
    /// The requested delay is zero, or the match tick is in the past or
    /// beyond the scheduling horizon.
    ZeroOrPastDelay,
    /// The task id does not name a live task.
    InvalidTask,
    /// The operation requires a delayed task and the task is not delayed.
    NotDelayed,
    /// The tick mode is not valid for this operation.
    InvalidMode,
}

/// One slot of the wheel: list head plus occupancy counters.
#[derive(Clone, Copy)]
pub struct TickSpoke {
    first: Option<u32>,
    count: u16,
    peak: u16,
}

impl TickSpoke {
    const fn empty() -> Self {
        Self {
            first: None,
            count: 0,
            peak: 0,
        }
    }
}

/// The timing state: tick counter, spokes and the worst-case scan metric.
pub struct TickState {
    ctr: Tick,
    spokes: [TickSpoke; TICK_WHEEL_SIZE],
    update_time_max: u64,
}

impl TickState {
    pub const fn new() -> Self {
        Self {
            ctr: 0,
            spokes: [TickSpoke::empty(); TICK_WHEEL_SIZE],
            update_time_max: 0,
        }
    }

    /// Empty every spoke. Does not touch the counter or the scan metric.
    pub fn init(&mut self) {
        self.spokes = [TickSpoke::empty(); TICK_WHEEL_SIZE];
    }

    /// Reset everything: counter, spokes and the scan metric.
    pub fn reset(&mut self) {
        self.ctr = 0;
        self.update_time_max = 0;
        self.init();
    }

    #[inline]
    pub fn ctr(&self) -> Tick {
        self.ctr
    }

    /// Set the tick counter. Existing entries keep their absolute match
    /// ticks; callers normally only do this while the wheel is empty.
    pub fn set_ctr(&mut self, ctr: Tick) {
        self.ctr = ctr;
    }

    #[inline]
    pub fn update_time_max(&self) -> u64 {
        self.update_time_max
    }

    /// Current and peak entry counts of one spoke.
    pub fn spoke_stats(&self, spoke: usize) -> Option<(u16, u16)> {
        self.spokes.get(spoke).map(|s| (s.count, s.peak))
    }

    /// Head task id of one spoke.
    pub fn spoke_first(&self, spoke: usize) -> Option<u32> {
        self.spokes.get(spoke).and_then(|s| s.first)
    }

    /// Zero the peak counter of every spoke. Current counts are kept.
    pub fn reset_peak(&mut self) {
        for spoke in self.spokes.iter_mut() {
            spoke.peak = 0;
        }
    }

    /// Compute a task's match tick from `time` and `mode`, then link it
    /// into the wheel. The task must not already be linked.
    ///
    /// On error the timing fields are cleared and the task stays unlinked;
    /// the caller decides whether that means "run immediately".
    pub fn insert(
        &mut self,
        tasks: &mut TaskTable,
        id: u32,
        time: Tick,
        mode: TickMode,
    ) -> Result<(), TickError> {
        let ctr = self.ctr;
        let Some(entry) = tasks.tick_mut(id) else {
            return Err(TickError::InvalidTask);
        };
        debug_assert!(!entry.is_linked());

        match mode {
            TickMode::Match => {
                // Relative distance to the requested absolute tick. A
                // target at or before the current counter wraps to a huge
                // delta and lands beyond the horizon.
                let delta = time.wrapping_sub(ctr).wrapping_sub(1);
                if delta > TICK_HORIZON {
                    entry.ctr_match = 0;
                    entry.remain = 0;
                    entry.spoke = None;
                    return Err(TickError::ZeroOrPastDelay);
                }
                entry.ctr_match = time;
                entry.remain = delta.wrapping_add(1);
            }
            TickMode::Periodic if time > 0 => {
                // Anchor on the previous expiry so jitter does not
                // accumulate. The adjusted delta deliberately measures
                // from one past the counter; if the next multiple is
                // still ahead by less than a full period it is kept,
                // otherwise the series re-bases on the current counter.
                let tick_next = entry.ctr_prev.wrapping_add(time);
                let tick_delta = tick_next.wrapping_sub(ctr).wrapping_sub(1);
                if tick_delta < time {
                    entry.ctr_match = tick_next;
                } else {
                    entry.ctr_match = ctr.wrapping_add(time);
                }
                entry.remain = entry.ctr_match.wrapping_sub(ctr);
                entry.ctr_prev = entry.ctr_match;
            }
            TickMode::Delay | TickMode::Timeout if time > 0 => {
                entry.ctr_match = ctr.wrapping_add(time);
                entry.remain = time;
            }
            _ => {
                // Zero-length relative wait.
                entry.ctr_match = 0;
                entry.remain = 0;
                entry.spoke = None;
                return Err(TickError::ZeroOrPastDelay);
            }
        }

        let ctr_match = entry.ctr_match;
        let new_remain = entry.remain;
        let spoke_ix = (ctr_match % TICK_WHEEL_SIZE as Tick) as u16;

        if self.spokes[spoke_ix as usize].count == 0 {
            if let Some(entry) = tasks.tick_mut(id) {
                entry.next = None;
                entry.prev = None;
            }
            let spoke = &mut self.spokes[spoke_ix as usize];
            spoke.first = Some(id);
            spoke.count = 1;
        } else {
            // Walk the sorted list. Each visited entry has its remaining
            // time refreshed against the current counter first, since the
            // stored value may date from an older counter.
            let mut cur = self.spokes[spoke_ix as usize].first;
            while let Some(cur_id) = cur {
                let (cur_remain, cur_next, cur_prev) = match tasks.tick_mut(cur_id) {
                    Some(e) => {
                        e.remain = e.ctr_match.wrapping_sub(ctr);
                        (e.remain, e.next, e.prev)
                    }
                    None => break,
                };
                if new_remain > cur_remain {
                    match cur_next {
                        Some(_) => cur = cur_next,
                        None => {
                            // Nothing later than the new entry: append
                            // after the tail.
                            if let Some(e) = tasks.tick_mut(id) {
                                e.prev = Some(cur_id);
                                e.next = None;
                            }
                            if let Some(e) = tasks.tick_mut(cur_id) {
                                e.next = Some(id);
                            }
                            break;
                        }
                    }
                } else {
                    // Equal remaining time inserts before, so the newest
                    // entry with a given deadline is reached first.
                    if let Some(e) = tasks.tick_mut(id) {
                        e.prev = cur_prev;
                        e.next = Some(cur_id);
                    }
                    if let Some(e) = tasks.tick_mut(cur_id) {
                        e.prev = Some(id);
                    }
                    match cur_prev {
                        Some(prev_id) => {
                            if let Some(e) = tasks.tick_mut(prev_id) {
                                e.next = Some(id);
                            }
                        }
                        None => self.spokes[spoke_ix as usize].first = Some(id),
                    }
                    break;
                }
            }
            self.spokes[spoke_ix as usize].count += 1;
        }

        let spoke = &mut self.spokes[spoke_ix as usize];
        if spoke.peak < spoke.count {
            spoke.peak = spoke.count;
        }
        if let Some(entry) = tasks.tick_mut(id) {
            entry.spoke = Some(spoke_ix);
        }
        Ok(())
    }

    /// Unlink a task from the wheel in O(1). No-op if it is not linked,
    /// so callers may remove unconditionally when a wait ends.
    pub fn remove(&mut self, tasks: &mut TaskTable, id: u32) {
        let (spoke_ix, next, prev) = match tasks.tick_mut(id) {
            Some(entry) => match entry.spoke {
                Some(ix) => {
                    entry.remain = 0;
                    (ix, entry.next, entry.prev)
                }
                None => return,
            },
            None => return,
        };

        match prev {
            None => {
                self.spokes[spoke_ix as usize].first = next;
                if let Some(next_id) = next
                    && let Some(e) = tasks.tick_mut(next_id)
                {
                    e.prev = None;
                }
            }
            Some(prev_id) => {
                if let Some(e) = tasks.tick_mut(prev_id) {
                    e.next = next;
                }
                if let Some(next_id) = next
                    && let Some(e) = tasks.tick_mut(next_id)
                {
                    e.prev = Some(prev_id);
                }
            }
        }

        if let Some(entry) = tasks.tick_mut(id) {
            entry.next = None;
            entry.prev = None;
            entry.spoke = None;
            entry.ctr_match = 0;
        }

        let spoke = &mut self.spokes[spoke_ix as usize];
        spoke.count = spoke.count.saturating_sub(1);
    }

    /// Advance the counter by one tick and process the spoke it hashes to.
    ///
    /// The spoke list is sorted by remaining time, so the walk ends at the
    /// first entry that is not due; entries past it are never touched. The
    /// successor of each entry is captured before the entry is dispatched,
    /// as expiry unlinks it from the list.
    pub fn update(&mut self, tasks: &mut TaskTable) {
        let ts_start = kdiag_timestamp();

        self.ctr = self.ctr.wrapping_add(1);
        let ctr = self.ctr;
        let spoke_ix = (ctr % TICK_WHEEL_SIZE as Tick) as usize;

        let mut cur = self.spokes[spoke_ix].first;
        while let Some(id) = cur {
            let (state, next) = match tasks.get(id) {
                Some(task) => (task.state, task.tick.next),
                None => break,
            };

            match state {
                // Not waiting on time; leave the entry alone.
                TaskState::Ready
                | TaskState::Pending
                | TaskState::Suspended
                | TaskState::PendingSuspended => {}
                TaskState::Delayed => {
                    if refresh_due(tasks, id, ctr) {
                        self.remove(tasks, id);
                        if let Some(task) = tasks.get_mut(id) {
                            task.state = TaskState::Ready;
                            readyqueue::make_task_ready(task);
                        }
                    } else {
                        break;
                    }
                }
                TaskState::PendingTimeout => {
                    if refresh_due(tasks, id, ctr) {
                        self.remove(tasks, id);
                        if let Some(task) = tasks.get_mut(id) {
                            task.msg_ptr = ptr::null_mut();
                            task.msg_size = 0;
                            task.ts = kdiag_timestamp();
                            pend::pend_queue_unlink(task);
                            task.state = TaskState::Ready;
                            readyqueue::make_task_ready(task);
                            task.pend_status = PendStatus::Timeout;
                            task.pend_on = PendOn::Nothing;
                        }
                    } else {
                        break;
                    }
                }
                TaskState::DelayedSuspended => {
                    if refresh_due(tasks, id, ctr) {
                        self.remove(tasks, id);
                        if let Some(task) = tasks.get_mut(id) {
                            task.state = TaskState::Suspended;
                        }
                    } else {
                        break;
                    }
                }
                TaskState::PendingTimeoutSuspended => {
                    if refresh_due(tasks, id, ctr) {
                        self.remove(tasks, id);
                        if let Some(task) = tasks.get_mut(id) {
                            task.msg_ptr = ptr::null_mut();
                            task.msg_size = 0;
                            task.ts = kdiag_timestamp();
                            pend::pend_queue_unlink(task);
                            task.state = TaskState::Suspended;
                            task.pend_status = PendStatus::Timeout;
                            task.pend_on = PendOn::Nothing;
                        }
                    } else {
                        break;
                    }
                }
            }

            cur = next;
        }

        let elapsed = kdiag_timestamp().wrapping_sub(ts_start);
        if self.update_time_max < elapsed {
            self.update_time_max = elapsed;
        }
    }
}

/// Refresh one entry's remaining time against `ctr` and report whether its
/// match tick has been reached.
fn refresh_due(tasks: &mut TaskTable, id: u32, ctr: Tick) -> bool {
    match tasks.tick_mut(id) {
        Some(entry) => {
            entry.remain = entry.ctr_match.wrapping_sub(ctr);
            ctr == entry.ctr_match
        }
        None => false,
    }
}

impl Default for TickState {
    fn default() -> Self {
        Self::new()
    }
}
