//! Kernel run state.
//!
//! The tick driver task only advances time while the kernel is running;
//! interrupts that arrive before `kernel_start` or after `kernel_stop` are
//! still counted by the signal but produce no tick processing.

use core::sync::atomic::{AtomicU8, Ordering};

use tickos_lib::klog_info;

const STATE_STOPPED: u8 = 0;
const STATE_RUNNING: u8 = 1;

static RUN_STATE: AtomicU8 = AtomicU8::new(STATE_STOPPED);

pub fn kernel_start() {
    RUN_STATE.store(STATE_RUNNING, Ordering::Release);
    klog_info!("kernel: running");
}

pub fn kernel_stop() {
    RUN_STATE.store(STATE_STOPPED, Ordering::Release);
    klog_info!("kernel: stopped");
}

#[inline]
pub fn is_running() -> bool {
    RUN_STATE.load(Ordering::Acquire) == STATE_RUNNING
}
