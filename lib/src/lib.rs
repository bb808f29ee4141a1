#![no_std]

pub mod cpu;
pub mod kdiag;
pub mod klog;
pub mod spinlock;
pub mod testing;

pub mod tsc {
    use core::arch::asm;

    #[inline(always)]
    pub fn rdtsc() -> u64 {
        let lo: u32;
        let hi: u32;
        unsafe {
            asm!(
                "rdtsc",
                out("eax") lo,
                out("edx") hi,
                options(nomem, nostack, preserves_flags)
            );
        }
        ((hi as u64) << 32) | (lo as u64)
    }
}

#[doc(hidden)]
pub use paste;

pub use kdiag::kdiag_timestamp;
pub use klog::{KlogLevel, klog_get_level, klog_register_backend, klog_set_level};
pub use spinlock::{IrqMutex, IrqMutexGuard};
