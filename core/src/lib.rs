//! Kernel core: task table, scheduler queues and tick-driven timing.
#![no_std]

pub mod kernel;
pub mod scheduler;
pub mod time;

pub use scheduler::task;
pub use time::wheel;
