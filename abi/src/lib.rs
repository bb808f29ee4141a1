//! TickOS ABI types.
//!
//! Canonical definitions for the types and constants shared between kernel
//! subsystems: the task state machine, pend bookkeeping tags, priority
//! bands, and the tick/timing-wheel geometry. All subsystems import from
//! here rather than defining their own copies.

#![no_std]

pub mod task;
pub mod tick;
