//! # Kernel synchronization primitives
//!
//! * [`SpinLock`]: named TATAS spin lock with a non-blocking [`try_lock`](SpinLock::try_lock).
//! * [`IrqGuard`]: scoped, nestable suppression of local interrupt delivery.
//! * [`SyncOnceCell`]: write-once cell for boot-time singletons.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

pub mod irq;
mod spin_lock;
mod sync_once_cell;

#[cfg(target_arch = "x86_64")]
pub use irq::X86Interrupts;
pub use irq::{InterruptControl, IrqGuard};
pub use spin_lock::{SpinLock, SpinLockGuard};
pub use sync_once_cell::SyncOnceCell;
