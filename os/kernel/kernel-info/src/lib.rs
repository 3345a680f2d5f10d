//! # Kernel Memory Configuration
//!
//! Build-time constants that describe the physical memory the kernel manages
//! and the number of cores that share it. Every subsystem that needs to agree
//! on page size, core count or the physical memory window reads them from
//! here, so there is exactly one place to change them.
//!
//! ## Physical Memory Layout
//!
//! ```text
//! Physical Memory Layout:
//! 0x0000_0000 ┌─────────────────────────────────┐
//!             │     Low Memory (< 1MiB)         │
//!             │  (BIOS, VGA, DMA buffers)       │
//! PHYS_LOAD   ├─────────────────────────────────┤ 0x0010_0000 (1 MiB)
//!             │       Kernel Image              │
//!             │   (Text, Data, BSS)             │
//! kernel end  ├─────────────────────────────────┤ first usable address
//!             │    Available RAM                │
//!             │  (Managed by the frame pool)    │
//! PHYS_TOP    └─────────────────────────────────┘
//! ```
//!
//! The end of the kernel image is a linker symbol and therefore only known at
//! run time; the frame pool receives it at initialization.
//!
//! ## Virtual Access
//!
//! Physical frames are touched through the higher half direct map: physical
//! address `pa` is visible at [`HHDM_BASE`](memory::HHDM_BASE) `+ pa`.
//!
//! Constants are validated with `const` assertions so an inconsistent
//! configuration fails the build instead of the boot.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

pub mod memory;
