//! # Physical Frame Pool
//!
//! Hands out and takes back whole 4 KiB physical frames for page tables,
//! kernel stacks, pipe buffers and user memory. Every core owns a free list
//! of its own, so the common path touches only one uncontended lock; a core
//! that runs dry steals a single frame from a peer.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     FrameRegistry                        │
//! │                                                          │
//! │   core 0            core 1                 core N-1      │
//! │ ┌──────────┐     ┌──────────┐           ┌──────────┐     │
//! │ │ SpinLock │     │ SpinLock │    ...    │ SpinLock │     │
//! │ │ FreeList │     │ FreeList │           │ FreeList │     │
//! │ └────┬─────┘     └────┬─────┘           └────┬─────┘     │
//! │      ▼                ▼                      ▼           │
//! │    frame → frame    frame                  (empty)       │
//! │      (links stored inside the free frames)               │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Lifecycle
//!
//! 1. [`FrameRegistry::new`] builds the empty per-core lists (once, at boot).
//! 2. [`FrameRegistry::reclaim_all`] / [`FrameRegistry::reclaim_range`] seed
//!    the pool. Seeding runs on the boot core, so the whole pool starts out
//!    on that core's list; stealing spreads it out lazily.
//! 3. Any core calls [`FrameRegistry::allocate`] and
//!    [`FrameRegistry::deallocate`] concurrently from then on.
//!
//! Freed frames always go to the *freeing* core's list, wherever they were
//! allocated.
//!
//! ## Failure Model
//!
//! * Running out of frames is ordinary: `allocate` returns `None`.
//! * Handing back an address that cannot be a managed frame is not: the
//!   pool reports a [`FrameFault`] to [`Platform::halt`] and never returns.
//!
//! ## Debugging Aids
//!
//! Freed frames are filled with [`FREED_JUNK`], allocated frames with
//! [`ALLOC_JUNK`]. Each free frame also carries a tag word that is checked on
//! the way out, which catches most writes through dangling references.
//!
//! ## Integration Points
//!
//! * **kernel-info**: page size, core count, physical memory bounds
//! * **kernel-sync**: spin locks, interrupt guard, once cell
//! * the kernel proper: a [`Platform`] implementation (core id, halt,
//!   interrupt masking) and usually [`HhdmPhysMapper::KERNEL`]

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod addresses;
mod error;
mod free_list;
mod global;
mod layout;
pub mod phys_mapper;
mod platform;
mod poison;
mod registry;

pub use addresses::{PhysicalAddress, PhysicalFrame};
pub use error::{AlreadyInstalled, FrameFault, LayoutError};
pub use global::GlobalFrames;
pub use layout::FrameLayout;
pub use phys_mapper::HhdmPhysMapper;
pub use platform::{PhysMapper, Platform};
pub use poison::{ALLOC_JUNK, FREED_JUNK};
pub use registry::{FrameRegistry, FrameStats};

/// The pool sized for the kernel's configured core count.
pub type KernelFrames<P> = FrameRegistry<P, { kernel_info::memory::MAX_CORES }>;
