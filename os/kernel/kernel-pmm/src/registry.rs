//! The per-core frame pool.
//!
//! Each core owns one [`FreeList`] behind its own [`SpinLock`]. Frames are
//! freed onto the list of whichever core frees them and allocated from the
//! allocating core's list; a core whose list ran dry steals one frame from a
//! peer.
//!
//! ## Lock discipline
//!
//! A core only ever *waits* for a list lock while it holds no other list
//! lock. Taking a peer's lock while already holding the local one is always
//! done with [`SpinLock::try_lock`], which never waits. Without hold-and-wait
//! no cycle of waiting cores can form, so mutual stealing cannot deadlock.
//!
//! The steal therefore runs in two passes:
//!
//! ```text
//! local lock held:    try_lock peer 0 .. peer N-1 (skip self)
//!                        ├─ got lock, list non-empty → take one, done
//!                        ├─ got lock, list empty     → next peer
//!                        └─ lock busy                → remember, next peer
//! local lock dropped: lock each remembered peer, one at a time
//!                        └─ list non-empty           → take one, done
//! ```
//!
//! The second pass only visits peers that were busy during the first, so a
//! frame is not missed merely because its owner was using its lock at the
//! time.

use crate::addresses::{PhysicalAddress, PhysicalFrame};
use crate::error::FrameFault;
use crate::free_list::FreeList;
use crate::layout::FrameLayout;
use crate::platform::Platform;
use crate::poison::{self, ALLOC_JUNK, FREED_JUNK};
use kernel_info::memory::PAGE_SIZE;
use kernel_sync::{IrqGuard, SpinLock};
use log::{debug, error, info, trace};

/// Per-core free-frame lists plus the capabilities needed to serve them.
///
/// Built once during boot and then shared by reference with every core.
/// `CORES` is the number of cores; every id reported by
/// [`Platform::current_core`] must be below it.
pub struct FrameRegistry<P: Platform, const CORES: usize> {
    platform: P,
    layout: FrameLayout,
    lists: [SpinLock<FreeList>; CORES],
}

impl<P: Platform, const CORES: usize> FrameRegistry<P, CORES> {
    /// Creates a registry with `CORES` empty lists.
    ///
    /// The pool holds no frames yet; seed it with
    /// [`reclaim_range`](Self::reclaim_range) or
    /// [`reclaim_all`](Self::reclaim_all) before other cores start allocating.
    ///
    /// # Safety
    /// - `platform.mapper()` must map all of `[layout.first_usable(), layout.top())`
    ///   writable for as long as the registry lives.
    /// - No other allocator may hand out memory from that window.
    pub unsafe fn new(platform: P, layout: FrameLayout) -> Self {
        const { assert!(CORES > 0, "frame registry needs at least one core") };
        info!(
            "frame registry: {} cores, physical window [{}, {}), {} frames",
            CORES,
            layout.first_usable(),
            layout.top(),
            layout.usable_frames()
        );
        Self {
            platform,
            layout,
            lists: core::array::from_fn(|_| SpinLock::new("kmem", FreeList::new())),
        }
    }

    #[inline]
    #[must_use]
    pub const fn layout(&self) -> &FrameLayout {
        &self.layout
    }

    #[inline]
    #[must_use]
    pub const fn platform(&self) -> &P {
        &self.platform
    }

    #[inline]
    #[must_use]
    pub const fn cores(&self) -> usize {
        CORES
    }

    /// Frees every whole page in `[start, end)` into the pool.
    ///
    /// `start` is rounded up to a page boundary; a trailing partial page is
    /// left out. Since each page goes through [`deallocate`](Self::deallocate),
    /// all of them land on the calling core's list. Returns the number of
    /// frames added.
    ///
    /// # Safety
    /// Every page in the range must be unused memory that the caller gives
    /// up for good; see [`deallocate`](Self::deallocate).
    pub unsafe fn reclaim_range(&self, start: PhysicalAddress, end: PhysicalAddress) -> usize {
        let mut reclaimed = 0;
        let mut cursor = start.align_up();
        while let Some(page) = cursor {
            let Some(page_end) = page.checked_add(PAGE_SIZE).filter(|e| *e <= end) else {
                break;
            };
            unsafe { self.deallocate(page) };
            reclaimed += 1;
            cursor = Some(page_end);
        }
        debug!("reclaimed {reclaimed} frames from [{start}, {end})");
        reclaimed
    }

    /// Seeds the pool with the whole managed window.
    ///
    /// # Safety
    /// Nothing in `[first_usable, top)` may be in use; meant for the single
    /// boot-time call.
    pub unsafe fn reclaim_all(&self) -> usize {
        unsafe { self.reclaim_range(self.layout.first_usable(), self.layout.top()) }
    }

    /// Hands out one frame, filled with [`ALLOC_JUNK`].
    ///
    /// Takes from the calling core's list first and otherwise steals from a
    /// peer. Returns `None` when every list is empty; there is no waiting or
    /// retrying beyond that, so the caller decides how to cope.
    #[must_use]
    pub fn allocate(&self) -> Option<PhysicalFrame> {
        let local = self.current_core();
        let mut busy = [false; CORES];

        let found = {
            let mut list = self.lists[local].lock();
            match self.pop_from(local, &mut list) {
                Some(frame) => Some(frame),
                None => self.try_steal(local, &mut busy),
            }
        };

        let Some(frame) = found.or_else(|| self.steal_from_busy(local, &busy)) else {
            debug!("core {local}: no free frame on any core");
            return None;
        };

        // SAFETY: the frame left every list above, so it is exclusively ours.
        unsafe { poison::fill_frame(self.platform.mapper(), frame, ALLOC_JUNK) };
        Some(frame)
    }

    /// Returns the frame at `addr` to the calling core's list.
    ///
    /// The address must be page aligned and lie in
    /// `[first_usable, top)`; otherwise the platform is halted before any
    /// memory or list is touched. The frame is filled with [`FREED_JUNK`]
    /// before being linked.
    ///
    /// # Safety
    /// The caller gives up the frame: no references or mappings to it may be
    /// used afterwards, and it must not already be free.
    pub unsafe fn deallocate(&self, addr: PhysicalAddress) {
        let frame = match self.layout.check(addr) {
            Ok(frame) => frame,
            Err(fault) => self.fault(fault),
        };

        let mapper = self.platform.mapper();
        // SAFETY: in-window (checked above) and given up by the caller.
        unsafe { poison::fill_frame(mapper, frame, FREED_JUNK) };

        let core = self.current_core();
        let mut list = self.lists[core].lock();
        // SAFETY: as above; not linked anywhere per the caller's contract.
        unsafe { list.push(mapper, frame) };
    }

    /// Number of free frames currently linked on `core`'s list, `None` for an
    /// unknown core.
    #[must_use]
    pub fn free_frames(&self, core: usize) -> Option<usize> {
        self.lists.get(core).map(|list| list.lock().len())
    }

    /// Per-core free counts.
    ///
    /// Lists are visited one at a time, so under concurrent traffic the
    /// snapshot is not atomic across cores.
    #[must_use]
    pub fn stats(&self) -> FrameStats<CORES> {
        FrameStats {
            free: core::array::from_fn(|core| self.lists[core].lock().len()),
        }
    }

    /// Samples the calling core's id with interrupts masked for the read only.
    fn current_core(&self) -> usize {
        let core = {
            let _irq = IrqGuard::new(&self.platform);
            self.platform.current_core()
        };
        if core >= CORES {
            self.fault(FrameFault::CoreOutOfRange { core, cores: CORES });
        }
        core
    }

    /// First pass: probe peers without waiting while the local lock is held.
    fn try_steal(&self, local: usize, busy: &mut [bool; CORES]) -> Option<PhysicalFrame> {
        for (peer, slot) in self.lists.iter().enumerate() {
            if peer == local {
                continue;
            }
            let Some(mut list) = slot.try_lock() else {
                busy[peer] = true;
                continue;
            };
            if let Some(frame) = self.pop_from(peer, &mut list) {
                trace!("core {local}: stole {frame} from core {peer}");
                return Some(frame);
            }
        }
        None
    }

    /// Second pass: wait for peers that were busy, holding no other lock.
    fn steal_from_busy(&self, local: usize, busy: &[bool; CORES]) -> Option<PhysicalFrame> {
        for (peer, slot) in self.lists.iter().enumerate() {
            if !busy[peer] {
                continue;
            }
            let mut list = slot.lock();
            if let Some(frame) = self.pop_from(peer, &mut list) {
                trace!("core {local}: stole {frame} from core {peer} after contention");
                return Some(frame);
            }
        }
        None
    }

    fn pop_from(&self, core: usize, list: &mut FreeList) -> Option<PhysicalFrame> {
        if list.is_empty() {
            return None;
        }
        // SAFETY: every linked frame was validated against the window on free,
        // and `pop` re-checks each link against it before following it.
        match unsafe { list.pop(self.platform.mapper(), &self.layout) } {
            Ok(frame) => frame,
            Err(frame) => self.fault(FrameFault::CorruptFreeList { core, frame }),
        }
    }

    fn fault(&self, fault: FrameFault) -> ! {
        error!("frame pool: {fault}");
        self.platform.halt(&fault)
    }
}

/// Snapshot of free frames per core, see [`FrameRegistry::stats`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FrameStats<const CORES: usize> {
    free: [usize; CORES],
}

impl<const CORES: usize> FrameStats<CORES> {
    #[must_use]
    pub const fn per_core(&self) -> &[usize; CORES] {
        &self.free
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.free.iter().sum()
    }
}
