//! Process-wide installation point for a [`FrameRegistry`].
//!
//! Code that can be handed the registry by reference should be. Code that
//! cannot (e.g. deep inside page-fault handling) reaches it through a
//! `static GlobalFrames`, which accepts exactly one registry, normally
//! installed by the boot core before the other cores are released.
//!
//! ```ignore
//! static FRAMES: GlobalFrames<KernelPlatform, MAX_CORES> = GlobalFrames::new();
//!
//! let layout = FrameLayout::for_kernel(kernel_end)?;
//! let frames = FRAMES.install(unsafe { FrameRegistry::new(KernelPlatform, layout) })?;
//! unsafe { frames.reclaim_all() };
//! ```

use crate::error::AlreadyInstalled;
use crate::platform::Platform;
use crate::registry::FrameRegistry;
use kernel_sync::SyncOnceCell;

pub struct GlobalFrames<P: Platform, const CORES: usize> {
    cell: SyncOnceCell<FrameRegistry<P, CORES>>,
}

impl<P: Platform, const CORES: usize> GlobalFrames<P, CORES> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cell: SyncOnceCell::new(),
        }
    }

    /// Installs `registry` as the process-wide pool.
    ///
    /// # Errors
    /// [`AlreadyInstalled`] if a registry was installed before; the offered
    /// one is dropped.
    pub fn install(
        &self,
        registry: FrameRegistry<P, CORES>,
    ) -> Result<&FrameRegistry<P, CORES>, AlreadyInstalled> {
        self.cell.try_init(registry).map_err(|_| AlreadyInstalled)
    }

    /// The installed registry, if any.
    #[inline]
    #[must_use]
    pub fn get(&self) -> Option<&FrameRegistry<P, CORES>> {
        self.cell.get()
    }
}

impl<P: Platform, const CORES: usize> Default for GlobalFrames<P, CORES> {
    fn default() -> Self {
        Self::new()
    }
}
