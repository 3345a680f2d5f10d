//! # HHDM-based `PhysMapper`
//!
//! With a higher-half direct map every physical address `pa` is visible at
//! `base + pa`. The kernel uses [`HhdmPhysMapper::KERNEL`], whose base is
//! [`HHDM_BASE`]; any other fixed offset works the same way, which is also
//! how host-side tests back "physical" memory with an ordinary heap buffer.

use crate::addresses::PhysicalAddress;
use crate::platform::PhysMapper;
use kernel_info::memory::HHDM_BASE;

/// [`PhysMapper`] for a fixed-offset direct map.
///
/// # Safety
/// - The mapping must be present and cover the referenced physical range.
/// - The returned pointer must only be used for valid, mapped, and writable memory.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct HhdmPhysMapper {
    base: u64,
}

impl HhdmPhysMapper {
    /// The kernel's own direct map.
    pub const KERNEL: Self = Self::new(HHDM_BASE);

    /// Direct map that places physical address `0` at virtual address `base`.
    ///
    /// The addition wraps, so `base` may be "negative" relative to the
    /// physical addresses it serves.
    #[must_use]
    pub const fn new(base: u64) -> Self {
        Self { base }
    }

    #[must_use]
    pub const fn base(&self) -> u64 {
        self.base
    }
}

impl Default for HhdmPhysMapper {
    fn default() -> Self {
        Self::KERNEL
    }
}

impl PhysMapper for HhdmPhysMapper {
    #[allow(clippy::cast_possible_truncation)]
    fn phys_to_ptr(&self, pa: PhysicalAddress) -> *mut u8 {
        let va = self.base.wrapping_add(pa.as_u64());
        core::ptr::with_exposed_provenance_mut(va as usize)
    }
}
