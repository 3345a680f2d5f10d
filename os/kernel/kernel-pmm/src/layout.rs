//! The physical window the pool is allowed to manage.

use crate::addresses::{PhysicalAddress, PhysicalFrame};
use crate::error::{FrameFault, LayoutError};
use kernel_info::memory::{PAGE_SIZE, PHYS_TOP};

/// Bounds `[first_usable, top)` of managed physical memory.
///
/// `first_usable` is normally the end of the loaded kernel image; `top` the
/// end of RAM.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FrameLayout {
    first_usable: PhysicalAddress,
    top: PhysicalAddress,
}

impl FrameLayout {
    /// # Errors
    /// [`LayoutError::Empty`] if `top <= first_usable`.
    pub const fn new(first_usable: PhysicalAddress, top: PhysicalAddress) -> Result<Self, LayoutError> {
        if top.as_u64() <= first_usable.as_u64() {
            return Err(LayoutError::Empty { first_usable, top });
        }
        Ok(Self { first_usable, top })
    }

    /// Layout for the running kernel: from the end of its image up to
    /// [`PHYS_TOP`].
    ///
    /// # Errors
    /// [`LayoutError::Empty`] if the image reaches past [`PHYS_TOP`].
    pub const fn for_kernel(kernel_end: PhysicalAddress) -> Result<Self, LayoutError> {
        Self::new(kernel_end, PhysicalAddress::new(PHYS_TOP))
    }

    #[inline]
    #[must_use]
    pub const fn first_usable(&self) -> PhysicalAddress {
        self.first_usable
    }

    #[inline]
    #[must_use]
    pub const fn top(&self) -> PhysicalAddress {
        self.top
    }

    /// Number of whole frames between the rounded-up first usable address
    /// and `top`.
    #[must_use]
    pub const fn usable_frames(&self) -> u64 {
        match self.first_usable.align_up() {
            Some(start) if start.as_u64() < self.top.as_u64() => {
                (self.top.as_u64() - start.as_u64()) / PAGE_SIZE
            }
            _ => 0,
        }
    }

    /// Validates an address handed back to the pool.
    ///
    /// Checks, in order: alignment, lower bound, upper bound.
    ///
    /// # Errors
    /// The [`FrameFault`] describing the first violated bound.
    pub const fn check(&self, addr: PhysicalAddress) -> Result<PhysicalFrame, FrameFault> {
        if !addr.is_page_aligned() {
            return Err(FrameFault::Misaligned(addr));
        }
        if addr.as_u64() < self.first_usable.as_u64() {
            return Err(FrameFault::BelowFirstUsable {
                addr,
                first_usable: self.first_usable,
            });
        }
        if addr.as_u64() >= self.top.as_u64() {
            return Err(FrameFault::AboveTop {
                addr,
                top: self.top,
            });
        }
        match PhysicalFrame::from_start_address(addr) {
            Some(frame) => Ok(frame),
            None => Err(FrameFault::Misaligned(addr)),
        }
    }
}
