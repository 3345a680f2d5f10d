use crate::addresses::{PhysicalAddress, PhysicalFrame};

/// A broken invariant of the frame pool.
///
/// These never come back to the caller as an `Err`: they are handed to
/// [`Platform::halt`](crate::Platform::halt), which stops the machine. A bad
/// address passed to `deallocate` means some owner already corrupted memory,
/// and carrying on would only spread the damage.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameFault {
    #[error("cannot free {0}: not page aligned")]
    Misaligned(PhysicalAddress),
    #[error("cannot free {addr}: below the first usable address {first_usable}")]
    BelowFirstUsable {
        addr: PhysicalAddress,
        first_usable: PhysicalAddress,
    },
    #[error("cannot free {addr}: at or above the top of physical memory {top}")]
    AboveTop {
        addr: PhysicalAddress,
        top: PhysicalAddress,
    },
    #[error("core id {core} out of range for {cores} cores")]
    CoreOutOfRange { core: usize, cores: usize },
    #[error("free list of core {core} is corrupt at {frame}: written after free")]
    CorruptFreeList { core: usize, frame: PhysicalFrame },
}

/// An unusable physical memory window.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("empty physical range [{first_usable}, {top})")]
    Empty {
        first_usable: PhysicalAddress,
        top: PhysicalAddress,
    },
}

/// Returned when a second registry is offered to
/// [`GlobalFrames::install`](crate::GlobalFrames::install).
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
#[error("frame registry already installed")]
pub struct AlreadyInstalled;
