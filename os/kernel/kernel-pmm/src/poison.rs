//! Junk patterns written over whole frames.
//!
//! A frame is filled with [`FREED_JUNK`] when it comes back to the pool and
//! with [`ALLOC_JUNK`] when it leaves. Stale reads through a dangling
//! reference then see `0x01` bytes, and code that forgets to initialize a
//! fresh frame sees `0x05` bytes, instead of plausible leftovers.

use crate::addresses::PhysicalFrame;
use crate::platform::PhysMapper;
use kernel_info::memory::PAGE_SIZE;

/// Byte written over every frame returned to the pool.
pub const FREED_JUNK: u8 = 0x01;

/// Byte written over every frame handed out by the pool.
pub const ALLOC_JUNK: u8 = 0x05;

#[allow(clippy::cast_possible_truncation)]
const FRAME_BYTES: usize = PAGE_SIZE as usize;

const _: () = assert!(FREED_JUNK != ALLOC_JUNK);

/// Overwrites all of `frame` with `byte`.
///
/// # Safety
/// `mapper` must map `frame` writable, and nobody else may access the frame
/// while it is being filled.
pub(crate) unsafe fn fill_frame<M: PhysMapper + ?Sized>(mapper: &M, frame: PhysicalFrame, byte: u8) {
    let ptr = mapper.phys_to_ptr(frame.start_address());
    unsafe { core::ptr::write_bytes(ptr, byte, FRAME_BYTES) }
}
