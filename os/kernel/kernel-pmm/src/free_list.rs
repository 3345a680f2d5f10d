use crate::addresses::{PhysicalAddress, PhysicalFrame};
use crate::layout::FrameLayout;
use crate::platform::PhysMapper;
use crate::poison::FREED_JUNK;

/// Marks the last node of a list. Never page aligned, so never a frame.
const END_OF_LIST: u64 = u64::MAX;

/// Tag stored in every linked node: the freed junk pattern over a full word.
///
/// Since the rest of a free frame carries the same pattern, a free frame is
/// uniform junk except for its link word.
pub const FREE_NODE_TAG: u64 = u64::from_ne_bytes([FREED_JUNK; 8]);

/// Header overlaid on the first bytes of every **free** frame.
///
/// ```text
/// +-------------+-------------+-------------------------------+
/// | next (u64)  | tag (u64)   |  FREED_JUNK ...               |
/// +-------------+-------------+-------------------------------+
/// ^ frame base                                 frame base + 4K ^
/// ```
///
/// - `next` is the **physical** address of the next free frame in the same
///   list, or [`END_OF_LIST`].
/// - `tag` must read [`FREE_NODE_TAG`] whenever the node is unlinked; any
///   other value means someone wrote to the frame after freeing it.
#[repr(C)]
struct FreeNode {
    next: u64,
    tag: u64,
}

impl FreeNode {
    /// Typed view of the node overlay at offset 0 of `frame`.
    #[inline]
    fn overlay<M: PhysMapper + ?Sized>(mapper: &M, frame: PhysicalFrame) -> *mut Self {
        let ptr = mapper.phys_to_ptr(frame.start_address()).cast::<Self>();
        debug_assert!(ptr.is_aligned(), "frame {frame} maps to a misaligned pointer");
        ptr
    }
}

/// Intrusive LIFO stack of free frames.
///
/// The list itself stores only the head and a length; the links live inside
/// the frames. It performs no locking, and its owner wraps it in a
/// [`SpinLock`](kernel_sync::SpinLock).
///
/// # Invariants
/// - Every linked frame carries a valid [`FreeNode`] at offset 0.
/// - `len` equals the number of linked frames.
#[derive(Debug)]
pub(crate) struct FreeList {
    head: Option<PhysicalFrame>,
    len: usize,
}

impl FreeList {
    pub(crate) const fn new() -> Self {
        Self { head: None, len: 0 }
    }

    #[inline]
    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) const fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Links `frame` in as the new head.
    ///
    /// # Safety
    /// - `mapper` must map `frame` writable.
    /// - The frame must be exclusively owned by the caller and not already
    ///   linked into any list.
    pub(crate) unsafe fn push<M: PhysMapper + ?Sized>(&mut self, mapper: &M, frame: PhysicalFrame) {
        let next = self.head.map_or(END_OF_LIST, |f| f.start_address().as_u64());
        let node = FreeNode::overlay(mapper, frame);
        unsafe {
            node.write(FreeNode {
                next,
                tag: FREE_NODE_TAG,
            });
        }
        self.head = Some(frame);
        self.len += 1;
    }

    /// Unlinks and returns the head.
    ///
    /// The link to the next node must name a frame inside `layout`, so a
    /// clobbered link is never followed into memory the pool does not own.
    ///
    /// # Errors
    /// Returns the head frame, leaving the list untouched, if its node no
    /// longer reads as a valid free node.
    ///
    /// # Safety
    /// `mapper` must map every linked frame.
    pub(crate) unsafe fn pop<M: PhysMapper + ?Sized>(
        &mut self,
        mapper: &M,
        layout: &FrameLayout,
    ) -> Result<Option<PhysicalFrame>, PhysicalFrame> {
        let Some(frame) = self.head else {
            return Ok(None);
        };
        let node = unsafe { FreeNode::overlay(mapper, frame).read() };
        if node.tag != FREE_NODE_TAG {
            return Err(frame);
        }
        self.head = match node.next {
            END_OF_LIST => None,
            next => match layout.check(PhysicalAddress::new(next)) {
                Ok(next) => Some(next),
                Err(_) => return Err(frame),
            },
        };
        self.len -= 1;
        Ok(Some(frame))
    }
}
