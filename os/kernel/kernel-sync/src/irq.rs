//! Scoped suppression of local interrupt delivery.
//!
//! Code that samples per-core state (such as "which core am I on") must not
//! be migrated to another core between the read and its use. Masking local
//! interrupts for the duration of the read prevents the timer interrupt that
//! would drive such a migration.
//!
//! The mechanism is abstracted behind [`InterruptControl`] so that the same
//! guard works with the real `cli`/`sti` pair ([`X86Interrupts`]) and with
//! host-side test doubles.

/// Access to the local core's interrupt-enable flag.
pub trait InterruptControl {
    /// Whether local interrupt delivery is currently enabled.
    fn interrupts_enabled(&self) -> bool;

    /// Masks local interrupt delivery.
    fn disable_interrupts(&self);

    /// Unmasks local interrupt delivery.
    fn enable_interrupts(&self);
}

impl<I: InterruptControl + ?Sized> InterruptControl for &I {
    #[inline]
    fn interrupts_enabled(&self) -> bool {
        (**self).interrupts_enabled()
    }

    #[inline]
    fn disable_interrupts(&self) {
        (**self).disable_interrupts();
    }

    #[inline]
    fn enable_interrupts(&self) {
        (**self).enable_interrupts();
    }
}

/// RAII guard that disables interrupts on creation and restores them on drop.
///
/// `IrqGuard::new()` snapshots the interrupt-enable state. If interrupts were
/// enabled, it disables them. On drop, it re-enables them **only** if they
/// were previously enabled, so guards nest: an inner guard created while an
/// outer one is alive leaves interrupts masked when it goes away.
///
/// # Examples
///
/// ```ignore
/// use kernel_sync::{IrqGuard, X86Interrupts};
///
/// let cpu = X86Interrupts;
/// let core = {
///     let _irq = IrqGuard::new(&cpu); // interrupts masked from here
///     read_core_id()
/// }; // restored here
/// ```
#[must_use = "interrupts are restored as soon as the guard is dropped"]
pub struct IrqGuard<'a, I: InterruptControl + ?Sized> {
    control: &'a I,
    /// Whether interrupts were enabled when the guard was created.
    were_enabled: bool,
}

impl<'a, I: InterruptControl + ?Sized> IrqGuard<'a, I> {
    /// Disables interrupts if they are currently enabled and remembers the state.
    #[inline]
    pub fn new(control: &'a I) -> Self {
        let were_enabled = control.interrupts_enabled();
        if were_enabled {
            control.disable_interrupts();
        }
        Self {
            control,
            were_enabled,
        }
    }

    /// Whether this guard will re-enable interrupts when dropped.
    #[inline]
    #[must_use]
    pub const fn restores(&self) -> bool {
        self.were_enabled
    }
}

impl<I: InterruptControl + ?Sized> Drop for IrqGuard<'_, I> {
    /// Restores interrupts only if they were previously enabled.
    fn drop(&mut self) {
        if self.were_enabled {
            self.control.enable_interrupts();
        }
    }
}

/// [`InterruptControl`] backed by the x86 `IF` flag.
///
/// # Safety & Privilege
///
/// Uses `cli`/`sti` and `pushfq/pop`; these must run in a context where
/// they are legal (kernel mode or a suitable hypervisor context). Calling
/// from user space is invalid.
#[cfg(target_arch = "x86_64")]
#[derive(Debug, Default, Copy, Clone)]
pub struct X86Interrupts;

#[cfg(target_arch = "x86_64")]
impl X86Interrupts {
    /// Bit 9 of `RFLAGS`.
    const IF: u64 = 1 << 9;

    /// Returns the current `RFLAGS` value (via `pushfq/pop`).
    #[inline]
    #[must_use]
    pub fn rflags() -> u64 {
        let r: u64;
        unsafe { core::arch::asm!("pushfq; pop {}", out(reg) r, options(nomem, preserves_flags)) }
        r
    }
}

#[cfg(target_arch = "x86_64")]
impl InterruptControl for X86Interrupts {
    #[inline]
    fn interrupts_enabled(&self) -> bool {
        Self::rflags() & Self::IF != 0
    }

    #[inline]
    fn disable_interrupts(&self) {
        unsafe { core::arch::asm!("cli", options(nomem, nostack, preserves_flags)) }
    }

    #[inline]
    fn enable_interrupts(&self) {
        unsafe { core::arch::asm!("sti", options(nomem, nostack, preserves_flags)) }
    }
}
