//! # QEMU Debug Console
//!
//! Kernel-to-host text output through QEMU's debug console port (`0x402`,
//! enabled on the host with `-debugcon stdio`), plus a [`log`] backend on top
//! of it.
//!
//! ```text
//! log::info!(..) ──► QemuLogger ──┐
//! qemu_trace!(..) ────────────────┼─► DebugConsole (fmt::Write) ─► out 0x402, al
//! VMM console output ─────────────┘
//! ```
//!
//! ## Feature `enabled` (default)
//!
//! With the feature disabled every write is a no-op, which keeps the crate
//! usable on real hardware and on hosts where port I/O is unavailable.
//!
//! ## Usage
//! ```rust,no_run
//! use kernel_qemu::QemuLogger;
//! use log::LevelFilter;
//!
//! QemuLogger::new(LevelFilter::Debug).init().ok();
//! log::info!("paging online");
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod logger;

use core::fmt;

pub use logger::QemuLogger;

/// The port number for QEMU's debug console.
pub const QEMU_DEBUG_PORT: u16 = 0x402;

/// Byte sink writing to QEMU's debug console.
#[derive(Debug, Default, Copy, Clone)]
pub struct DebugConsole;

impl DebugConsole {
    /// Write a single byte to the debug port.
    #[allow(clippy::inline_always, clippy::unused_self)]
    #[inline(always)]
    pub fn putc(self, c: u8) {
        #[cfg(all(feature = "enabled", any(target_arch = "x86", target_arch = "x86_64")))]
        unsafe {
            core::arch::asm!(
                "out dx, al",
                in("dx") QEMU_DEBUG_PORT,
                in("al") c,
                options(nomem, nostack, preserves_flags)
            );
        }

        #[cfg(not(all(feature = "enabled", any(target_arch = "x86", target_arch = "x86_64"))))]
        let _ = c;
    }
}

impl fmt::Write for DebugConsole {
    #[inline]
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for b in s.bytes() {
            self.putc(b);
        }
        Ok(())
    }
}

#[doc(hidden)]
pub mod qemu_fmt {
    use core::fmt;

    #[doc(hidden)]
    #[inline]
    pub fn qemu_write(args: fmt::Arguments) {
        // Best-effort debug output.
        let _ = fmt::write(&mut crate::DebugConsole, args);
    }
}

/// Formatted, allocation-free output to the QEMU debug console.
#[macro_export]
macro_rules! qemu_trace {
    ($($arg:tt)*) => {{
        $crate::qemu_fmt::qemu_write(core::format_args!($($arg)*));
    }};
}
