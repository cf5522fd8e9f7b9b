//! Diagnostic console sink consumed by the VMM.
//!
//! Every [`core::fmt::Write`] is a [`Console`]; output is best-effort and write
//! errors are dropped.

use core::fmt;

/// Text sink for fault lines and table dumps.
pub trait Console {
    /// Emit `s` verbatim.
    fn emit_string(&mut self, s: &str);

    /// Emit preformatted arguments.
    fn emit_fmt(&mut self, args: fmt::Arguments<'_>);

    /// Emit `n` in decimal.
    fn emit_decimal(&mut self, n: u32) {
        self.emit_fmt(format_args!("{n}"));
    }

    /// Emit `n` as `0x`-prefixed lowercase hex without padding.
    fn emit_hex(&mut self, n: u32) {
        self.emit_fmt(format_args!("{n:#x}"));
    }

    /// Emit `label`, then `n` in hex, then a newline.
    fn emit_labeled_hex(&mut self, label: &str, n: u32) {
        self.emit_string(label);
        self.emit_hex(n);
        self.emit_string("\n");
    }
}

impl<W: fmt::Write> Console for W {
    #[inline]
    fn emit_string(&mut self, s: &str) {
        let _ = self.write_str(s);
    }

    #[inline]
    fn emit_fmt(&mut self, args: fmt::Arguments<'_>) {
        let _ = self.write_fmt(args);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_like_the_kernel_console() {
        let mut out = String::new();
        out.emit_labeled_hex("page fault @ ", 0x8000_0000);
        out.emit_decimal(42);
        out.emit_string(" ");
        out.emit_hex(0);
        assert_eq!(out, "page fault @ 0x80000000\n42 0x0");
    }
}
