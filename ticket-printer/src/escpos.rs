//! ESC/POS command builder
//!
//! Tickets are built as UTF-8 strings with the control sequences inlined.
//! The string form is what gets persisted on a print job; conversion to
//! printer bytes happens at dispatch time with [`crate::encode_cp1252`].

/// Raw ESC/POS control sequences
pub mod cmd {
    /// ESC @ - Initialize printer
    pub const INIT: &str = "\x1B@";
    /// ESC a 0 - Left alignment
    pub const ALIGN_LEFT: &str = "\x1Ba\x00";
    /// ESC a 1 - Center alignment
    pub const ALIGN_CENTER: &str = "\x1Ba\x01";
    /// ESC E 1 - Bold on
    pub const BOLD_ON: &str = "\x1BE\x01";
    /// ESC E 0 - Bold off
    pub const BOLD_OFF: &str = "\x1BE\x00";
    /// GS ! 0x11 - Double width and height
    pub const SIZE_DOUBLE: &str = "\x1D!\x11";
    /// GS ! 0x00 - Normal size
    pub const SIZE_NORMAL: &str = "\x1D!\x00";
    /// GS V 1 - Partial cut
    pub const CUT_PARTIAL: &str = "\x1DV\x01";
}

/// String-based ESC/POS command builder
///
/// Common widths:
/// - 58mm paper: 32 characters
/// - 80mm paper: 48 characters
pub struct EscPosBuilder {
    buf: String,
    width: usize,
}

impl EscPosBuilder {
    /// Create a new builder with the specified paper width in characters
    pub fn new(width: usize) -> Self {
        Self {
            buf: String::with_capacity(1024),
            width,
        }
    }

    /// Initialize printer (ESC @)
    pub fn init(&mut self) -> &mut Self {
        self.buf.push_str(cmd::INIT);
        self
    }

    // === Text Output ===

    /// Write raw text
    pub fn text(&mut self, s: &str) -> &mut Self {
        self.buf.push_str(s);
        self
    }

    /// Write text followed by newline
    pub fn line(&mut self, s: &str) -> &mut Self {
        self.buf.push_str(s);
        self.buf.push('\n');
        self
    }

    /// Write empty line
    pub fn newline(&mut self) -> &mut Self {
        self.buf.push('\n');
        self
    }

    /// Write `lines` empty lines
    pub fn blank_lines(&mut self, lines: usize) -> &mut Self {
        for _ in 0..lines {
            self.buf.push('\n');
        }
        self
    }

    // === Alignment ===

    /// Align text to center
    pub fn center(&mut self) -> &mut Self {
        self.buf.push_str(cmd::ALIGN_CENTER);
        self
    }

    /// Align text to left (default)
    pub fn left(&mut self) -> &mut Self {
        self.buf.push_str(cmd::ALIGN_LEFT);
        self
    }

    // === Text Style ===

    /// Enable bold text
    pub fn bold(&mut self) -> &mut Self {
        self.buf.push_str(cmd::BOLD_ON);
        self
    }

    /// Disable bold text
    pub fn bold_off(&mut self) -> &mut Self {
        self.buf.push_str(cmd::BOLD_OFF);
        self
    }

    /// Double width and height
    pub fn double_size(&mut self) -> &mut Self {
        self.buf.push_str(cmd::SIZE_DOUBLE);
        self
    }

    /// Reset to normal size
    pub fn reset_size(&mut self) -> &mut Self {
        self.buf.push_str(cmd::SIZE_NORMAL);
        self
    }

    /// Write a whole line in bold
    pub fn bold_line(&mut self, s: &str) -> &mut Self {
        self.bold();
        self.text(s);
        self.bold_off();
        self.newline()
    }

    // === Separators ===

    /// Print a line of '-' characters
    pub fn separator(&mut self) -> &mut Self {
        let sep = "-".repeat(self.width);
        self.line(&sep)
    }

    // === Paper Control ===

    /// Cut paper (partial cut, leaves a small connection)
    pub fn cut(&mut self) -> &mut Self {
        self.buf.push_str(cmd::CUT_PARTIAL);
        self
    }

    // === Build ===

    /// Current buffer contents
    pub fn as_str(&self) -> &str {
        &self.buf
    }

    /// Finalize and return the accumulated ticket text
    pub fn build(self) -> String {
        self.buf
    }
}

impl Default for EscPosBuilder {
    fn default() -> Self {
        Self::new(48)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_basic() {
        let mut b = EscPosBuilder::new(32);
        b.init()
            .center()
            .double_size()
            .line("LAS TORTILLAS")
            .reset_size()
            .left()
            .line("conteúdo");

        let s = b.build();
        assert!(s.starts_with(cmd::INIT));
        assert!(s.contains("\x1Ba\x01\x1D!\x11LAS TORTILLAS\n"));
        assert!(s.ends_with("conteúdo\n"));
    }

    #[test]
    fn test_bold_line() {
        let mut b = EscPosBuilder::new(32);
        b.bold_line("RESUMO:");
        assert_eq!(b.as_str(), "\x1BE\x01RESUMO:\x1BE\x00\n");
    }

    #[test]
    fn test_separator_spans_width() {
        let mut b = EscPosBuilder::new(10);
        b.separator();

        let s = b.build();
        assert_eq!(s, "----------\n");
    }

    #[test]
    fn test_cut_and_blank_lines() {
        let mut b = EscPosBuilder::default();
        b.blank_lines(3).cut();
        assert_eq!(b.build(), "\n\n\n\x1DV\x01");
    }
}
