//! Tab-managed text buffer for source emission.

/// Accumulates emitted source, tracking the indent level and the current
/// row so the method emitter can tell whether its last row was a return.
#[derive(Debug, Default)]
pub struct SourceWriter {
    buf: String,
    tab: usize,
    row: usize,
}

impl SourceWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append raw text to the current line.
    pub fn code(&mut self, text: &str) {
        self.buf.push_str(text);
    }

    /// Append the current indentation.
    pub fn tabs(&mut self) {
        for _ in 0..self.tab {
            self.buf.push('\t');
        }
    }

    /// Terminate the current line.
    pub fn newline(&mut self) {
        self.buf.push('\n');
        self.row += 1;
    }

    /// Append one fully indented line.
    pub fn line(&mut self, text: &str) {
        self.tabs();
        self.code(text);
        self.newline();
    }

    pub fn indent(&mut self) {
        self.tab += 1;
    }

    pub fn dedent(&mut self) {
        self.tab = self.tab.saturating_sub(1);
    }

    /// Number of completed rows.
    pub fn row(&self) -> usize {
        self.row
    }

    pub fn finish(self) -> String {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_respect_indentation() {
        let mut w = SourceWriter::new();
        w.line("if ok {");
        w.indent();
        w.line("return");
        w.dedent();
        w.line("}");
        assert_eq!(w.finish(), "if ok {\n\treturn\n}\n");
    }

    #[test]
    fn row_counts_completed_lines() {
        let mut w = SourceWriter::new();
        assert_eq!(w.row(), 0);
        w.line("a");
        w.line("b");
        assert_eq!(w.row(), 2);
    }
}
