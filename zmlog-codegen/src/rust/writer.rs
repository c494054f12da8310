//! Indented line writer.

const INDENT: &str = "    ";

/// Accumulates generated source with four-space indentation.
#[derive(Debug, Default)]
pub struct CodeWriter {
    out: String,
    depth: usize,
}

impl CodeWriter {
    /// Creates an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes one line at the current indentation.
    pub fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if !text.is_empty() {
            for _ in 0..self.depth {
                self.out.push_str(INDENT);
            }
            self.out.push_str(text);
        }
        self.out.push('\n');
    }

    /// Writes a line and indents what follows.
    pub fn open(&mut self, text: impl AsRef<str>) {
        self.line(text);
        self.depth += 1;
    }

    /// Dedents and writes a line.
    pub fn close(&mut self, text: impl AsRef<str>) {
        self.depth = self.depth.saturating_sub(1);
        self.line(text);
    }

    /// Current indentation depth.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Returns the generated text.
    #[must_use]
    pub fn finish(self) -> String {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nesting() {
        let mut w = CodeWriter::new();
        w.open("fn f() {");
        w.line("let x = 1;");
        w.line("");
        w.open("if x == 1 {");
        w.line("g();");
        w.close("}");
        w.close("}");
        assert_eq!(w.depth(), 0);
        assert_eq!(
            w.finish(),
            "fn f() {\n    let x = 1;\n\n    if x == 1 {\n        g();\n    }\n}\n"
        );
    }
}
