//! Markdown-lite rendering
//!
//! Terminal styling limited to exactly two substitutions: `**bold**` and
//! `` `inline code` ``. Anything fancier passes through untouched.

use regex::Regex;

/// Applies the two markdown-lite substitutions for terminal output
pub struct Renderer {
    bold: Regex,
    code: Regex,
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            bold: Regex::new(r"\*\*(.+?)\*\*").expect("bold pattern"),
            code: Regex::new(r"`([^`]+)`").expect("code pattern"),
        }
    }

    /// Render a line of reply text with ANSI styling
    pub fn render(&self, text: &str) -> String {
        let text = self.bold.replace_all(text, "\x1b[1m$1\x1b[0m");
        self.code.replace_all(&text, "\x1b[36m$1\x1b[0m").into_owned()
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bold_substitution() {
        let renderer = Renderer::new();
        assert_eq!(renderer.render("a **big** deal"), "a \x1b[1mbig\x1b[0m deal");
    }

    #[test]
    fn test_code_substitution() {
        let renderer = Renderer::new();
        assert_eq!(
            renderer.render("run `cargo test` now"),
            "run \x1b[36mcargo test\x1b[0m now"
        );
    }

    #[test]
    fn test_plain_text_passes_through() {
        let renderer = Renderer::new();
        assert_eq!(renderer.render("# heading *italic*"), "# heading *italic*");
    }
}
