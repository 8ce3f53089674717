//! Source locations for tokens and AST nodes
//!
//! Every token and every parsed AST node carries the position it came from,
//! so authoring errors can point at the offending spot and render a short
//! excerpt of the surrounding source.

use std::fmt;

/// Number of context lines rendered above and below the failing line.
const EXCERPT_CONTEXT_LINES: usize = 2;

/// Origin of a token or AST node within a rule source string.
///
/// Lines and columns are 1-based. `offset` is the absolute character offset
/// into the source buffer and `length` the number of characters covered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
    pub length: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize, offset: usize, length: usize) -> Self {
        Self {
            line,
            column,
            offset,
            length,
        }
    }

    /// Sentinel location used for synthetic nodes that did not come from
    /// parsing (structured condition blocks, defaults injected by the
    /// assembler).
    pub fn synthetic() -> Self {
        Self {
            line: 1,
            column: 1,
            offset: 0,
            length: 0,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.line == 1 && self.column == 1 && self.length == 0
    }

    /// Render a contextual excerpt of `source` around this location:
    /// up to two lines before and after, with a caret marker under the
    /// failing column.
    pub fn excerpt(&self, source: &str) -> String {
        let lines: Vec<&str> = source.lines().collect();
        if lines.is_empty() {
            return String::new();
        }

        let target = self.line.saturating_sub(1).min(lines.len() - 1);
        let first = target.saturating_sub(EXCERPT_CONTEXT_LINES);
        let last = (target + EXCERPT_CONTEXT_LINES).min(lines.len() - 1);

        let width = (last + 1).to_string().len();
        let mut out = String::new();
        for (idx, line) in lines.iter().enumerate().take(last + 1).skip(first) {
            out.push_str(&format!("{:>width$} | {}\n", idx + 1, line, width = width));
            if idx == target {
                let pad = width + 3 + self.column.saturating_sub(1);
                let marker = "^".repeat(self.length.max(1));
                out.push_str(&format!("{}{}\n", " ".repeat(pad), marker));
            }
        }
        out
    }
}

impl Default for SourceLocation {
    fn default() -> Self {
        Self::synthetic()
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let loc = SourceLocation::new(3, 7, 42, 5);
        assert_eq!(loc.to_string(), "line 3, column 7");
    }

    #[test]
    fn test_excerpt_marks_column() {
        let source = "first line\nsecond line\nthird line\nfourth line";
        let loc = SourceLocation::new(2, 8, 0, 4);
        let excerpt = loc.excerpt(source);
        assert!(excerpt.contains("2 | second line"));
        assert!(excerpt.contains("^^^^"));
        // Two lines of context either side
        assert!(excerpt.contains("1 | first line"));
        assert!(excerpt.contains("4 | fourth line"));
    }

    #[test]
    fn test_excerpt_clamps_to_source() {
        let loc = SourceLocation::new(99, 1, 0, 1);
        let excerpt = loc.excerpt("only line");
        assert!(excerpt.contains("1 | only line"));
    }

    #[test]
    fn test_synthetic() {
        assert!(SourceLocation::synthetic().is_synthetic());
        assert!(!SourceLocation::new(2, 1, 10, 1).is_synthetic());
    }
}
