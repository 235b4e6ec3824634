//! Source locations attached to every AST node, and the diagnostic formatting
//! used to report the first fatal error.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A half-open span in the original source text, expressed as 1-based line/column pairs.
///
/// The lexer/parser (out of scope here) is responsible for populating these on every
/// AST node it produces; the core never invents a `Span`, it only merges and reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl Span {
    pub fn new(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// Combines two spans into the smallest span covering both.
    pub fn merge(&self, other: &Span) -> Span {
        Span {
            start_line: self.start_line.min(other.start_line),
            start_col: self.start_col.min(other.start_col),
            end_line: self.end_line.max(other.end_line),
            end_col: self.end_col.max(other.end_col),
        }
    }

    /// Formats `message` behind this span using the fixed `<l>.<c>-<l>.<c> error: <msg>` format.
    pub fn to_string(&self, message: impl fmt::Display) -> String {
        format!(
            "{}.{}-{}.{} error: {}",
            self.start_line, self.start_col, self.end_line, self.end_col, message
        )
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}-{}.{}",
            self.start_line, self.start_col, self.end_line, self.end_col
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge() {
        let a = Span::new(1, 1, 1, 5);
        let b = Span::new(1, 10, 2, 3);

        assert_eq!(a.merge(&b), Span::new(1, 1, 2, 5));
    }

    #[test]
    fn test_format() {
        let span = Span::new(3, 4, 3, 9);
        assert_eq!(span.to_string("oops"), "3.4-3.9 error: oops");
    }
}
