//! Tokeniser for build description files.
//!
//! The scanner yields whitespace-separated words and single-character
//! structural tokens. Outside value lists `( ) [ ] :` are structural; inside
//! a value list only `[` and `]` are, so values may contain `:` and `(`.
//! `#` starts a comment that runs to the end of the line.

use crate::error::{ParseError, ParseErrorKind};

/// Which characters terminate a word and form tokens of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Directive structure: `( ) [ ] :`.
    Structural,
    /// Inside a value list: `[ ]`.
    Bracket,
}

impl Mode {
    const fn is_special(self, ch: char) -> bool {
        match self {
            Self::Structural => matches!(ch, '(' | ')' | '[' | ']' | ':'),
            Self::Bracket => matches!(ch, '[' | ']'),
        }
    }
}

/// A scanned token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    /// Token text.
    pub text: &'a str,
    /// Whether whitespace or a comment preceded the token.
    pub spaced: bool,
}

/// Streaming tokeniser over one description file.
#[derive(Debug)]
pub struct Scanner<'a> {
    src: &'a str,
    pos: usize,
    mode: Mode,
    file: String,
}

impl<'a> Scanner<'a> {
    /// Scan `src`, attributing errors to `file`.
    #[must_use]
    pub fn new(src: &'a str, file: impl Into<String>) -> Self {
        Self {
            src,
            pos: 0,
            mode: Mode::Structural,
            file: file.into(),
        }
    }

    /// Name of the file being scanned.
    #[must_use]
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Switch the special-character set.
    pub const fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    fn peek_char(&self) -> Option<char> {
        self.src.get(self.pos..).and_then(|rest| rest.chars().next())
    }

    fn skip_blank(&mut self) -> bool {
        let mut skipped = false;
        let mut in_comment = false;
        while let Some(ch) = self.peek_char() {
            if in_comment {
                in_comment = ch != '\n';
            } else if ch == '#' {
                in_comment = true;
            } else if !ch.is_whitespace() {
                break;
            }
            self.pos += ch.len_utf8();
            skipped = true;
        }
        skipped
    }

    /// Return the next token, or `None` at end of input.
    pub fn next_token(&mut self) -> Option<Token<'a>> {
        let spaced = self.skip_blank();
        let start = self.pos;
        let first = self.peek_char()?;
        self.pos += first.len_utf8();
        if !self.mode.is_special(first) {
            while let Some(ch) = self.peek_char() {
                if ch.is_whitespace() || self.mode.is_special(ch) {
                    break;
                }
                self.pos += ch.len_utf8();
            }
        }
        let text = self.src.get(start..self.pos)?;
        Some(Token { text, spaced })
    }

    /// Like [`Scanner::next_token`] but end of input is an error.
    ///
    /// # Errors
    ///
    /// Returns [`ParseErrorKind::UnexpectedEof`] when no token remains.
    pub fn expect_token(&mut self) -> Result<Token<'a>, ParseError> {
        self.next_token().ok_or_else(|| self.error(ParseErrorKind::UnexpectedEof, "EOF"))
    }

    /// Build a parse error attributed to the scanned file.
    #[must_use]
    pub fn error(&self, kind: ParseErrorKind, token: &str) -> ParseError {
        ParseError::new(kind, token, self.file.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(src: &str, mode: Mode) -> Vec<String> {
        let mut scanner = Scanner::new(src, "Builddesc");
        scanner.set_mode(mode);
        std::iter::from_fn(|| scanner.next_token())
            .map(|t| t.text.to_owned())
            .collect()
    }

    #[test]
    fn structural_tokens_split_words() {
        assert_eq!(
            texts("PROG(foo srcs:dev[a.c])", Mode::Structural),
            ["PROG", "(", "foo", "srcs", ":", "dev", "[", "a.c", "]", ")"]
        );
    }

    #[test]
    fn colon_is_plain_inside_brackets() {
        assert_eq!(texts("a:b [c]", Mode::Bracket), ["a:b", "[", "c", "]"]);
    }

    #[test]
    fn comments_run_to_end_of_line() {
        assert_eq!(
            texts("# heading\nCONFIG( # trailing\n)", Mode::Structural),
            ["CONFIG", "(", ")"]
        );
    }

    #[test]
    fn spacing_is_reported() {
        let mut scanner = Scanner::new("a[b c", "x");
        scanner.set_mode(Mode::Bracket);
        let spaced: Vec<bool> = std::iter::from_fn(|| scanner.next_token())
            .map(|t| t.spaced)
            .collect();
        assert_eq!(spaced, [false, false, false, true]);
    }

    #[test]
    fn end_of_input_is_an_error_when_expected() {
        let mut scanner = Scanner::new("   ", "lib/Builddesc");
        let err = scanner.expect_token().expect_err("no tokens");
        assert_eq!(err.kind, ParseErrorKind::UnexpectedEof);
        assert_eq!(err.builddesc, "lib/Builddesc");
    }
}
