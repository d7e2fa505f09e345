//! Quote-aware character scanner shared by the statement splitter and the
//! parameter binder.
//!
//! Tracks whether the cursor sits inside a single- or double-quoted SQL
//! literal while walking a string one character at a time. Two consecutive
//! identical quote characters inside a literal are the standard SQL escape
//! for a literal quote and do not close the literal. At most one of the two
//! quote kinds is open at a time; they do not nest inside each other.

/// Running quote state for a left-to-right scan of SQL text.
///
/// The doubled-quote escape (`''` / `""`) is resolved without lookahead:
/// when the matching quote is seen inside a literal, the close is held as
/// pending until the next character decides whether it was an escape pair
/// or a real terminator. Callers must invoke [`QuoteState::finish`] after
/// the last character so a trailing quote is resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuoteState {
    in_single_quote: bool,
    in_double_quote: bool,
    pending_close: Option<char>,
}

impl QuoteState {
    /// Start a scan at top level (outside any literal).
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance over one character.
    ///
    /// Returns `true` when `ch` is in literal context: inside an open
    /// quoted literal, or a quote character delimiting one.
    pub fn step(&mut self, ch: char) -> bool {
        if let Some(quote) = self.pending_close.take() {
            if ch == quote {
                // Doubled quote: escaped literal quote, the literal stays open.
                return true;
            }
            // The previous quote really terminated the literal.
            self.in_single_quote = false;
            self.in_double_quote = false;
        }

        if self.in_single_quote {
            if ch == '\'' {
                self.pending_close = Some('\'');
            }
            return true;
        }
        if self.in_double_quote {
            if ch == '"' {
                self.pending_close = Some('"');
            }
            return true;
        }

        match ch {
            '\'' => {
                self.in_single_quote = true;
                true
            },
            '"' => {
                self.in_double_quote = true;
                true
            },
            _ => false,
        }
    }

    /// Resolve a pending close at end of input. A trailing matching quote
    /// with no character after it terminates its literal.
    pub fn finish(&mut self) {
        if self.pending_close.take().is_some() {
            self.in_single_quote = false;
            self.in_double_quote = false;
        }
    }

    /// Whether the cursor is currently inside a quoted literal.
    pub fn in_literal(&self) -> bool {
        self.in_single_quote || self.in_double_quote
    }
}

#[cfg(test)]
mod tests {
    use super::QuoteState;

    fn scan(sql: &str) -> Vec<bool> {
        let mut state = QuoteState::new();
        sql.chars().map(|c| state.step(c)).collect()
    }

    #[test]
    fn top_level_text_is_not_literal() {
        assert!(scan("SELECT 1").iter().all(|in_lit| !in_lit));
    }

    #[test]
    fn tracks_single_quoted_literal() {
        // S E L 'a b' X
        let flags = scan("SEL 'ab' X");
        assert_eq!(
            flags,
            vec![false, false, false, false, true, true, true, true, false, false]
        );
    }

    #[test]
    fn doubled_quote_does_not_close_literal() {
        let mut state = QuoteState::new();
        for ch in "'it''s".chars() {
            assert!(state.step(ch), "char {ch:?} should be literal context");
        }
        assert!(state.in_literal());
    }

    #[test]
    fn quadruple_quote_is_one_literal() {
        let mut state = QuoteState::new();
        for ch in "''''".chars() {
            state.step(ch);
        }
        state.finish();
        assert!(!state.in_literal());
    }

    #[test]
    fn quote_kinds_do_not_nest() {
        let mut state = QuoteState::new();
        for ch in r#"'he said "hi"'"#.chars() {
            assert!(state.step(ch));
        }
        state.finish();
        assert!(!state.in_literal());
    }

    #[test]
    fn trailing_quote_resolves_on_finish() {
        let mut state = QuoteState::new();
        for ch in "'done'".chars() {
            state.step(ch);
        }
        state.finish();
        assert!(!state.in_literal());
    }

    #[test]
    fn unterminated_literal_stays_open() {
        let mut state = QuoteState::new();
        for ch in "'oops".chars() {
            state.step(ch);
        }
        state.finish();
        assert!(state.in_literal());
    }
}
