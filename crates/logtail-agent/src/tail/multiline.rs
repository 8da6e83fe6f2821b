//! Multiline record assembly.
//!
//! This module implements the stateful engine that reassembles logical log
//! records from the physical lines read off a tailed file. Per line the
//! engine decides between "extend the in-progress record" and "emit a
//! completed record", combining:
//!
//! 1. **Quote scanning**: an escape-aware single-character toggle tracking
//!    whether the stream currently sits inside an unterminated quoted span.
//!    While inside a quote every line is buffered, overriding the pattern.
//! 2. **Pattern matching**: a compiled regular expression plus an invert
//!    flag, evaluated fresh per line.
//! 3. **Orientation**: whether a matching line attaches to the *previous*
//!    line or continues into the *next* one.
//!
//! The engine itself never blocks and never fails at runtime; all validation
//! happens in [`Multiline::new`]. Bounding the lifetime of an incomplete
//! record is the caller's job: measure elapsed time since the last emission
//! and call [`flush`] once the configured timeout passes (see
//! [`Tailer`](crate::tail::tailer::Tailer)).
//!
//! The quote scanner is deliberately a minimal toggle, not a grammar-aware
//! parser. Stray unmatched quote characters in malformed input desynchronize
//! the toggle and join unrelated records; this is accepted, documented
//! behavior.

use regex::Regex;

use crate::config::multiline::{
    MatchWhichLine, MultilineConfig, DEFAULT_MULTILINE_TIMEOUT,
};
use crate::config::ConfigError;

/// Per-stream multiline engine.
///
/// One instance is created per tailed source and exclusively owned by that
/// source's processing path; the quote-scanner state below is not
/// synchronized. Streams with identical configuration still get separate
/// instances.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct Multiline {
    /// Normalized configuration (timeout defaulted at construction).
    config: MultilineConfig,
    /// Compiled continuation predicate; `None` never matches.
    pattern: Option<Regex>,
    /// Quote character scanned for; `None` disables quote scanning.
    quote: Option<char>,
    /// Whether the stream currently sits inside an unterminated quoted span.
    in_quote: bool,
    /// Whether the next scanned character is consumed literally.
    escape_pending: bool,
}

impl Multiline {
    /// Validates the configuration and builds a ready engine instance.
    ///
    /// Construction is pure and repeatable; it either yields a fully built
    /// instance or a [`ConfigError`], never a partial one. A non-empty
    /// pattern that does not compile is fatal, as is an orientation left at
    /// the [`MatchWhichLine::Invalid`] sentinel by an ignored decode error.
    pub fn new(mut config: MultilineConfig) -> Result<Self, ConfigError> {
        let pattern = if config.pattern.is_empty() {
            None
        } else {
            Some(Regex::new(&config.pattern).map_err(|e| {
                ConfigError::InvalidPattern(format!(
                    "invalid multiline pattern {:?}: {e}",
                    config.pattern
                ))
            })?)
        };

        if config.match_which_line == MatchWhichLine::Invalid {
            return Err(ConfigError::ParseError(
                "match_which_line was never successfully decoded".to_string(),
            ));
        }

        let quote = config.quotation.quote_char();
        if config.timeout.is_none() {
            config.timeout = Some(DEFAULT_MULTILINE_TIMEOUT);
        }

        Ok(Multiline {
            config,
            pattern,
            quote,
            in_quote: false,
            escape_pending: false,
        })
    }

    /// Whether multiline joining is active for this stream.
    ///
    /// True iff a non-empty pattern is configured. Quote-only configurations
    /// do not report enabled here; they take effect only when the caller
    /// drives [`process_line`](Self::process_line) regardless.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.pattern.is_some()
    }

    /// The forced-flush threshold the owning stream should enforce.
    #[must_use]
    pub fn timeout(&self) -> std::time::Duration {
        self.config.timeout.unwrap_or(DEFAULT_MULTILINE_TIMEOUT)
    }

    /// Processes one physical line, in stream order, exactly once.
    ///
    /// Returns the completed logical record, or an empty string while still
    /// accumulating. The non-matching line that *terminates* a record in
    /// `Previous` orientation is never part of the text returned by the call
    /// that saw it: it seeds the next record, since a later line might still
    /// attach to it.
    pub fn process_line(&mut self, line: &str, buffer: &mut String) -> String {
        // Quote state overrides the pattern: a line that ends mid-quote is
        // buffered without any pattern evaluation.
        if self.quote.is_some() && self.scan_quotes(line) {
            self.append(buffer, line);
            return String::new();
        }

        if self.config.match_which_line == MatchWhichLine::Previous {
            if self.match_string(line) {
                self.append(buffer, line);
                return String::new();
            }
            // The current line completes whatever came before it and becomes
            // the seed of the next record.
            let completed = flush(buffer);
            self.append(buffer, line);
            completed
        } else {
            self.append(buffer, line);
            if self.match_string(line) {
                String::new()
            } else {
                flush(buffer)
            }
        }
    }

    /// Evaluates the continuation predicate for one line.
    ///
    /// Returns `false` unconditionally when no pattern is configured;
    /// otherwise the raw regex result XOR `invert_match`.
    #[must_use]
    pub fn match_string(&self, line: &str) -> bool {
        match &self.pattern {
            Some(pattern) => pattern.is_match(line) != self.config.invert_match,
            None => false,
        }
    }

    /// Runs the quote scanner over `line` from the persisted state and
    /// reports whether the stream ends the line inside a quoted span.
    fn scan_quotes(&mut self, line: &str) -> bool {
        let Some(quote) = self.quote else {
            return false;
        };
        for c in line.chars() {
            if self.escape_pending {
                // The escaped character is consumed literally and never
                // toggles quoting, whatever it is.
                self.escape_pending = false;
            } else if c == '\\' {
                self.escape_pending = true;
            } else if c == quote {
                self.in_quote = !self.in_quote;
            }
        }
        self.in_quote
    }

    /// Appends a line to the buffer, writing the join separator first iff the
    /// buffer is non-empty. Separator placement depends solely on
    /// `preserve_newline`, never on the pattern decision.
    fn append(&self, buffer: &mut String, line: &str) {
        if !buffer.is_empty() && self.config.preserve_newline {
            buffer.push('\n');
        }
        buffer.push_str(line);
    }
}

/// Drains the buffer, returning its full content and resetting it to empty
/// in one step. Flushing an empty buffer returns an empty string and is
/// otherwise a no-op.
pub fn flush(buffer: &mut String) -> String {
    std::mem::take(buffer)
}
