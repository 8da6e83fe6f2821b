//! Multiline record-assembly configuration.
//!
//! These settings control how the tail engine joins physical lines into
//! logical records. The raw config deserialized here is validated and
//! compiled into an engine instance by
//! [`Multiline::new`](crate::tail::multiline::Multiline::new).
//!
//! # Example Configuration
//!
//! ```yaml
//! sources:
//!   - path: /var/log/app.log
//!     multiline:
//!       # Lines starting with whitespace continue the previous line
//!       pattern: '^\s'
//!       match_which_line: previous
//!       preserve_newline: true
//!       timeout: 5
//! ```

use std::time::Duration;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::error;

use crate::config::{deserialize_optional_duration_from_seconds, ConfigError};

/// Default bound on how long an incomplete record may wait before the owner
/// of the stream forces a flush.
pub const DEFAULT_MULTILINE_TIMEOUT: Duration = Duration::from_secs(5);

/// Which neighboring line a pattern-matching line attaches to.
///
/// The configuration scalar may be supplied bare or wrapped in single or
/// double quotation marks; the literal comparison after stripping is
/// case-sensitive. The [`Invalid`](MatchWhichLine::Invalid) variant is a
/// sentinel left behind by a failed [`decode_scalar`](Self::decode_scalar)
/// call so callers that ignore the error can still detect "never successfully
/// parsed"; it is not constructible from valid input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MatchWhichLine {
    /// A matching line is a continuation of the previous line.
    ///
    /// This is the **default** orientation when none is configured.
    #[default]
    Previous,
    /// A matching line continues into the next line.
    Next,
    /// Sentinel for a scalar that never decoded successfully.
    Invalid,
}

impl MatchWhichLine {
    /// Decodes a configuration scalar, stripping one wrapping pair of `'` or
    /// `"` quotation marks before the (case-sensitive) literal comparison.
    pub fn from_scalar(raw: &str) -> Result<Self, ConfigError> {
        match strip_scalar_quotes(raw) {
            "previous" => Ok(MatchWhichLine::Previous),
            "next" => Ok(MatchWhichLine::Next),
            other => Err(ConfigError::ParseError(format!(
                "unrecognized match_which_line value {other:?}, must be \"previous\" or \"next\"",
            ))),
        }
    }

    /// Decodes a scalar in place.
    ///
    /// On failure the value is left at [`MatchWhichLine::Invalid`], never at
    /// a valid orientation.
    pub fn decode_scalar(&mut self, raw: &str) -> Result<(), ConfigError> {
        match Self::from_scalar(raw) {
            Ok(value) => {
                *self = value;
                Ok(())
            }
            Err(e) => {
                *self = MatchWhichLine::Invalid;
                Err(e)
            }
        }
    }
}

/// Strips exactly one wrapping pair of matching `'` or `"` quotation marks.
fn strip_scalar_quotes(raw: &str) -> &str {
    for quote in ['\'', '"'] {
        if let Some(stripped) = raw
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return stripped;
        }
    }
    raw
}

/// Strict deserialization: an unrecognized orientation fails config loading
/// so a stream never starts with a silently defaulted orientation.
impl<'de> Deserialize<'de> for MatchWhichLine {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        MatchWhichLine::from_scalar(&raw).map_err(serde::de::Error::custom)
    }
}

/// Quote style tracked by the engine's quote scanner.
///
/// Maps deterministically to exactly one quote character. Absent or
/// unrecognized quoting configuration disables quote scanning rather than
/// failing startup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Quotation {
    /// Quote scanning disabled.
    #[default]
    Disabled,
    /// Track spans wrapped in `'`.
    SingleQuotes,
    /// Track spans wrapped in `"`.
    DoubleQuotes,
    /// Track spans wrapped in `` ` ``.
    Backticks,
}

impl Quotation {
    /// The quote character scanned for, or `None` when scanning is disabled.
    #[must_use]
    pub fn quote_char(self) -> Option<char> {
        match self {
            Quotation::Disabled => None,
            Quotation::SingleQuotes => Some('\''),
            Quotation::DoubleQuotes => Some('"'),
            Quotation::Backticks => Some('`'),
        }
    }
}

/// Lenient deserialization: unknown values are logged and treated as
/// disabled, never a hard failure.
impl<'de> Deserialize<'de> for Quotation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;

        if let Value::String(s) = value {
            match s.as_str() {
                "" => Ok(Quotation::Disabled),
                "single-quotes" => Ok(Quotation::SingleQuotes),
                "double-quotes" => Ok(Quotation::DoubleQuotes),
                "backticks" => Ok(Quotation::Backticks),
                other => {
                    error!("Invalid quotation setting: {:?}, disabling quote scanning", other);
                    Ok(Quotation::Disabled)
                }
            }
        } else {
            error!("Expected a string for quotation, got {:?}", value);
            Ok(Quotation::Disabled)
        }
    }
}

/// Raw multiline settings for one tailed source.
///
/// An empty `pattern` together with [`Quotation::Disabled`] makes the engine
/// a strict line-by-line passthrough: every call immediately completes a
/// one-line record.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
#[allow(clippy::module_name_repetitions)]
pub struct MultilineConfig {
    /// Continuation predicate source; empty means "never matches".
    pub pattern: String,
    /// Which neighbor a matching line attaches to.
    pub match_which_line: MatchWhichLine,
    /// Flips the raw predicate result before use.
    pub invert_match: bool,
    /// Forced-flush threshold in seconds; defaults to 5 s at construction.
    #[serde(deserialize_with = "deserialize_optional_duration_from_seconds")]
    pub timeout: Option<Duration>,
    /// Quote style for the quote scanner.
    pub quotation: Quotation,
    /// Join with `"\n"` instead of concatenating records byte-to-byte.
    pub preserve_newline: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn decode_scalar_accepts_bare_and_quoted_literals() {
        let mut w = MatchWhichLine::default();

        w.decode_scalar("previous").unwrap();
        assert_eq!(w, MatchWhichLine::Previous);

        w.decode_scalar("\"previous\"").unwrap();
        assert_eq!(w, MatchWhichLine::Previous);

        w.decode_scalar("'previous'").unwrap();
        assert_eq!(w, MatchWhichLine::Previous);

        w.decode_scalar("next").unwrap();
        assert_eq!(w, MatchWhichLine::Next);

        w.decode_scalar("\"next\"").unwrap();
        assert_eq!(w, MatchWhichLine::Next);

        w.decode_scalar("'next'").unwrap();
        assert_eq!(w, MatchWhichLine::Next);
    }

    #[test]
    fn decode_scalar_leaves_invalid_sentinel_on_failure() {
        let mut w = MatchWhichLine::Previous;
        assert!(w.decode_scalar("nope").is_err());
        assert_eq!(w, MatchWhichLine::Invalid);
    }

    #[test]
    fn literal_comparison_is_case_sensitive() {
        assert!(MatchWhichLine::from_scalar("Previous").is_err());
        assert!(MatchWhichLine::from_scalar("NEXT").is_err());
    }

    #[test]
    fn mismatched_quotes_are_not_stripped() {
        assert!(MatchWhichLine::from_scalar("'previous\"").is_err());
    }

    #[test]
    fn default_orientation_is_previous() {
        assert_eq!(MatchWhichLine::default(), MatchWhichLine::Previous);

        let config: MultilineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.match_which_line, MatchWhichLine::Previous);
    }

    #[test]
    fn deserialize_rejects_unknown_orientation() {
        let result: Result<MatchWhichLine, _> = serde_json::from_value(serde_json::json!("nope"));
        assert!(result.is_err());
    }

    #[test]
    fn quotation_maps_to_exactly_one_character() {
        assert_eq!(Quotation::Disabled.quote_char(), None);
        assert_eq!(Quotation::SingleQuotes.quote_char(), Some('\''));
        assert_eq!(Quotation::DoubleQuotes.quote_char(), Some('"'));
        assert_eq!(Quotation::Backticks.quote_char(), Some('`'));
    }

    #[test]
    fn quotation_unknown_value_is_disabled() {
        let q: Quotation = serde_json::from_value(serde_json::json!("triple-quotes")).unwrap();
        assert_eq!(q, Quotation::Disabled);

        let q: Quotation = serde_json::from_value(serde_json::json!(1)).unwrap();
        assert_eq!(q, Quotation::Disabled);
    }

    #[test]
    fn quotation_empty_string_is_disabled() {
        let q: Quotation = serde_json::from_value(serde_json::json!("")).unwrap();
        assert_eq!(q, Quotation::Disabled);
    }

    #[test]
    fn config_deserializes_all_fields() {
        let config: MultilineConfig = serde_json::from_str(
            r#"{"pattern": "=>$", "match_which_line": "next", "invert_match": true,
                "timeout": 10, "quotation": "double-quotes", "preserve_newline": true}"#,
        )
        .unwrap();
        assert_eq!(config.pattern, "=>$");
        assert_eq!(config.match_which_line, MatchWhichLine::Next);
        assert!(config.invert_match);
        assert_eq!(config.timeout, Some(Duration::from_secs(10)));
        assert_eq!(config.quotation, Quotation::DoubleQuotes);
        assert!(config.preserve_newline);
    }
}
