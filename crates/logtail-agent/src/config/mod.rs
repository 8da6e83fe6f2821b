//! Configuration Module
//!
//! This module handles all configuration for the agent: parsing from YAML
//! files, validation, and sensible defaults.
//!
//! ## Edge Cases and Behaviors
//!
//! - **Missing config file**: All fields fall back to defaults (an agent with
//!   no sources starts and idles).
//! - **Invalid multiline pattern**: Fatal for the owning source at
//!   construction time; the agent refuses to start that stream.
//! - **Unrecognized `quotation` value**: Lenient - logged and treated as
//!   disabled rather than failing startup.
//! - **Unrecognized `match_which_line` value**: Strict - decoding fails, and
//!   the decoded value is left at an invalid sentinel so callers that ignore
//!   the error cannot silently fall back to a valid orientation.

pub mod log_level;
pub mod multiline;

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    providers::{Format, Yaml},
    Figment,
};
use serde::{Deserialize, Deserializer};
use tracing::error;

use crate::config::{log_level::LogLevel, multiline::MultilineConfig};

/// Errors raised while decoding or validating configuration.
///
/// All configuration errors are fatal to the setup of the component they
/// belong to; there is no retry at this layer.
#[derive(Debug, PartialEq, Eq)]
#[allow(clippy::module_name_repetitions)]
pub enum ConfigError {
    /// A regular-expression pattern failed to compile.
    InvalidPattern(String),
    /// A configuration scalar could not be decoded.
    ParseError(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPattern(msg) | ConfigError::ParseError(msg) => {
                write!(f, "{msg}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Top-level agent configuration.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Agent log verbosity.
    pub log_level: LogLevel,
    /// Sources to tail; each gets its own engine instance and buffer.
    pub sources: Vec<SourceConfig>,
}

/// Configuration for a single tailed source.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Path of the file to tail.
    pub path: PathBuf,
    /// Read the file from its start instead of seeking to the end first.
    pub from_beginning: bool,
    /// Multiline record-assembly settings for this source.
    pub multiline: MultilineConfig,
}

impl Config {
    /// Loads the configuration from a YAML file.
    ///
    /// A missing file yields the default configuration; a present but
    /// malformed file is a [`ConfigError`].
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        Figment::new()
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .map_err(|e| {
                ConfigError::ParseError(format!(
                    "failed to load configuration from {}: {e}",
                    path.as_ref().display()
                ))
            })
    }
}

/// Deserializes an optional duration given in seconds (integer or float).
///
/// Negative values are rejected leniently: they are logged and treated as
/// unset so the consuming component applies its default.
pub fn deserialize_optional_duration_from_seconds<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Duration>, D::Error> {
    struct DurationVisitor;
    impl<'de> serde::de::Visitor<'de> for DurationVisitor {
        type Value = Option<Duration>;
        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "a duration in seconds (integer or float)")
        }
        fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(Duration::from_secs(v)))
        }
        fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Self::Value, E> {
            if v < 0 {
                error!("Failed to parse duration: negative durations are not allowed, ignoring");
                return Ok(None);
            }
            self.visit_u64(u64::try_from(v).expect("positive i64 to u64 conversion never fails"))
        }
        fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<Self::Value, E> {
            if v < 0f64 {
                error!("Failed to parse duration: negative durations are not allowed, ignoring");
                return Ok(None);
            }
            Ok(Some(Duration::from_secs_f64(v)))
        }
        fn visit_none<E: serde::de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }
        fn visit_some<D2: Deserializer<'de>>(self, d: D2) -> Result<Self::Value, D2::Error> {
            d.deserialize_any(DurationVisitor)
        }
    }
    deserializer.deserialize_option(DurationVisitor)
}
