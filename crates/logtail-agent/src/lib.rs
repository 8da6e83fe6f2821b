//! # Logtail Agent
//!
//! This crate provides a native Rust implementation of a log-tailing telemetry
//! agent: it follows growing text files, reassembles logical records from
//! physical lines, and forwards normalized records to a sink channel.
//!
//! ## Overview
//!
//! The agent is built around a per-stream **multiline engine** that decides,
//! line by line, whether a physical line continues an in-progress record or
//! completes one. The decision combines a regular-expression continuation
//! predicate with an escape-aware quote scanner, and a timeout-driven forced
//! flush bounds how long an incomplete record may be held.
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//! - [`config`]: Configuration management - YAML files, validation, and defaults
//! - [`tail`]: File tailing, multiline record assembly, and record forwarding
//! - [`logger`]: Logging infrastructure and tracing setup
//!
//! Each configured source gets its own engine instance and buffer; engine
//! state is never shared between streams.

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(unused_extern_crates)]
#![deny(unused_allocation)]
#![deny(unused_assignments)]
#![deny(unused_comparisons)]
#![deny(unreachable_pub)]
#![allow(missing_docs)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::needless_pass_by_value)]

/// Configuration management - YAML files, validation, and defaults
pub mod config;

/// Logging infrastructure and tracing setup
pub mod logger;

/// File tailing, multiline record assembly, and record forwarding
pub mod tail;

/// Agent version reported in startup logs.
pub const AGENT_VERSION: &str = "0.1.0";
