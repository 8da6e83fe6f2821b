//! Custom tracing formatter for agent logs.
//!
//! This module provides a custom log formatter that prefixes all log messages
//! with `LOGTAIL` so agent output is easy to separate from the application
//! logs it runs alongside.
//!
//! # Format
//!
//! ```text
//! LOGTAIL | LEVEL | [span_name{span_fields}:] message {event_fields}
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use tracing_subscriber::FmtSubscriber;
//! use logtail_agent::logger::Formatter;
//!
//! let subscriber = FmtSubscriber::builder()
//!     .event_format(Formatter)
//!     .with_max_level(tracing::Level::INFO)
//!     .finish();
//!
//! tracing::subscriber::set_global_default(subscriber)?;
//! ```

use std::fmt;
use tracing_core::{Event, Subscriber};
use tracing_subscriber::fmt::{
    format::{self, FormatEvent, FormatFields},
    FmtContext, FormattedFields,
};
use tracing_subscriber::registry::LookupSpan;

/// Custom log formatter that prefixes messages with `LOGTAIL`.
///
/// Active spans are included in the output with their fields in curly braces,
/// providing hierarchical context for nested operations:
///
/// ```text
/// LOGTAIL | INFO | tailer{path=/var/log/app.log}: started from_beginning=false
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Formatter;

impl<S, N> FormatEvent<S, N> for Formatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        // Write prefix and log level: "LOGTAIL | LEVEL | "
        let metadata = event.metadata();
        write!(&mut writer, "LOGTAIL | {} | ", metadata.level())?;

        // Format all the spans in the event's span context (from root to current)
        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                write!(writer, "{}", span.name())?;

                // Span fields were formatted during `new_span` and stored in
                // the span's extensions by the `fmt` layer
                let ext = span.extensions();
                let fields = &ext
                    .get::<FormattedFields<N>>()
                    .expect("will never be `None`");

                if !fields.is_empty() {
                    write!(writer, "{{{fields}}}")?;
                }
                write!(writer, ": ")?;
            }
        }

        // Write the event's message and fields
        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}
