//! Per-stream tail driver.
//!
//! A [`Tailer`] owns one file handle, one multiline engine instance, and one
//! record buffer; nothing here is shared with other streams. When the engine
//! is enabled it receives every physical line exactly once, in order, and the
//! tailer forwards completed records to the sink channel while enforcing the
//! timeout-driven forced flush the engine itself deliberately does not
//! perform. When the engine is disabled every line is forwarded as its own
//! record without touching the buffer.

use std::io::SeekFrom;
use std::path::PathBuf;
use std::time::SystemTime;

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};
use tokio::sync::mpsc::Sender;
use tokio::time::{self, Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::multiline::DEFAULT_MULTILINE_TIMEOUT;
use crate::config::{ConfigError, SourceConfig};
use crate::tail::multiline::{flush, Multiline};
use crate::tail::Record;

/// How long to wait before re-polling a file that is at EOF.
const EOF_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Errors that can occur while driving a tailed stream.
///
/// These are runtime I/O failures; they terminate the failing stream only
/// and never affect the engine state of other streams.
#[derive(Debug, thiserror::Error)]
#[allow(clippy::module_name_repetitions)]
pub enum TailerError {
    /// The source file could not be opened.
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading a line from the source failed.
    #[error("failed to read from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The record sink was closed while the stream still had output.
    #[error("record sink closed before {path} finished")]
    SinkClosed { path: PathBuf },
}

/// Drives one tailed source: file reading, record assembly, forced flushes.
pub struct Tailer {
    path: PathBuf,
    from_beginning: bool,
    multiline: Multiline,
    /// In-progress logical record; drained by flush, never shared.
    buffer: String,
    tx: Sender<Record>,
    cancel_token: CancellationToken,
}

impl Tailer {
    /// Builds the tailer for one source, constructing its engine instance.
    ///
    /// Fails with a [`ConfigError`] when the source's multiline settings are
    /// unusable; the stream must not start without a working engine.
    pub fn new(
        source: &SourceConfig,
        tx: Sender<Record>,
        cancel_token: CancellationToken,
    ) -> Result<Self, ConfigError> {
        let multiline = Multiline::new(source.multiline.clone())?;
        Ok(Tailer {
            path: source.path.clone(),
            from_beginning: source.from_beginning,
            multiline,
            buffer: String::new(),
            tx,
            cancel_token,
        })
    }

    /// Main loop: reads lines until cancellation, emitting completed records.
    ///
    /// A deadline tracks elapsed time since the last emission; when it
    /// elapses without a natural completion, the partial record is force
    /// flushed so memory and latency stay bounded even if a terminating line
    /// never arrives. On cancellation the trailing partial record is flushed
    /// before returning.
    pub async fn run(mut self) -> Result<(), TailerError> {
        let file = File::open(&self.path).await.map_err(|e| TailerError::Open {
            path: self.path.clone(),
            source: e,
        })?;
        let mut reader = BufReader::new(file);

        if !self.from_beginning {
            reader
                .seek(SeekFrom::End(0))
                .await
                .map_err(|e| TailerError::Open {
                    path: self.path.clone(),
                    source: e,
                })?;
        }

        debug!(
            "TAIL | {} | started from_beginning={}",
            self.path.display(),
            self.from_beginning
        );

        // The engine reports the configured timeout verbatim; a zero value
        // would turn the forced flush into a busy loop, so the driver falls
        // back to the stock threshold.
        let mut timeout = self.multiline.timeout();
        if timeout.is_zero() {
            warn!(
                "TAIL | {} | zero multiline timeout, using default",
                self.path.display()
            );
            timeout = DEFAULT_MULTILINE_TIMEOUT;
        }

        let mut lines = reader.lines();
        let mut deadline = Instant::now() + timeout;

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    debug!(
                        "TAIL | {} | shutdown requested, flushing partial record",
                        self.path.display()
                    );
                    let text = flush(&mut self.buffer);
                    self.send(text).await?;
                    return Ok(());
                }
                () = time::sleep_until(deadline) => {
                    // Forced flush: recover a record whose terminating line
                    // never arrived within the timeout.
                    let text = flush(&mut self.buffer);
                    self.send(text).await?;
                    deadline = Instant::now() + timeout;
                }
                line = lines.next_line() => match line {
                    Ok(Some(line)) => {
                        // Without a configured pattern every physical line is
                        // already a complete record; the engine is bypassed
                        // entirely, quote-only settings included.
                        let text = if self.multiline.is_enabled() {
                            self.multiline.process_line(&line, &mut self.buffer)
                        } else {
                            line
                        };
                        if !text.is_empty() {
                            self.send(text).await?;
                            deadline = Instant::now() + timeout;
                        }
                    }
                    Ok(None) => {
                        // EOF: wait for the file to grow.
                        time::sleep(EOF_POLL_INTERVAL).await;
                    }
                    Err(e) => {
                        return Err(TailerError::Read {
                            path: self.path.clone(),
                            source: e,
                        });
                    }
                },
            }
        }
    }

    /// Stamps a completed record and forwards it to the sink.
    ///
    /// Empty text means "nothing to emit" and is skipped.
    async fn send(&self, message: String) -> Result<(), TailerError> {
        if message.is_empty() {
            return Ok(());
        }
        let record = Record {
            message,
            source: self.path.display().to_string(),
            timestamp: SystemTime::now(),
        };
        self.tx
            .send(record)
            .await
            .map_err(|_| TailerError::SinkClosed {
                path: self.path.clone(),
            })
    }
}
