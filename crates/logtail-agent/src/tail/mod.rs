//! File tailing and multiline record assembly.
//!
//! # Architecture
//!
//! ```text
//!   Tailed Files (one task per source)
//!        │
//!        v
//!   ┌─────────────┐
//!   │   Tailer    │  (read physical lines, in order)
//!   └──────┬──────┘
//!          │
//!          v
//!   ┌─────────────┐
//!   │  Multiline  │  (join lines into logical records)
//!   └──────┬──────┘
//!          │
//!          v
//!   ┌─────────────┐
//!   │   Channel   │  (mpsc, bounded) → consumer / serializer
//!   └─────────────┘
//! ```
//!
//! Every source owns its engine instance and buffer exclusively; the agent
//! never shares multiline state between streams, even when their
//! configuration is textually identical.
//!
//! # Graceful Shutdown
//!
//! [`TailAgent::shutdown`] cancels all tailer tasks; each flushes its
//! trailing partial record before exiting so no data is lost.

pub mod multiline;
pub mod tailer;

use std::time::SystemTime;

use serde::Serialize;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::config::{Config, ConfigError};
use crate::tail::tailer::Tailer;

/// A normalized logical record reassembled from one or more physical lines.
#[derive(Debug, Clone, Serialize)]
pub struct Record {
    /// The complete record text, joined per the stream's separator setting.
    pub message: String,
    /// Path of the source the record was read from.
    pub source: String,
    /// Timestamp of when the record was completed.
    pub timestamp: SystemTime,
}

/// High-level agent coordinating one tailer task per configured source.
#[allow(clippy::module_name_repetitions)]
pub struct TailAgent {
    cancel_token: CancellationToken,
    workers: Vec<JoinHandle<()>>,
}

impl TailAgent {
    /// Validates every source and spawns its tailer task.
    ///
    /// Fails without starting anything when any source's engine cannot be
    /// built: a stream must not start without a usable engine.
    pub fn start(config: &Config, tx: Sender<Record>) -> Result<Self, ConfigError> {
        let cancel_token = CancellationToken::new();

        // Build all engines before spawning so one bad source aborts the
        // whole startup instead of leaving a partially running agent.
        let mut tailers = Vec::with_capacity(config.sources.len());
        for source in &config.sources {
            tailers.push(Tailer::new(source, tx.clone(), cancel_token.child_token())?);
        }

        let workers = tailers
            .into_iter()
            .map(|tailer| {
                tokio::spawn(async move {
                    if let Err(e) = tailer.run().await {
                        error!("TAIL | {e}");
                    }
                })
            })
            .collect();

        Ok(TailAgent {
            cancel_token,
            workers,
        })
    }

    /// Returns a clone of the cancellation token for shutdown coordination.
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Cancels all tailer tasks and waits for them to drain and exit.
    pub async fn shutdown(self) {
        self.cancel_token.cancel();
        for worker in self.workers {
            if let Err(e) = worker.await {
                error!("TAIL | worker task failed to join: {e}");
            }
        }
    }
}
