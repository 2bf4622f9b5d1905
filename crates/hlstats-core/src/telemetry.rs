//! Telemetry sinks receiving aggregated highlight statistics.

use crate::types::HighlightStats;

use parking_lot::Mutex;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

/// Errors a telemetry sink can report.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Writing the batch failed.
    #[error("Failed to write telemetry batch: {0}")]
    Io(#[from] std::io::Error),

    /// The batch could not be serialised.
    #[error("Failed to serialise telemetry batch: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The sink no longer accepts batches.
    #[error("Telemetry sink is closed")]
    Closed,
}

/// Destination for [`HighlightStats`] batches.
pub trait TelemetrySink: Send + Sync {
    /// Consumes one batch.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch could not be delivered. Callers log
    /// and drop the batch; they never retry.
    fn log_highlight_stats(&self, stats: HighlightStats) -> Result<(), TelemetryError>;
}

/// Sink that keeps every batch in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    batches: Mutex<Vec<HighlightStats>>,
    closed: AtomicBool,
}

impl MemorySink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies of all batches received so far.
    #[must_use]
    pub fn batches(&self) -> Vec<HighlightStats> {
        self.batches.lock().clone()
    }

    /// Removes and returns all batches received so far.
    pub fn take(&self) -> Vec<HighlightStats> {
        std::mem::take(&mut *self.batches.lock())
    }

    /// Number of batches received so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.batches.lock().len()
    }

    /// Returns true if no batch was received.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Makes every later delivery fail with [`TelemetryError::Closed`].
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

impl TelemetrySink for MemorySink {
    fn log_highlight_stats(&self, stats: HighlightStats) -> Result<(), TelemetryError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TelemetryError::Closed);
        }
        self.batches.lock().push(stats);
        Ok(())
    }
}

/// Sink writing one JSON document per line.
#[derive(Debug)]
pub struct JsonLinesSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    /// Wraps `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Unwraps the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: Write + Send> TelemetrySink for JsonLinesSink<W> {
    fn log_highlight_stats(&self, stats: HighlightStats) -> Result<(), TelemetryError> {
        let line = serde_json::to_string(&stats)?;
        let mut writer = self.writer.lock();
        writeln!(writer, "{line}")?;
        writer.flush()?;
        Ok(())
    }
}
