//! Structured progress reporting for document ingestion.
//!
//! Loading and embedding a legal corpus takes a while, so each phase emits
//! incremental events the CLI can render.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Stage of the ingestion pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Reading pages out of the source documents
    Load,
    /// Computing chunk embeddings
    Embed,
    /// Writing vectors into the index
    Index,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Load => "load",
            Phase::Embed => "embed",
            Phase::Index => "index",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress event emitted during ingestion.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressEvent {
    pub phase: Phase,

    /// Units done so far (documents loaded, chunks embedded or stored)
    pub current: u64,

    /// Total expected work (if known)
    pub total: Option<u64>,

    /// Human-readable detail
    pub message: String,

    /// Seconds since the reporter was created
    pub elapsed_secs: Option<f64>,
}

impl ProgressEvent {
    pub fn new(phase: Phase, current: u64, total: Option<u64>, message: impl Into<String>) -> Self {
        Self {
            phase,
            current,
            total,
            message: message.into(),
            elapsed_secs: None,
        }
    }

    pub fn with_elapsed(mut self, elapsed_secs: f64) -> Self {
        self.elapsed_secs = Some(elapsed_secs);
        self
    }

    /// Percentage complete, when the total is known.
    pub fn percentage(&self) -> Option<f64> {
        self.total.map(|t| {
            if t > 0 {
                (self.current as f64 / t as f64) * 100.0
            } else {
                100.0
            }
        })
    }

    /// Format as a simple user-facing line, e.g. `[embed] 40/80 (50%) - model=...`.
    pub fn format_simple(&self) -> String {
        let progress = match self.total {
            Some(total) => format!("{}/{}", self.current, total),
            None => self.current.to_string(),
        };

        let pct = self
            .percentage()
            .map(|p| format!(" ({:.0}%)", p))
            .unwrap_or_default();

        format!("[{}] {}{} - {}", self.phase, progress, pct, self.message)
    }
}

/// Callback for progress events.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Progress reporter that emits events through a callback.
#[derive(Clone)]
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
    start_time: Arc<Instant>,
}

impl ProgressReporter {
    pub fn new(callback: ProgressCallback) -> Self {
        Self {
            callback: Some(callback),
            start_time: Arc::new(Instant::now()),
        }
    }

    /// Reporter that drops every event.
    pub fn noop() -> Self {
        Self {
            callback: None,
            start_time: Arc::new(Instant::now()),
        }
    }

    pub fn emit(&self, event: ProgressEvent) {
        let Some(callback) = &self.callback else {
            return;
        };

        let elapsed = self.start_time.elapsed().as_secs_f64();
        let event = event.with_elapsed(elapsed);

        tracing::debug!(
            phase = %event.phase,
            current = event.current,
            total = ?event.total,
            message = %event.message,
            elapsed_secs = elapsed,
            "Progress event"
        );

        callback(event);
    }

    pub fn load(&self, current: u64, total: Option<u64>, document: &str) {
        self.emit(ProgressEvent::new(
            Phase::Load,
            current,
            total,
            format!("reading {}", document),
        ));
    }

    pub fn embed(&self, current: u64, total: Option<u64>, model: &str) {
        self.emit(ProgressEvent::new(
            Phase::Embed,
            current,
            total,
            format!("model={}", model),
        ));
    }

    pub fn index(&self, current: u64, total: Option<u64>) {
        self.emit(ProgressEvent::new(
            Phase::Index,
            current,
            total,
            "storing vectors",
        ));
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::noop()
    }
}
