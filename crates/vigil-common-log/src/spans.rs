//! Tracing spans and timing for scan operations.

use tracing::{info_span, Span};

/// Create a span covering one file scan.
pub fn scan_span(target: &str) -> Span {
    info_span!("scan", target = %target)
}

/// Create a span for a single check run.
pub fn check_span(check: &str) -> Span {
    info_span!("check", name = %check)
}

/// Timing utility for operations.
pub struct Timer {
    start: std::time::Instant,
    operation: &'static str,
}

impl Timer {
    /// Start a new timer.
    pub fn start(operation: &'static str) -> Self {
        Self {
            start: std::time::Instant::now(),
            operation,
        }
    }

    /// Complete the timer, log and return the elapsed milliseconds.
    pub fn finish(self) -> u128 {
        let elapsed = self.start.elapsed().as_millis();
        tracing::debug!(
            operation = %self.operation,
            duration_ms = %elapsed,
            "operation completed"
        );
        elapsed
    }
}
