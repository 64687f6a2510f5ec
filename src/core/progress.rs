//! Progress reporting decoupled from engine control flow.
//!
//! Engines push events into a `ProgressSink` after each pass; delivery is
//! fire-and-forget so a slow consumer can never block a run.

use serde::{Deserialize, Serialize};

/// Percent-complete plus a human-readable status line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// 0..=100, monotonically non-decreasing within one task
    pub percent: u8,

    /// Human-readable status, e.g. "pass 2/5: 420 of 1000 words"
    pub message: String,
}

impl ProgressEvent {
    pub fn new(percent: u8, message: impl Into<String>) -> Self {
        Self {
            percent: percent.min(100),
            message: message.into(),
        }
    }
}

/// Sink receiving progress events from a running task.
///
/// Implementations must tolerate being invoked from whatever execution
/// context the task runs on and must not block the caller.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

/// Sink that forwards events into an unbounded channel
pub struct ChannelProgressSink {
    tx: tokio::sync::mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: tokio::sync::mpsc::UnboundedSender<ProgressEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: ProgressEvent) {
        // A closed receiver just means nobody is watching anymore
        let _ = self.tx.send(event);
    }
}

/// Sink that discards everything; for tests and headless runs
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn emit(&self, _event: ProgressEvent) {}
}

/// Percent-complete for a pass out of a loop budget
pub fn pass_percent(pass_index: u32, loop_budget: u32) -> u8 {
    if loop_budget == 0 {
        return 100;
    }
    ((100 * u64::from(pass_index)) / u64::from(loop_budget)).min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_is_clamped() {
        let event = ProgressEvent::new(140, "done");
        assert_eq!(event.percent, 100);
    }

    #[test]
    fn test_pass_percent() {
        assert_eq!(pass_percent(0, 4), 0);
        assert_eq!(pass_percent(1, 4), 25);
        assert_eq!(pass_percent(3, 4), 75);
        assert_eq!(pass_percent(4, 4), 100);
        assert_eq!(pass_percent(9, 4), 100);
    }

    #[test]
    fn test_channel_sink_delivers_in_order() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let sink = ChannelProgressSink::new(tx);

        sink.emit(ProgressEvent::new(25, "pass 1/4"));
        sink.emit(ProgressEvent::new(50, "pass 2/4"));

        assert_eq!(rx.try_recv().unwrap().percent, 25);
        assert_eq!(rx.try_recv().unwrap().percent, 50);
    }

    #[test]
    fn test_channel_sink_survives_dropped_receiver() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        drop(rx);

        let sink = ChannelProgressSink::new(tx);
        sink.emit(ProgressEvent::new(10, "nobody listening"));
    }
}
