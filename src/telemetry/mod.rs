//! Telemetry for loading sequences
//!
//! Collects lifecycle events with wall-clock timestamps and keeps running
//! counters. Structured log lines go through `tracing`; this collector is
//! what the CLI summarises and exports.

use crate::cli::Verbosity;
use crate::errors::Result;
use crate::sequencer::resources::{ResourceKind, Settlement};
use crate::sequencer::state::CompletionCause;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};

/// Telemetry event types
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TelemetryEvent {
    SequenceStarted { resources: usize },
    ResourceSettled { kind: ResourceKind, outcome: Settlement },
    CompletionTriggered { cause: CompletionCause, progress: f64 },
    RampFinished { frames: usize },
    ContentRevealed,
    SequenceCompleted { duration_ms: u64 },
}

/// An event with the time it was recorded
#[derive(Debug, Clone, Serialize)]
pub struct TelemetryRecord {
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub event: TelemetryEvent,
}

/// Telemetry statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TelemetryStats {
    pub frames_rendered: usize,
    pub resources_loaded: usize,
    pub resources_failed: usize,
    pub completion_cause: Option<CompletionCause>,
    pub progress_at_trigger: Option<f64>,
    pub duration_ms: Option<u64>,
}

#[derive(Debug, Default)]
struct Inner {
    events: Vec<TelemetryRecord>,
    stats: TelemetryStats,
}

/// Telemetry collector
#[derive(Clone, Default)]
pub struct TelemetryCollector {
    inner: Arc<Mutex<Inner>>,
}

impl TelemetryCollector {
    /// Create a new telemetry collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event
    pub fn record(&self, event: TelemetryEvent) {
        let mut inner = self.lock();
        match &event {
            TelemetryEvent::ResourceSettled { outcome, .. } => match outcome {
                Settlement::Loaded => inner.stats.resources_loaded += 1,
                Settlement::Failed => inner.stats.resources_failed += 1,
            },
            TelemetryEvent::CompletionTriggered { cause, progress } => {
                inner.stats.completion_cause = Some(*cause);
                inner.stats.progress_at_trigger = Some(*progress);
            }
            TelemetryEvent::SequenceCompleted { duration_ms } => {
                inner.stats.duration_ms = Some(*duration_ms);
            }
            _ => {}
        }
        inner.events.push(TelemetryRecord {
            at: Utc::now(),
            event,
        });
    }

    /// Count a rendered frame; frames are too frequent to keep as events
    pub fn record_frame(&self) {
        self.lock().stats.frames_rendered += 1;
    }

    /// Get current statistics
    pub fn get_stats(&self) -> TelemetryStats {
        self.lock().stats.clone()
    }

    /// Get event count
    pub fn event_count(&self) -> usize {
        self.lock().events.len()
    }

    /// Get recent events (last n)
    pub fn recent_events(&self, n: usize) -> Vec<TelemetryEvent> {
        let inner = self.lock();
        let start = inner.events.len().saturating_sub(n);
        inner.events[start..].iter().map(|r| r.event.clone()).collect()
    }

    /// Share of settled resources that failed
    pub fn failure_rate(&self) -> f64 {
        let stats = self.get_stats();
        let total = stats.resources_loaded + stats.resources_failed;
        if total == 0 {
            0.0
        } else {
            stats.resources_failed as f64 / total as f64
        }
    }

    /// Export recorded events as a JSON array
    pub fn export_json(&self) -> Result<String> {
        let inner = self.lock();
        Ok(serde_json::to_string_pretty(&inner.events)?)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Simple telemetry display
pub struct TelemetryDisplay {
    collector: TelemetryCollector,
    verbosity: Verbosity,
}

impl TelemetryDisplay {
    /// Create a new display
    pub fn new(collector: TelemetryCollector, verbosity: Verbosity) -> Self {
        Self {
            collector,
            verbosity,
        }
    }

    /// Summary lines, empty in quiet mode
    pub fn summary_lines(&self) -> Vec<String> {
        if !self.verbosity.show_progress() {
            return Vec::new();
        }
        let stats = self.collector.get_stats();
        let cause = stats
            .completion_cause
            .map(|c| c.as_str())
            .unwrap_or("none");

        let mut lines = vec![
            format!("Duration:          {}ms", stats.duration_ms.unwrap_or(0)),
            format!("Completion cause:  {}", cause),
            format!(
                "Resources:         {} loaded, {} failed",
                stats.resources_loaded, stats.resources_failed
            ),
        ];
        if self.verbosity.show_events() {
            lines.push(format!("Frames rendered:   {}", stats.frames_rendered));
            if let Some(progress) = stats.progress_at_trigger {
                lines.push(format!("Progress at cut:   {:.1}%", progress));
            }
        }
        lines
    }

    /// Display summary statistics
    pub fn display_summary(&self) {
        let lines = self.summary_lines();
        if lines.is_empty() {
            return;
        }
        println!("\nLoad Summary");
        println!("─────────────────────────────────────");
        for line in lines {
            println!("{}", line);
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_creation() {
        let collector = TelemetryCollector::new();
        assert_eq!(collector.event_count(), 0);
        assert_eq!(collector.get_stats(), TelemetryStats::default());
    }

    #[test]
    fn test_resource_counters() {
        let collector = TelemetryCollector::new();
        for outcome in [Settlement::Loaded, Settlement::Loaded, Settlement::Failed] {
            collector.record(TelemetryEvent::ResourceSettled {
                kind: ResourceKind::Image,
                outcome,
            });
        }

        let stats = collector.get_stats();
        assert_eq!(stats.resources_loaded, 2);
        assert_eq!(stats.resources_failed, 1);
        assert!((collector.failure_rate() - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_frames_are_not_events() {
        let collector = TelemetryCollector::new();
        for _ in 0..5 {
            collector.record_frame();
        }
        assert_eq!(collector.get_stats().frames_rendered, 5);
        assert_eq!(collector.event_count(), 0);
    }

    #[test]
    fn test_completion_recorded() {
        let collector = TelemetryCollector::new();
        collector.record(TelemetryEvent::CompletionTriggered {
            cause: CompletionCause::SafetyTimer,
            progress: 71.5,
        });
        collector.record(TelemetryEvent::SequenceCompleted { duration_ms: 4100 });

        let stats = collector.get_stats();
        assert_eq!(stats.completion_cause, Some(CompletionCause::SafetyTimer));
        assert_eq!(stats.progress_at_trigger, Some(71.5));
        assert_eq!(stats.duration_ms, Some(4100));
    }

    #[test]
    fn test_recent_events() {
        let collector = TelemetryCollector::new();
        collector.record(TelemetryEvent::SequenceStarted { resources: 3 });
        collector.record(TelemetryEvent::ContentRevealed);
        collector.record(TelemetryEvent::SequenceCompleted { duration_ms: 10 });

        let recent = collector.recent_events(2);
        assert_eq!(
            recent,
            vec![
                TelemetryEvent::ContentRevealed,
                TelemetryEvent::SequenceCompleted { duration_ms: 10 }
            ]
        );
    }

    #[test]
    fn test_export_json() {
        let collector = TelemetryCollector::new();
        collector.record(TelemetryEvent::SequenceStarted { resources: 2 });

        let json = collector.export_json().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["type"], "sequence_started");
        assert_eq!(parsed[0]["resources"], 2);
        assert!(parsed[0]["at"].is_string());
    }

    #[test]
    fn test_quiet_summary_is_empty() {
        let display = TelemetryDisplay::new(TelemetryCollector::new(), Verbosity::Quiet);
        assert!(display.summary_lines().is_empty());

        let display = TelemetryDisplay::new(TelemetryCollector::new(), Verbosity::Verbose);
        assert!(display.summary_lines().iter().any(|l| l.contains("Frames")));
    }
}
