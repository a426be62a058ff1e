//! The loading sequencer
//!
//! Clock-free core of the splash screen. The caller passes `now` into every
//! operation; [`crate::sequencer::runtime`] drives it from tokio timers.

use crate::config::Config;
use crate::errors::{LoaderError, Result};
use crate::sequencer::progress::{resource_estimate, time_estimate, Easing, LoadProgress};
use crate::sequencer::resources::{ResourceId, ResourceKind, ResourceTracker, Settlement};
use crate::sequencer::state::{CompletionCause, SequencerEvent, SequencerState};
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

/// Tunables for one loading sequence
#[derive(Debug, Clone, PartialEq)]
pub struct SequencerConfig {
    pub min_duration: Duration,
    pub exit_delay: Duration,
    pub frame_interval: Duration,
    pub time_cap: f64,
    pub resource_floor: f64,
    pub resource_span: f64,
    pub running: Easing,
    pub completion: Easing,
    pub reveal_delay: Duration,
    pub retire_delay: Duration,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for SequencerConfig {
    fn from(config: &Config) -> Self {
        Self {
            min_duration: config.loader.min_duration(),
            exit_delay: config.loader.exit_delay(),
            frame_interval: config.loader.frame_interval(),
            time_cap: config.loader.time_cap,
            resource_floor: config.loader.resource_floor,
            resource_span: config.loader.resource_span,
            running: Easing::running(&config.easing),
            completion: Easing::completion(&config.easing),
            reveal_delay: Duration::from_millis(config.handoff.reveal_delay_ms),
            retire_delay: Duration::from_millis(config.handoff.retire_delay_ms),
        }
    }
}

impl SequencerConfig {
    pub fn with_min_duration(mut self, min_duration: Duration) -> Self {
        self.min_duration = min_duration;
        self
    }

    pub fn with_exit_delay(mut self, exit_delay: Duration) -> Self {
        self.exit_delay = exit_delay;
        self
    }

    /// Hand-off phases happen back to back
    pub fn with_instant_handoff(mut self) -> Self {
        self.reveal_delay = Duration::ZERO;
        self.retire_delay = Duration::ZERO;
        self
    }

    /// Reject settings the render loop cannot run with
    ///
    /// A zero frame interval cannot drive a timer, and an easing that can
    /// take a zero step never finishes the completion ramp.
    pub fn validate(&self) -> Result<()> {
        if self.frame_interval.is_zero() {
            return Err(LoaderError::ConfigError(
                "frame interval must be greater than 0".to_string(),
            ));
        }

        for (name, easing) in [("running", self.running), ("completion", self.completion)] {
            if !(easing.min_step > 0.0 && easing.min_step.is_finite()) {
                return Err(LoaderError::ConfigError(format!(
                    "{} easing min_step must be greater than 0",
                    name
                )));
            }
            if !(easing.rate >= 0.0 && easing.rate.is_finite()) {
                return Err(LoaderError::ConfigError(format!(
                    "{} easing rate must not be negative",
                    name
                )));
            }
        }

        if !(self.time_cap >= 0.0 && self.time_cap < 100.0) {
            return Err(LoaderError::ConfigError(
                "time_cap must stay below 100".to_string(),
            ));
        }

        if self.retire_delay < self.reveal_delay {
            return Err(LoaderError::ConfigError(
                "retire delay must not be shorter than reveal delay".to_string(),
            ));
        }

        Ok(())
    }
}

/// Result of feeding a resource settlement into the sequencer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleOutcome {
    /// Counted; more resources pending
    Counted,
    /// Counted and it was the last one; completion has begun
    CompletionBegun,
    /// Duplicate, unknown, or the sequence is no longer running
    Ignored,
}

/// Synthetic page-load progress driven to completion exactly once
#[derive(Debug, Clone)]
pub struct LoadingSequencer {
    id: Uuid,
    config: SequencerConfig,
    state: SequencerState,
    progress: LoadProgress,
    resources: ResourceTracker,
    started_at: Option<Instant>,
    completion_cause: Option<CompletionCause>,
    completion_started_at: Option<Instant>,
}

impl LoadingSequencer {
    pub fn new(config: SequencerConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            state: SequencerState::Idle,
            progress: LoadProgress::new(),
            resources: ResourceTracker::default(),
            started_at: None,
            completion_cause: None,
            completion_started_at: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    pub fn progress(&self) -> &LoadProgress {
        &self.progress
    }

    pub fn resources(&self) -> &ResourceTracker {
        &self.resources
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    pub fn completion_cause(&self) -> Option<CompletionCause> {
        self.completion_cause
    }

    pub fn completion_started_at(&self) -> Option<Instant> {
        self.completion_started_at
    }

    /// Time since `start`, zero before it
    pub fn elapsed(&self, now: Instant) -> Duration {
        self.started_at
            .map(|start| now.saturating_duration_since(start))
            .unwrap_or_default()
    }

    /// Deadline of the safety timer (and of the no-resource fallback)
    pub fn safety_deadline(&self) -> Option<Instant> {
        self.started_at.map(|start| start + self.config.min_duration)
    }

    /// Begin the sequence with the resources enumerated on the page
    pub fn start(&mut self, now: Instant, kinds: Vec<ResourceKind>) -> Result<()> {
        self.state = self.state.transition(SequencerEvent::Start)?;
        self.started_at = Some(now);
        self.resources = ResourceTracker::new(kinds);
        Ok(())
    }

    /// One animation frame
    ///
    /// While running: fold the time estimate, then take an eased step toward
    /// `target`. While completing: take an accelerated step toward 100.
    /// Returns the new displayed value if it changed.
    pub fn on_frame(&mut self, now: Instant) -> Option<f64> {
        match self.state {
            SequencerState::Running => {
                let estimate = time_estimate(
                    self.elapsed(now),
                    self.config.min_duration,
                    self.config.time_cap,
                );
                self.progress.fold(estimate);
                self.progress.advance(self.config.running)
            }
            SequencerState::Completing => self.progress.advance_to_full(self.config.completion),
            SequencerState::Idle | SequencerState::Done => None,
        }
    }

    /// Record a resource load or failure
    pub fn settle_resource(
        &mut self,
        id: ResourceId,
        outcome: Settlement,
        now: Instant,
    ) -> SettleOutcome {
        if self.state != SequencerState::Running || !self.resources.settle(id, outcome) {
            return SettleOutcome::Ignored;
        }

        let estimate = resource_estimate(
            self.resources.settled_count(),
            self.resources.total(),
            self.config.resource_floor,
            self.config.resource_span,
        );
        self.progress.fold(estimate);

        if self.resources.all_settled()
            && self.complete_loading(CompletionCause::ResourcesSettled, now)
        {
            SettleOutcome::CompletionBegun
        } else {
            SettleOutcome::Counted
        }
    }

    /// Safety timer expiry: forces completion whatever the resource state
    pub fn on_safety_timer(&mut self, now: Instant) -> bool {
        let cause = if self.resources.total() == 0 {
            CompletionCause::NoResources
        } else {
            CompletionCause::SafetyTimer
        };
        self.complete_loading(cause, now)
    }

    /// Enter the completion path; false if it was already entered
    pub fn complete_loading(&mut self, cause: CompletionCause, now: Instant) -> bool {
        if self.state != SequencerState::Running {
            return false;
        }
        match self.state.transition(SequencerEvent::CompletionTriggered(cause)) {
            Ok(next) => {
                self.state = next;
                self.completion_cause = Some(cause);
                self.completion_started_at = Some(now);
                true
            }
            Err(_) => false,
        }
    }

    /// Completion ramp has reached exactly 100
    pub fn ramp_finished(&self) -> bool {
        self.state.is_completing_or_done() && self.progress.is_full()
    }

    /// Hand-off finished: Completing → Done
    pub fn finish(&mut self) -> Result<()> {
        self.state = self.state.transition(SequencerEvent::HandoffFinished)?;
        Ok(())
    }
}
