//! Sequencer state machine
//!
//! Four states, one direction:
//! - Idle → Running on `Start`
//! - Running → Completing on `CompletionTriggered` (resources settled,
//!   safety timer, no-resource fallback or document load)
//! - Completing → Done on `HandoffFinished`
//!
//! `Completing` absorbs repeated completion triggers and `Done` absorbs
//! everything, so the completion path is entered at most once.

use crate::errors::{LoaderError, Result};
use serde::{Deserialize, Serialize};

/// Loading sequence states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SequencerState {
    /// Constructed, not started
    Idle,

    /// Estimators and render loop active
    Running,

    /// Snap-to-100 ramp, exit delay and hand-off in progress
    Completing,

    /// Hand-off finished, completion announced (terminal)
    Done,
}

/// Why the completion path was entered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompletionCause {
    /// Every tracked resource loaded or failed
    ResourcesSettled,
    /// No trackable resources; fell back to `min_duration`
    NoResources,
    /// Safety timer fired with resources still pending
    SafetyTimer,
    /// Host reported the document fully loaded and `min_duration` passed
    DocumentLoaded,
}

/// Events that trigger state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerEvent {
    Start,
    CompletionTriggered(CompletionCause),
    HandoffFinished,
}

impl SequencerState {
    /// Check if this is the terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, SequencerState::Done)
    }

    /// Whether the completion path has been entered
    pub fn is_completing_or_done(&self) -> bool {
        matches!(self, SequencerState::Completing | SequencerState::Done)
    }

    /// Attempt state transition with validation
    pub fn transition(&self, event: SequencerEvent) -> Result<SequencerState> {
        use SequencerEvent::*;
        use SequencerState::*;

        let next = match (self, event) {
            (Idle, Start) => Running,
            (Running, CompletionTriggered(_)) => Completing,
            (Completing, CompletionTriggered(_)) => Completing,
            (Completing, HandoffFinished) => Done,
            (Done, _) => Done,

            (from, event) => {
                return Err(LoaderError::InvalidTransition {
                    from: format!("{:?}", from),
                    event: format!("{:?}", event),
                    reason: format!("No valid transition from {:?} on {:?}", from, event),
                });
            }
        };

        Ok(next)
    }

    /// Human-readable state name
    pub fn display_name(&self) -> &'static str {
        match self {
            SequencerState::Idle => "Idle",
            SequencerState::Running => "Loading",
            SequencerState::Completing => "Finishing",
            SequencerState::Done => "Loaded",
        }
    }
}

impl CompletionCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionCause::ResourcesSettled => "resources_settled",
            CompletionCause::NoResources => "no_resources",
            CompletionCause::SafetyTimer => "safety_timer",
            CompletionCause::DocumentLoaded => "document_loaded",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIGGER: SequencerEvent =
        SequencerEvent::CompletionTriggered(CompletionCause::SafetyTimer);

    #[test]
    fn test_valid_transitions() {
        let state = SequencerState::Idle.transition(SequencerEvent::Start).unwrap();
        assert_eq!(state, SequencerState::Running);

        let state = state.transition(TRIGGER).unwrap();
        assert_eq!(state, SequencerState::Completing);

        let state = state.transition(SequencerEvent::HandoffFinished).unwrap();
        assert_eq!(state, SequencerState::Done);
    }

    #[test]
    fn test_completing_absorbs_triggers() {
        let state = SequencerState::Completing
            .transition(SequencerEvent::CompletionTriggered(CompletionCause::ResourcesSettled))
            .unwrap();
        assert_eq!(state, SequencerState::Completing);
    }

    #[test]
    fn test_done_is_absorbing() {
        for event in [SequencerEvent::Start, TRIGGER, SequencerEvent::HandoffFinished] {
            assert_eq!(
                SequencerState::Done.transition(event).unwrap(),
                SequencerState::Done
            );
        }
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(SequencerState::Idle.transition(TRIGGER).is_err());
        assert!(SequencerState::Idle
            .transition(SequencerEvent::HandoffFinished)
            .is_err());
        assert!(SequencerState::Running.transition(SequencerEvent::Start).is_err());
        assert!(SequencerState::Running
            .transition(SequencerEvent::HandoffFinished)
            .is_err());
        assert!(SequencerState::Completing
            .transition(SequencerEvent::Start)
            .is_err());
    }

    #[test]
    fn test_terminal_states() {
        assert!(SequencerState::Done.is_terminal());
        assert!(!SequencerState::Completing.is_terminal());
        assert!(SequencerState::Completing.is_completing_or_done());
        assert!(!SequencerState::Running.is_completing_or_done());
    }

    #[test]
    fn test_display_names() {
        assert_eq!(SequencerState::Running.display_name(), "Loading");
        assert_eq!(SequencerState::Completing.display_name(), "Finishing");
        assert_eq!(SequencerState::Done.display_name(), "Loaded");
    }
}
