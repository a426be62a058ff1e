//! Host mount for the splash screen
//!
//! The mount is what the sequencer draws on: a progress fill, a percentage
//! label, the page content wrapper and the document-level "loading" flag.
//! Each sequencer owns its mount; there is no ambient page state.

pub mod terminal;

pub use terminal::TerminalMount;

use crate::sequencer::progress::progress_label;
use std::sync::{Arc, Mutex, MutexGuard};

/// Surface the loading sequence renders onto
pub trait LoaderMount: Send {
    /// Set the fill width to `value` percent and the label to its rounded text
    fn render_progress(&mut self, value: f64);

    /// Toggle the document-level loading state
    fn set_document_loading(&mut self, loading: bool);

    /// First hand-off phase: fade the indicator out
    fn hide_indicator(&mut self);

    /// Show the page content
    fn reveal_content(&mut self);

    /// Last hand-off phase: remove the indicator entirely
    fn retire_indicator(&mut self);
}

/// A call made on a [`RecordingMount`]
#[derive(Debug, Clone, PartialEq)]
pub enum MountCall {
    Progress { width: f64, label: String },
    DocumentLoading(bool),
    IndicatorHidden,
    ContentRevealed,
    IndicatorRetired,
}

/// Headless mount that records every call
///
/// Clones share the same log, so a test can keep one handle while the
/// runner owns another.
#[derive(Debug, Clone, Default)]
pub struct RecordingMount {
    calls: Arc<Mutex<Vec<MountCall>>>,
}

impl RecordingMount {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<MountCall> {
        self.lock().clone()
    }

    /// Every width rendered so far, in order
    pub fn widths(&self) -> Vec<f64> {
        self.lock()
            .iter()
            .filter_map(|call| match call {
                MountCall::Progress { width, .. } => Some(*width),
                _ => None,
            })
            .collect()
    }

    pub fn last_label(&self) -> Option<String> {
        self.lock().iter().rev().find_map(|call| match call {
            MountCall::Progress { label, .. } => Some(label.clone()),
            _ => None,
        })
    }

    /// Count calls matching `call` exactly
    pub fn count(&self, call: &MountCall) -> usize {
        self.lock().iter().filter(|c| *c == call).count()
    }

    fn push(&self, call: MountCall) {
        self.lock().push(call);
    }

    fn lock(&self) -> MutexGuard<'_, Vec<MountCall>> {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LoaderMount for RecordingMount {
    fn render_progress(&mut self, value: f64) {
        self.push(MountCall::Progress {
            width: value,
            label: progress_label(value),
        });
    }

    fn set_document_loading(&mut self, loading: bool) {
        self.push(MountCall::DocumentLoading(loading));
    }

    fn hide_indicator(&mut self) {
        self.push(MountCall::IndicatorHidden);
    }

    fn reveal_content(&mut self) {
        self.push(MountCall::ContentRevealed);
    }

    fn retire_indicator(&mut self) {
        self.push(MountCall::IndicatorRetired);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_log() {
        let mount = RecordingMount::new();
        let mut handle = mount.clone();

        handle.set_document_loading(true);
        handle.render_progress(41.6);
        handle.hide_indicator();

        assert_eq!(
            mount.calls(),
            vec![
                MountCall::DocumentLoading(true),
                MountCall::Progress {
                    width: 41.6,
                    label: "42%".to_string()
                },
                MountCall::IndicatorHidden,
            ]
        );
        assert_eq!(mount.widths(), vec![41.6]);
        assert_eq!(mount.last_label().as_deref(), Some("42%"));
        assert_eq!(mount.count(&MountCall::IndicatorHidden), 1);
    }
}
