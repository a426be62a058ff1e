//! Terminal mount
//!
//! Renders the splash screen as an indicatif progress bar. The "page
//! content" is whatever the caller prints once the content is revealed.

use crate::mount::LoaderMount;
use crate::sequencer::progress::progress_label;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const BAR_TEMPLATE: &str = "{spinner:.cyan} {prefix} [{bar:40.cyan/blue}] {msg}";

/// indicatif-backed mount
pub struct TerminalMount {
    bar: ProgressBar,
    title: String,
    color: bool,
    loading: bool,
    revealed: bool,
}

impl TerminalMount {
    /// Create a visible progress bar titled `title`
    pub fn new(title: &str, color: bool) -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(BAR_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        bar.set_prefix(title.to_string());
        bar.set_message(progress_label(0.0));
        bar.enable_steady_tick(Duration::from_millis(100));
        Self::with_bar(bar, title, color)
    }

    /// Mount that draws nothing (quiet mode)
    pub fn hidden(title: &str) -> Self {
        Self::with_bar(ProgressBar::hidden(), title, false)
    }

    fn with_bar(bar: ProgressBar, title: &str, color: bool) -> Self {
        Self {
            bar,
            title: title.to_string(),
            color,
            loading: false,
            revealed: false,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }
}

impl LoaderMount for TerminalMount {
    fn render_progress(&mut self, value: f64) {
        self.bar.set_position(value.round() as u64);
        self.bar.set_message(progress_label(value));
    }

    fn set_document_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    fn hide_indicator(&mut self) {
        self.bar.disable_steady_tick();
        self.bar.set_message(format!("{} ready", progress_label(100.0)));
    }

    fn reveal_content(&mut self) {
        self.revealed = true;
        self.bar.finish_and_clear();
        if self.bar.is_hidden() {
            return;
        }
        let line = format!("{} loaded", self.title);
        if self.color {
            println!("{} {}", "✓".green(), line.bold());
        } else {
            println!("✓ {}", line);
        }
    }

    fn retire_indicator(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_mount_tracks_state() {
        let mut mount = TerminalMount::hidden("test page");
        mount.set_document_loading(true);
        mount.render_progress(37.4);
        assert!(mount.is_loading());
        assert_eq!(mount.bar.position(), 37);

        mount.hide_indicator();
        mount.reveal_content();
        mount.set_document_loading(false);
        mount.retire_indicator();

        assert!(mount.is_revealed());
        assert!(!mount.is_loading());
        assert!(mount.bar.is_finished());
    }
}
