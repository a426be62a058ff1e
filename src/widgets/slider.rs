//! Hero image slider
//!
//! One active slide out of N, advanced on a fixed interval. Manual
//! navigation (arrows, dots, keyboard, swipe) restarts the interval so a
//! slide the visitor picked is shown for a full period.

use crate::config::SliderConfig;
use crate::errors::{LoaderError, Result};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

/// Slide index state with wraparound
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeroSlider {
    count: usize,
    current: usize,
}

impl HeroSlider {
    pub fn new(count: usize) -> Self {
        Self { count, current: 0 }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Activate `index`, wrapping past either end; no-op with zero slides
    pub fn show(&mut self, index: isize) -> usize {
        if self.count == 0 {
            return 0;
        }
        let count = self.count as isize;
        self.current = if index >= count {
            0
        } else if index < 0 {
            (count - 1) as usize
        } else {
            index as usize
        };
        self.current
    }

    pub fn next(&mut self) -> usize {
        self.show(self.current as isize + 1)
    }

    pub fn prev(&mut self) -> usize {
        self.show(self.current as isize - 1)
    }

    /// Dot click; out-of-range dots wrap like any other index
    pub fn go_to(&mut self, dot: usize) -> usize {
        self.show(dot as isize)
    }

    /// Active flag per slide (and per dot)
    pub fn active_flags(&self) -> Vec<bool> {
        (0..self.count).map(|i| i == self.current).collect()
    }
}

/// Horizontal swipe outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    Next,
    Prev,
}

/// Classify a touch gesture; below the threshold it is not a swipe
pub fn swipe_direction(start_x: f64, end_x: f64, threshold: f64) -> Option<SwipeDirection> {
    let diff = start_x - end_x;
    if diff.abs() <= threshold {
        None
    } else if diff > 0.0 {
        Some(SwipeDirection::Next)
    } else {
        Some(SwipeDirection::Prev)
    }
}

/// Keys the slider reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliderKey {
    ArrowLeft,
    ArrowRight,
    Other,
}

/// Visitor input forwarded to the slider task
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SliderCommand {
    Next,
    Prev,
    GoTo(usize),
    Key(SliderKey),
    Swipe { start_x: f64, end_x: f64 },
}

/// Handle to a running slider task
#[derive(Clone)]
pub struct SliderHandle {
    commands: mpsc::Sender<SliderCommand>,
    current: watch::Receiver<usize>,
}

impl SliderHandle {
    pub async fn send(&self, command: SliderCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| LoaderError::ChannelClosed("slider task stopped".to_string()))
    }

    /// Currently active slide
    pub fn current(&self) -> usize {
        *self.current.borrow()
    }

    /// Watch slide changes
    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.current.clone()
    }
}

/// Spawn the autoplay loop; it ends when every handle is dropped
pub fn spawn_slider(slider: HeroSlider, config: &SliderConfig) -> (SliderHandle, JoinHandle<HeroSlider>) {
    let (tx, rx) = mpsc::channel(32);
    let (current_tx, current_rx) = watch::channel(slider.current());
    let interval = Duration::from_millis(config.interval_ms);
    let threshold = config.swipe_threshold_px;

    let task = tokio::spawn(run_slider(slider, interval, threshold, rx, current_tx));
    (
        SliderHandle {
            commands: tx,
            current: current_rx,
        },
        task,
    )
}

async fn run_slider(
    mut slider: HeroSlider,
    interval: Duration,
    threshold: f64,
    mut commands: mpsc::Receiver<SliderCommand>,
    current: watch::Sender<usize>,
) -> HeroSlider {
    let autoplay = !slider.is_empty();
    let mut deadline = Instant::now() + interval;

    loop {
        tokio::select! {
            _ = sleep_until(deadline), if autoplay => {
                let index = slider.next();
                debug!(slide = index, "autoplay advance");
                current.send_replace(index);
                deadline += interval;
            }
            command = commands.recv() => {
                let Some(command) = command else { break };
                if apply_command(&mut slider, command, threshold) {
                    current.send_replace(slider.current());
                    deadline = Instant::now() + interval;
                }
            }
        }
    }

    slider
}

/// Apply visitor input; true if it counted as navigation
fn apply_command(slider: &mut HeroSlider, command: SliderCommand, threshold: f64) -> bool {
    if slider.is_empty() {
        return false;
    }
    match command {
        SliderCommand::Next | SliderCommand::Key(SliderKey::ArrowRight) => {
            slider.next();
        }
        SliderCommand::Prev | SliderCommand::Key(SliderKey::ArrowLeft) => {
            slider.prev();
        }
        SliderCommand::GoTo(dot) => {
            slider.go_to(dot);
        }
        SliderCommand::Swipe { start_x, end_x } => match swipe_direction(start_x, end_x, threshold) {
            Some(SwipeDirection::Next) => {
                slider.next();
            }
            Some(SwipeDirection::Prev) => {
                slider.prev();
            }
            None => return false,
        },
        SliderCommand::Key(SliderKey::Other) => return false,
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SliderConfig {
        SliderConfig::default()
    }

    #[test]
    fn test_wraparound() {
        let mut slider = HeroSlider::new(3);
        assert_eq!(slider.prev(), 2);
        assert_eq!(slider.next(), 0);
        assert_eq!(slider.show(7), 0);
        assert_eq!(slider.show(-4), 2);
        assert_eq!(slider.go_to(1), 1);
        assert_eq!(slider.active_flags(), vec![false, true, false]);
    }

    #[test]
    fn test_empty_slider_is_inert() {
        let mut slider = HeroSlider::new(0);
        assert_eq!(slider.next(), 0);
        assert_eq!(slider.prev(), 0);
        assert!(slider.active_flags().is_empty());
        assert!(!apply_command(&mut slider, SliderCommand::Next, 50.0));
    }

    #[test]
    fn test_swipe_threshold() {
        assert_eq!(swipe_direction(300.0, 200.0, 50.0), Some(SwipeDirection::Next));
        assert_eq!(swipe_direction(200.0, 300.0, 50.0), Some(SwipeDirection::Prev));
        assert_eq!(swipe_direction(200.0, 250.0, 50.0), None);
        assert_eq!(swipe_direction(200.0, 230.0, 50.0), None);
    }

    #[test]
    fn test_keys() {
        let mut slider = HeroSlider::new(4);
        assert!(apply_command(&mut slider, SliderCommand::Key(SliderKey::ArrowLeft), 50.0));
        assert_eq!(slider.current(), 3);
        assert!(apply_command(&mut slider, SliderCommand::Key(SliderKey::ArrowRight), 50.0));
        assert_eq!(slider.current(), 0);
        assert!(!apply_command(&mut slider, SliderCommand::Key(SliderKey::Other), 50.0));
        assert!(!apply_command(
            &mut slider,
            SliderCommand::Swipe { start_x: 10.0, end_x: 20.0 },
            50.0
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_autoplay_advances_every_interval() {
        let (handle, task) = spawn_slider(HeroSlider::new(3), &config());

        tokio::time::sleep(Duration::from_millis(6001)).await;
        assert_eq!(handle.current(), 1);
        tokio::time::sleep(Duration::from_millis(6000)).await;
        assert_eq!(handle.current(), 2);
        tokio::time::sleep(Duration::from_millis(6000)).await;
        assert_eq!(handle.current(), 0);

        drop(handle);
        assert_eq!(task.await.unwrap().current(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_navigation_resets_autoplay() {
        let (handle, task) = spawn_slider(HeroSlider::new(5), &config());

        tokio::time::sleep(Duration::from_millis(5000)).await;
        handle.send(SliderCommand::GoTo(3)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(handle.current(), 3);

        // Would have advanced at 6000 without the reset
        tokio::time::sleep(Duration::from_millis(5000)).await;
        assert_eq!(handle.current(), 3);

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(handle.current(), 4);

        drop(handle);
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_slides_never_autoplays() {
        let (handle, task) = spawn_slider(HeroSlider::new(0), &config());
        let mut changes = handle.subscribe();

        tokio::time::sleep(Duration::from_millis(30_000)).await;
        handle.send(SliderCommand::Next).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(!changes.has_changed().unwrap());
        drop(changes);
        drop(handle);
        assert!(task.await.unwrap().is_empty());
    }
}
