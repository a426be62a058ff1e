//! Scroll-reveal of page sections
//!
//! Watched elements start hidden and offset below their resting place. Each
//! observation reports how much of an element is visible; elements at or
//! past the threshold are revealed once and then no longer watched.
//! Elements revealed by the same observation are staggered in report order.

use crate::config::ScrollConfig;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};

/// Presentation of a watched element
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevealStyle {
    pub opacity: f64,
    /// Vertical offset below the element's resting place
    pub offset_px: u32,
}

impl RevealStyle {
    pub const SHOWN: Self = Self {
        opacity: 1.0,
        offset_px: 0,
    };
}

/// Visible ratio of one watched element
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    pub element: usize,
    pub ratio: f64,
}

/// A reveal scheduled by an observation
#[derive(Debug, Clone, PartialEq)]
pub struct RevealStep {
    pub element: usize,
    pub selector: String,
    /// Start, relative to the observation
    pub delay: Duration,
    pub duration: Duration,
}

#[derive(Debug, Clone)]
struct Watched {
    selector: String,
    revealed: bool,
}

/// Reveals elements the first time they scroll into view
#[derive(Debug, Clone)]
pub struct RevealObserver {
    threshold: f64,
    offset_px: u32,
    stagger: Duration,
    duration: Duration,
    elements: Vec<Watched>,
}

impl RevealObserver {
    pub fn new(config: &ScrollConfig) -> Self {
        Self {
            threshold: config.reveal_threshold,
            offset_px: config.reveal_offset_px,
            stagger: Duration::from_millis(config.reveal_stagger_ms),
            duration: Duration::from_millis(config.reveal_duration_ms),
            elements: Vec::new(),
        }
    }

    /// Start watching an element; returns its index
    pub fn watch(&mut self, selector: impl Into<String>) -> usize {
        self.elements.push(Watched {
            selector: selector.into(),
            revealed: false,
        });
        self.elements.len() - 1
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Elements still waiting to be revealed
    pub fn watching(&self) -> usize {
        self.elements.iter().filter(|e| !e.revealed).count()
    }

    pub fn is_revealed(&self, element: usize) -> bool {
        self.elements.get(element).is_some_and(|e| e.revealed)
    }

    pub fn style(&self, element: usize) -> Option<RevealStyle> {
        self.elements.get(element).map(|e| {
            if e.revealed {
                RevealStyle::SHOWN
            } else {
                RevealStyle {
                    opacity: 0.0,
                    offset_px: self.offset_px,
                }
            }
        })
    }

    pub fn is_intersecting(&self, ratio: f64) -> bool {
        ratio > 0.0 && ratio >= self.threshold
    }

    /// Feed one observation; returns the reveals it schedules
    ///
    /// Unknown and already revealed elements are skipped.
    pub fn observe(&mut self, entries: &[Intersection]) -> Vec<RevealStep> {
        let mut steps = Vec::new();
        for entry in entries {
            if !self.is_intersecting(entry.ratio) {
                continue;
            }
            let Some(watched) = self.elements.get_mut(entry.element) else {
                continue;
            };
            if watched.revealed {
                continue;
            }
            watched.revealed = true;
            steps.push(RevealStep {
                element: entry.element,
                selector: watched.selector.clone(),
                delay: self.stagger * steps.len() as u32,
                duration: self.duration,
            });
        }
        steps
    }
}

/// Fraction of an element of `height` at `top` inside the viewport
pub fn visibility_ratio(top: f64, height: f64, viewport_top: f64, viewport_height: f64) -> f64 {
    if height <= 0.0 {
        return 0.0;
    }
    let visible_top = top.max(viewport_top);
    let visible_bottom = (top + height).min(viewport_top + viewport_height);
    ((visible_bottom - visible_top).max(0.0) / height).min(1.0)
}

/// Call `apply` for each step at its scheduled start
pub async fn play_reveals<F>(steps: &[RevealStep], mut apply: F)
where
    F: FnMut(&RevealStep),
{
    let base = Instant::now();
    for step in steps {
        sleep_until(base + step.delay).await;
        apply(step);
    }
}
