//! Staggered entrance animations
//!
//! Once the loader announces completion, key page elements slide in one
//! after another: element `i` starts `i * stagger` after the announcement.

use crate::config::HandoffConfig;
use crate::events::EventBus;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

/// One element's entrance
#[derive(Debug, Clone, PartialEq)]
pub struct EntranceStep {
    pub index: usize,
    pub target: String,
    pub delay: Duration,
    pub duration: Duration,
    /// Vertical offset the element slides up from
    pub offset_px: u32,
}

/// Ordered entrance schedule
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntrancePlan {
    steps: Vec<EntranceStep>,
}

impl EntrancePlan {
    pub fn new(targets: &[String], stagger: Duration, duration: Duration, offset_px: u32) -> Self {
        let steps = targets
            .iter()
            .enumerate()
            .map(|(index, target)| EntranceStep {
                index,
                target: target.clone(),
                delay: stagger * index as u32,
                duration,
                offset_px,
            })
            .collect();
        Self { steps }
    }

    pub fn from_config(config: &HandoffConfig) -> Self {
        Self::new(
            &config.entrance_targets,
            Duration::from_millis(config.entrance_stagger_ms),
            Duration::from_millis(config.entrance_duration_ms),
            config.entrance_offset_px,
        )
    }

    pub fn steps(&self) -> &[EntranceStep] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// When the last element finishes, relative to the trigger
    pub fn total_duration(&self) -> Duration {
        self.steps
            .last()
            .map(|s| s.delay + s.duration)
            .unwrap_or_default()
    }
}

/// Wait for the loader to complete, then play `plan`
///
/// `apply` is called for each step at its scheduled start. The task
/// resolves to the number of steps played.
pub fn spawn_entrance<F>(bus: &EventBus, plan: EntrancePlan, mut apply: F) -> JoinHandle<usize>
where
    F: FnMut(&EntranceStep) + Send + 'static,
{
    let bus = bus.clone();
    tokio::spawn(async move {
        bus.wait_complete().await;
        let base = Instant::now();
        for step in plan.steps() {
            sleep_until(base + step.delay).await;
            apply(step);
        }
        plan.steps().len()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn targets(n: usize) -> Vec<String> {
        (0..n).map(|i| format!(".item-{}", i)).collect()
    }

    #[test]
    fn test_delays_are_index_proportional() {
        let plan = EntrancePlan::new(
            &targets(4),
            Duration::from_millis(60),
            Duration::from_millis(600),
            20,
        );
        let delays: Vec<u64> = plan
            .steps()
            .iter()
            .map(|s| s.delay.as_millis() as u64)
            .collect();
        assert_eq!(delays, vec![0, 60, 120, 180]);
        assert_eq!(plan.total_duration(), Duration::from_millis(780));
    }

    #[test]
    fn test_default_plan() {
        let plan = EntrancePlan::from_config(&HandoffConfig::default());
        assert_eq!(plan.steps().len(), 7);
        assert_eq!(plan.steps()[0].target, ".hero__badge");
        assert_eq!(plan.steps()[6].delay, Duration::from_millis(360));
    }

    #[test]
    fn test_empty_plan() {
        let plan = EntrancePlan::new(&[], Duration::from_millis(60), Duration::ZERO, 0);
        assert!(plan.is_empty());
        assert_eq!(plan.total_duration(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entrance_waits_for_completion() {
        let bus = EventBus::new();
        let played = Arc::new(Mutex::new(Vec::new()));
        let plan = EntrancePlan::new(
            &targets(3),
            Duration::from_millis(60),
            Duration::from_millis(600),
            20,
        );

        let log = played.clone();
        let handle = spawn_entrance(&bus, plan, move |step| {
            log.lock().unwrap().push((step.index, Instant::now()));
        });

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(played.lock().unwrap().is_empty());

        let completed_at = Instant::now();
        bus.emit_complete();
        assert_eq!(handle.await.unwrap(), 3);

        let played = played.lock().unwrap();
        let offsets: Vec<u64> = played
            .iter()
            .map(|(_, at)| (*at - completed_at).as_millis() as u64)
            .collect();
        assert_eq!(offsets, vec![0, 60, 120]);
    }
}
