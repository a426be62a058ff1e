//! Async driver for a loading sequence
//!
//! One task owns the sequencer and its mount. Frames, resource
//! settlements, the safety timer and the document-loaded signal are
//! multiplexed with `select!`, so they interleave but never race: the
//! estimators raise `target`, the frame branch is the only writer of
//! `current`, and once the sequencer leaves `Running` the remaining
//! sources are simply no longer polled.

use crate::errors::Result;
use crate::events::{EventBus, LoaderEvent};
use crate::mount::LoaderMount;
use crate::sequencer::loader::{LoadingSequencer, SequencerConfig, SettleOutcome};
use crate::sequencer::resources::{ResourceId, ResourceSource, Settlement};
use crate::sequencer::state::{CompletionCause, SequencerState};
use crate::telemetry::{TelemetryCollector, TelemetryEvent};
use futures_util::stream::{FuturesUnordered, StreamExt};
use std::future::pending;
use std::pin::Pin;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, sleep_until, Instant, MissedTickBehavior, Sleep};
use tracing::{debug, info};
use uuid::Uuid;

/// What the host page hands the sequencer
#[derive(Default)]
pub struct PageInputs {
    pub resources: Vec<Box<dyn ResourceSource>>,
    pub document_loaded: Option<oneshot::Receiver<()>>,
}

impl PageInputs {
    pub fn new(resources: Vec<Box<dyn ResourceSource>>) -> Self {
        Self {
            resources,
            document_loaded: None,
        }
    }

    /// Attach a document-loaded signal; returns the host's sender
    pub fn with_document_signal(mut self) -> (Self, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        self.document_loaded = Some(rx);
        (self, tx)
    }
}

/// Outcome of a finished sequence
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceReport {
    pub sequence_id: Uuid,
    pub cause: CompletionCause,
    /// Time from start until the completion path was entered
    pub triggered_after: Duration,
    /// Time from start until the completion event fired
    pub total_duration: Duration,
    /// Displayed progress when completion was triggered
    pub progress_at_trigger: f64,
    pub resources_loaded: usize,
    pub resources_failed: usize,
    /// Resources still outstanding when the hand-off was forced
    pub resources_pending: usize,
    pub frames: usize,
}

/// Runs one loading sequence against one mount
pub struct SequenceRunner<M: LoaderMount> {
    sequencer: LoadingSequencer,
    mount: M,
    bus: EventBus,
    telemetry: TelemetryCollector,
    last_percent: Option<u32>,
    frames: usize,
}

impl<M: LoaderMount> SequenceRunner<M> {
    pub fn new(config: SequencerConfig, mount: M) -> Self {
        Self {
            sequencer: LoadingSequencer::new(config),
            mount,
            bus: EventBus::new(),
            telemetry: TelemetryCollector::new(),
            last_percent: None,
            frames: 0,
        }
    }

    pub fn with_bus(mut self, bus: EventBus) -> Self {
        self.bus = bus;
        self
    }

    pub fn with_telemetry(mut self, telemetry: TelemetryCollector) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn telemetry(&self) -> &TelemetryCollector {
        &self.telemetry
    }

    pub fn sequence_id(&self) -> Uuid {
        self.sequencer.id()
    }

    /// Drive the sequence to completion
    pub async fn run(mut self, inputs: PageInputs) -> Result<SequenceReport> {
        let PageInputs {
            resources,
            mut document_loaded,
        } = inputs;
        let id = self.sequencer.id();
        let config = self.sequencer.config().clone();
        config.validate()?;

        let start = Instant::now();
        let kinds = resources.iter().map(|r| r.descriptor().kind).collect();
        self.sequencer.start(start, kinds)?;
        self.mount.set_document_loading(true);
        self.mount.render_progress(0.0);

        let total = resources.len();
        self.bus.emit(LoaderEvent::Started {
            sequence_id: id,
            resources: total,
        });
        self.telemetry
            .record(TelemetryEvent::SequenceStarted { resources: total });
        info!(sequence = %id, resources = total, "loading sequence started");

        let mut pending_resources = FuturesUnordered::new();
        let mut already_settled = Vec::new();
        for (index, source) in resources.into_iter().enumerate() {
            let rid = ResourceId(index);
            match source.already_settled() {
                Some(outcome) => already_settled.push((rid, outcome)),
                None => pending_resources.push(async move { (rid, source.settled().await) }),
            }
        }
        for (rid, outcome) in already_settled {
            self.settle(rid, outcome);
        }

        let mut frames = interval(config.frame_interval);
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let safety = sleep_until(start + config.min_duration);
        tokio::pin!(safety);
        let mut document_timer: Option<Pin<Box<Sleep>>> = None;

        while self.sequencer.state() == SequencerState::Running {
            tokio::select! {
                biased;

                Some((rid, outcome)) = pending_resources.next(), if !pending_resources.is_empty() => {
                    self.settle(rid, outcome);
                }
                signalled = wait_signal(&mut document_loaded) => {
                    document_loaded = None;
                    if signalled {
                        // Fire once min_duration has elapsed, or right away if it has.
                        debug!(sequence = %id, "document loaded");
                        document_timer = Some(Box::pin(sleep_until(start + config.min_duration)));
                    }
                }
                _ = wait_timer(&mut document_timer) => {
                    document_timer = None;
                    self.sequencer
                        .complete_loading(CompletionCause::DocumentLoaded, Instant::now());
                }
                _ = &mut safety => {
                    self.sequencer.on_safety_timer(Instant::now());
                }
                _ = frames.tick() => {
                    self.render_frame();
                }
            }
        }
        drop(pending_resources);

        let cause = self
            .sequencer
            .completion_cause()
            .unwrap_or(CompletionCause::SafetyTimer);
        let triggered_at = self.sequencer.completion_started_at().unwrap_or(start);
        let progress_at_trigger = self.sequencer.progress().current();
        self.bus.emit(LoaderEvent::CompletionTriggered { cause });
        self.telemetry.record(TelemetryEvent::CompletionTriggered {
            cause,
            progress: progress_at_trigger,
        });
        info!(
            sequence = %id,
            state = self.sequencer.state().display_name(),
            cause = cause.as_str(),
            progress = progress_at_trigger,
            "completing load"
        );

        let ramp_start = self.frames;
        while !self.sequencer.ramp_finished() {
            frames.tick().await;
            self.render_frame();
        }
        self.telemetry.record(TelemetryEvent::RampFinished {
            frames: self.frames - ramp_start,
        });

        sleep(config.exit_delay).await;
        self.hand_off(&config).await?;

        let finished = Instant::now();
        let tracker = self.sequencer.resources();
        let report = SequenceReport {
            sequence_id: id,
            cause,
            triggered_after: triggered_at.saturating_duration_since(start),
            total_duration: finished.saturating_duration_since(start),
            progress_at_trigger,
            resources_loaded: tracker.loaded_count(),
            resources_failed: tracker.failed_count(),
            resources_pending: tracker.total() - tracker.settled_count(),
            frames: self.frames,
        };
        self.telemetry.record(TelemetryEvent::SequenceCompleted {
            duration_ms: report.total_duration.as_millis() as u64,
        });
        info!(
            sequence = %id,
            state = self.sequencer.state().display_name(),
            duration_ms = report.total_duration.as_millis() as u64,
            pending = report.resources_pending,
            "loading sequence complete"
        );
        Ok(report)
    }

    /// Run the sequence on its own task
    pub fn spawn(self, inputs: PageInputs) -> JoinHandle<Result<SequenceReport>>
    where
        M: 'static,
    {
        tokio::spawn(self.run(inputs))
    }

    fn render_frame(&mut self) {
        if let Some(value) = self.sequencer.on_frame(Instant::now()) {
            self.mount.render_progress(value);
            self.frames += 1;
            self.telemetry.record_frame();

            let percent = value.round() as u32;
            if self.last_percent != Some(percent) {
                self.last_percent = Some(percent);
                self.bus.emit(LoaderEvent::Progress { percent });
            }
        }
    }

    fn settle(&mut self, rid: ResourceId, outcome: Settlement) {
        let result = self.sequencer.settle_resource(rid, outcome, Instant::now());
        if result == SettleOutcome::Ignored {
            return;
        }
        let tracker = self.sequencer.resources();
        let kind = tracker.kind(rid);
        let (settled, total) = (tracker.settled_count(), tracker.total());

        if let Some(kind) = kind {
            if outcome == Settlement::Failed {
                debug!(resource = rid.0, %kind, "resource failed to load; counting as settled");
            }
            self.bus.emit(LoaderEvent::ResourceSettled {
                kind,
                outcome,
                settled,
                total,
            });
            self.telemetry
                .record(TelemetryEvent::ResourceSettled { kind, outcome });
        }
        debug!(resource = rid.0, settled, total, "resource settled");
    }

    /// Hide, reveal, retire, announce
    async fn hand_off(&mut self, config: &SequencerConfig) -> Result<()> {
        let begun = Instant::now();
        self.mount.hide_indicator();

        sleep_until(begun + config.reveal_delay).await;
        self.mount.reveal_content();
        self.mount.set_document_loading(false);
        self.bus.emit(LoaderEvent::ContentRevealed);
        self.telemetry.record(TelemetryEvent::ContentRevealed);

        sleep_until(begun + config.retire_delay).await;
        self.mount.retire_indicator();
        self.sequencer.finish()?;
        self.bus.emit_complete();
        Ok(())
    }
}

/// Resolves when the signal fires (true) or its sender is dropped (false);
/// never resolves once consumed
async fn wait_signal(signal: &mut Option<oneshot::Receiver<()>>) -> bool {
    match signal {
        Some(rx) => rx.await.is_ok(),
        None => pending().await,
    }
}

async fn wait_timer(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(timer) => timer.as_mut().await,
        None => pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mount::{MountCall, RecordingMount};
    use crate::sequencer::resources::{ResourceDescriptor, ResourceKind, SimulatedResource};

    fn image(latency_ms: u64, outcome: Settlement) -> Box<dyn ResourceSource> {
        Box::new(SimulatedResource::new(
            ResourceDescriptor::new(ResourceKind::Image, "/img/a.png"),
            Duration::from_millis(latency_ms),
            outcome,
        ))
    }

    fn config(min_ms: u64) -> SequencerConfig {
        SequencerConfig::default()
            .with_min_duration(Duration::from_millis(min_ms))
            .with_instant_handoff()
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_resources_completes_at_min_duration() {
        let mount = RecordingMount::new();
        let runner = SequenceRunner::new(config(3000), mount.clone());

        let report = runner.run(PageInputs::default()).await.unwrap();

        assert_eq!(report.cause, CompletionCause::NoResources);
        assert_eq!(report.triggered_after, Duration::from_millis(3000));
        assert_eq!(mount.widths().last().copied(), Some(100.0));
        assert_eq!(mount.last_label().as_deref(), Some("100%"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_handoff_order() {
        let mount = RecordingMount::new();
        let runner = SequenceRunner::new(config(1000), mount.clone());
        runner.run(PageInputs::default()).await.unwrap();

        let calls: Vec<MountCall> = mount
            .calls()
            .into_iter()
            .filter(|c| !matches!(c, MountCall::Progress { .. }))
            .collect();
        assert_eq!(
            calls,
            vec![
                MountCall::DocumentLoading(true),
                MountCall::IndicatorHidden,
                MountCall::ContentRevealed,
                MountCall::DocumentLoading(false),
                MountCall::IndicatorRetired,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cached_resources_complete_immediately() {
        let resources: Vec<Box<dyn ResourceSource>> = vec![
            Box::new(SimulatedResource::cached(ResourceDescriptor::new(
                ResourceKind::Stylesheet,
                "/css/site.css",
            ))),
            Box::new(SimulatedResource::cached(ResourceDescriptor::new(
                ResourceKind::Script,
                "/js/site.js",
            ))),
        ];
        let runner = SequenceRunner::new(config(3000), RecordingMount::new());
        let report = runner.run(PageInputs::new(resources)).await.unwrap();

        assert_eq!(report.cause, CompletionCause::ResourcesSettled);
        assert_eq!(report.triggered_after, Duration::ZERO);
        assert_eq!(report.resources_loaded, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_resource_forced_by_safety_timer() {
        let resources = vec![image(100, Settlement::Loaded), image(60_000, Settlement::Loaded)];
        let runner = SequenceRunner::new(config(3000), RecordingMount::new());
        let report = runner.run(PageInputs::new(resources)).await.unwrap();

        assert_eq!(report.cause, CompletionCause::SafetyTimer);
        assert_eq!(report.triggered_after, Duration::from_millis(3000));
        assert_eq!(report.resources_loaded, 1);
        assert_eq!(report.resources_pending, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_document_loaded_waits_for_min_duration() {
        let resources = vec![image(60_000, Settlement::Loaded)];
        let (inputs, loaded) = PageInputs::new(resources).with_document_signal();
        loaded.send(()).unwrap();

        let runner = SequenceRunner::new(config(2000), RecordingMount::new());
        let report = runner.run(inputs).await.unwrap();

        assert_eq!(report.cause, CompletionCause::DocumentLoaded);
        assert_eq!(report.triggered_after, Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_document_signal_is_harmless() {
        let (inputs, loaded) = PageInputs::default().with_document_signal();
        drop(loaded);

        let runner = SequenceRunner::new(config(1000), RecordingMount::new());
        let report = runner.run(inputs).await.unwrap();
        assert_eq!(report.cause, CompletionCause::NoResources);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exit_delay_and_handoff_phases() {
        let seq_config = SequencerConfig::default()
            .with_min_duration(Duration::from_millis(1000))
            .with_exit_delay(Duration::from_millis(400));
        let bus = EventBus::new();
        let mut events = bus.subscribe();
        let runner = SequenceRunner::new(seq_config, RecordingMount::new()).with_bus(bus);

        let start = Instant::now();
        let report = runner.run(PageInputs::default()).await.unwrap();

        let mut order = Vec::new();
        while let Ok(event) = events.try_recv() {
            if matches!(event, LoaderEvent::ContentRevealed | LoaderEvent::Complete) {
                order.push(event);
            }
        }
        assert_eq!(order, vec![LoaderEvent::ContentRevealed, LoaderEvent::Complete]);

        // ramp + 400ms exit delay + 1300ms retire delay after the trigger
        let after_trigger = report.total_duration - report.triggered_after;
        assert!(after_trigger >= Duration::from_millis(1700));
        assert!(after_trigger < Duration::from_millis(2500));
        assert_eq!(start.elapsed(), report.total_duration);
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_events_are_whole_percent_changes() {
        let bus = EventBus::new();
        let mut events = bus.subscribe();
        let runner = SequenceRunner::new(config(500), RecordingMount::new()).with_bus(bus);
        runner.run(PageInputs::default()).await.unwrap();

        let mut last = None;
        let mut complete = 0;
        while let Ok(event) = events.try_recv() {
            match event {
                LoaderEvent::Progress { percent } => {
                    assert_ne!(Some(percent), last);
                    if let Some(prev) = last {
                        assert!(percent > prev);
                    }
                    last = Some(percent);
                }
                LoaderEvent::Complete => complete += 1,
                _ => {}
            }
        }
        assert_eq!(last, Some(100));
        assert_eq!(complete, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_frame_interval_rejected_before_start() {
        let mount = RecordingMount::new();
        let mut config = config(1000);
        config.frame_interval = Duration::ZERO;

        let result = SequenceRunner::new(config, mount.clone())
            .run(PageInputs::default())
            .await;
        assert!(matches!(result, Err(crate::errors::LoaderError::ConfigError(_))));
        assert!(mount.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_completion_easing_rejected() {
        let mut config = config(1000);
        config.completion = crate::sequencer::progress::Easing::new(0.0, 0.0);

        let result = SequenceRunner::new(config, RecordingMount::new())
            .run(PageInputs::default())
            .await;
        assert!(matches!(result, Err(crate::errors::LoaderError::ConfigError(_))));
    }
}
