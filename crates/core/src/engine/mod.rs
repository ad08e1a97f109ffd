//! The per-frame pipeline: tempo → modulation → publish → auto-scene → render.

use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use crate::{
    autoscene::{AutoSceneConfigStore, AutoSceneScheduler, AutoSceneState},
    config::EngineConfig,
    modulation::compute_output_params,
    render::{FrameRenderer, RealtimePublisher, RealtimeSnapshot},
    scene::SceneStore,
    timeline::{TempoSource, TimeState},
};

/// What a single call to [`Engine::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Arrived too soon after the previous accepted frame; nothing happened.
    Skipped,
    /// Accepted, but there was no tempo source or no active scene.
    Idle,
    /// A snapshot was published and rendered. Carries the scene index the
    /// auto-scene scheduler requested, if it fired.
    Rendered { scene_change: Option<usize> },
}

/// Engine context. Owns its collaborators, so several engines can coexist
/// without sharing hidden state.
pub struct Engine {
    config: EngineConfig,
    tempo: Option<Box<dyn TempoSource>>,
    scenes: Box<dyn SceneStore>,
    auto_scene: Box<dyn AutoSceneConfigStore>,
    publisher: Box<dyn RealtimePublisher>,
    renderer: Box<dyn FrameRenderer>,
    scheduler: AutoSceneScheduler,
    last_frame_ms: f64,
    engine_time_ms: f64,
}

impl Engine {
    /// Creates an engine with no tempo source and auto-scene disabled.
    pub fn new(
        config: EngineConfig,
        scenes: impl SceneStore + 'static,
        publisher: impl RealtimePublisher + 'static,
        renderer: impl FrameRenderer + 'static,
    ) -> Self {
        Self {
            config,
            tempo: None,
            scenes: Box::new(scenes),
            auto_scene: Box::new(AutoSceneState::default()),
            publisher: Box::new(publisher),
            renderer: Box::new(renderer),
            scheduler: AutoSceneScheduler::new(),
            last_frame_ms: 0.0,
            engine_time_ms: 0.0,
        }
    }

    pub fn with_tempo_source(mut self, tempo: impl TempoSource + 'static) -> Self {
        self.attach_tempo_source(tempo);
        self
    }

    pub fn with_auto_scene(mut self, auto_scene: impl AutoSceneConfigStore + 'static) -> Self {
        self.auto_scene = Box::new(auto_scene);
        self
    }

    pub fn with_scheduler(mut self, scheduler: AutoSceneScheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Connects a tempo source once it becomes available.
    pub fn attach_tempo_source(&mut self, tempo: impl TempoSource + 'static) {
        self.tempo = Some(Box::new(tempo));
    }

    pub fn has_tempo_source(&self) -> bool {
        self.tempo.is_some()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Debounce floor in effect. A non-finite or non-positive configured value
    /// would disable debouncing, so it falls back to the default.
    pub fn min_frame_interval_ms(&self) -> f64 {
        let configured = self.config.min_frame_interval_ms;
        if configured.is_finite() && configured > 0.0 {
            configured
        } else {
            EngineConfig::default().min_frame_interval_ms
        }
    }

    /// Total time covered by accepted frames, in milliseconds.
    pub fn engine_time_ms(&self) -> f64 {
        self.engine_time_ms
    }

    pub fn nudge_tempo(&mut self, delta_bpm: f64) {
        if let Some(tempo) = self.tempo.as_mut() {
            tempo.nudge_tempo(delta_bpm);
        }
    }

    pub fn set_tempo_enabled(&mut self, enabled: bool) {
        if let Some(tempo) = self.tempo.as_mut() {
            tempo.set_enabled(enabled);
        }
    }

    /// Runs one frame at `now_ms`, a monotonic timestamp in milliseconds.
    pub fn tick(&mut self, now_ms: f64) -> FrameOutcome {
        let dt = now_ms - self.last_frame_ms;
        if dt < self.min_frame_interval_ms() {
            return FrameOutcome::Skipped;
        }
        self.last_frame_ms = now_ms;
        self.engine_time_ms += dt;

        let Some(tempo) = self.tempo.as_ref() else {
            return FrameOutcome::Idle;
        };
        let time = TimeState::new(tempo.current_time_state(), dt);

        let Some(scene) = self.scenes.active_scene() else {
            return FrameOutcome::Idle;
        };
        let output_params = match compute_output_params(time.beat, &scene, None) {
            Ok(params) => params,
            Err(err) => {
                tracing::warn!(%err, scene = %scene.name, "skipping frame");
                return FrameOutcome::Idle;
            }
        };

        let snapshot = Arc::new(RealtimeSnapshot {
            time,
            output_params,
        });
        self.publisher.publish(Arc::clone(&snapshot));

        let auto_scene = self.auto_scene.auto_scene_config();
        let scene_change = self
            .scheduler
            .tick(&time, &auto_scene, self.scenes.as_mut());

        self.renderer.on_frame(&snapshot);

        FrameOutcome::Rendered { scene_change }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("has_tempo_source", &self.tempo.is_some())
            .field("last_frame_ms", &self.last_frame_ms)
            .field("engine_time_ms", &self.engine_time_ms)
            .finish()
    }
}

/// Counts of frame outcomes seen by a [`FrameLoop`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub skipped: u64,
    pub idle: u64,
    pub rendered: u64,
    pub scene_changes: u64,
}

impl FrameStats {
    pub fn record(&mut self, outcome: FrameOutcome) {
        match outcome {
            FrameOutcome::Skipped => self.skipped += 1,
            FrameOutcome::Idle => self.idle += 1,
            FrameOutcome::Rendered { scene_change } => {
                self.rendered += 1;
                if scene_change.is_some() {
                    self.scene_changes += 1;
                }
            }
        }
    }

    pub fn total(&self) -> u64 {
        self.skipped + self.idle + self.rendered
    }
}

/// Fixed-rate driver for an [`Engine`].
///
/// Every iteration is rescheduled whatever the engine did with it; the
/// engine's own debounce decides whether a wake-up turns into a frame.
#[derive(Debug)]
pub struct FrameLoop {
    interval: Duration,
    stats: FrameStats,
}

impl FrameLoop {
    pub fn new(config: &EngineConfig) -> Self {
        let fallback = || Duration::from_secs_f64(1.0 / EngineConfig::default().refresh_rate_hz);
        let interval = if config.refresh_rate_hz.is_finite() && config.refresh_rate_hz > 0.0 {
            Duration::try_from_secs_f64(1.0 / config.refresh_rate_hz).unwrap_or_else(|err| {
                tracing::warn!(%err, hz = config.refresh_rate_hz, "unusable refresh rate");
                fallback()
            })
        } else {
            fallback()
        };
        Self {
            interval,
            stats: FrameStats::default(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Ticks `engine` until `keep_running` returns false. The predicate sees
    /// each outcome along with the running totals.
    pub fn run(
        &mut self,
        engine: &mut Engine,
        mut keep_running: impl FnMut(FrameOutcome, &FrameStats) -> bool,
    ) -> FrameStats {
        let start = Instant::now();
        let mut deadline = start;

        loop {
            let now_ms = start.elapsed().as_secs_f64() * 1_000.0;
            let outcome = engine.tick(now_ms);
            self.stats.record(outcome);
            if let FrameOutcome::Rendered {
                scene_change: Some(index),
            } = outcome
            {
                tracing::info!(index, "auto-scene switched scene");
            }
            if !keep_running(outcome, &self.stats) {
                break;
            }

            deadline += self.interval;
            let now = Instant::now();
            if deadline > now {
                thread::sleep(deadline - now);
            } else {
                // Fell behind; resync instead of bursting to catch up.
                deadline = now;
            }
        }

        self.stats
    }
}
