use std::sync::{Arc, Mutex};

use beatlight_core::{
    compute_output_params, AutoSceneConfigStore, AutoSceneScheduler, AutoSceneState, Engine,
    EngineConfig, FrameOutcome, FrameRenderer, Lfo, LfoShape, Param, RealtimePublisher,
    RealtimeSnapshot, RealtimeStore, RenderGraph, Scene, SceneCollection, SceneStore,
    SharedAutoScene, SharedScenes, TempoReading, TempoSource,
};

/// Tempo source the test moves by hand.
#[derive(Clone)]
struct ManualTempo(Arc<Mutex<TempoReading>>);

impl ManualTempo {
    fn new(beat: f64, bpm: f64) -> Self {
        Self(Arc::new(Mutex::new(TempoReading { beat, bpm })))
    }

    fn set_beat(&self, beat: f64) {
        self.0.lock().unwrap().beat = beat;
    }
}

impl TempoSource for ManualTempo {
    fn current_time_state(&self) -> TempoReading {
        *self.0.lock().unwrap()
    }

    fn nudge_tempo(&mut self, delta_bpm: f64) {
        self.0.lock().unwrap().bpm += delta_bpm;
    }

    fn set_enabled(&mut self, _enabled: bool) {}
}

/// Records the order in which the engine calls its sinks.
#[derive(Clone, Default)]
struct CallLog(Arc<Mutex<Vec<&'static str>>>);

impl RealtimePublisher for CallLog {
    fn publish(&mut self, _snapshot: Arc<RealtimeSnapshot>) {
        self.0.lock().unwrap().push("publish");
    }
}

impl FrameRenderer for CallLog {
    fn on_frame(&mut self, _snapshot: &RealtimeSnapshot) {
        self.0.lock().unwrap().push("render");
    }
}

fn numbered_scenes(count: usize) -> Vec<Scene> {
    (0..count)
        .map(|i| {
            let mut scene = Scene::new(format!("scene {i}"), 0);
            scene.base_params.insert(Param::Hue, i as f64 / count as f64);
            scene
        })
        .collect()
}

#[test]
fn publish_happens_before_render_once_per_accepted_frame() {
    let log = CallLog::default();
    let scenes = SharedScenes::new(SceneCollection::new(Scene::demo_set()));
    let mut engine = Engine::new(EngineConfig::default(), scenes, log.clone(), log.clone())
        .with_tempo_source(ManualTempo::new(0.0, 120.0));

    for now in [16.0, 20.0, 33.0, 40.0, 50.0] {
        engine.tick(now);
    }

    // 16, 33 and 50 are accepted; 20 and 40 fall inside the debounce window.
    assert_eq!(
        *log.0.lock().unwrap(),
        vec!["publish", "render", "publish", "render", "publish", "render"]
    );
}

#[test]
fn auto_scene_fires_on_the_boundary_frame_only() {
    let tempo = ManualTempo::new(0.0, 120.0);
    let scenes = SharedScenes::new(SceneCollection::new(numbered_scenes(5)));
    let auto = SharedAutoScene::new(AutoSceneState {
        enabled: true,
        period: 2.0,
        bombacity: 0.3,
    });
    let mut engine = Engine::new(
        EngineConfig::default(),
        scenes.clone(),
        RealtimeStore::new(),
        RenderGraph::new(),
    )
    .with_tempo_source(tempo.clone())
    .with_auto_scene(auto.clone())
    .with_scheduler(AutoSceneScheduler::with_seed(3));

    // 500ms frames at 120bpm span one beat each; 8 beats per scene.
    tempo.set_beat(7.5);
    assert_eq!(
        engine.tick(500.0),
        FrameOutcome::Rendered { scene_change: None }
    );

    tempo.set_beat(8.5);
    let outcome = engine.tick(1_000.0);
    let FrameOutcome::Rendered {
        scene_change: Some(index),
    } = outcome
    else {
        panic!("expected a scene change, got {outcome:?}");
    };
    assert!(index < 5);
    assert_eq!(scenes.with(|c| c.active_index()).unwrap(), Some(index));

    auto.update(|state| state.enabled = false);
    tempo.set_beat(16.2);
    assert_eq!(
        engine.tick(1_500.0),
        FrameOutcome::Rendered { scene_change: None }
    );
}

/// Wraps a scene collection and counts the activation requests it receives.
#[derive(Clone)]
struct CountingScenes {
    inner: SharedScenes,
    requests: Arc<Mutex<usize>>,
}

impl CountingScenes {
    fn new(scenes: Vec<Scene>) -> Self {
        Self {
            inner: SharedScenes::new(SceneCollection::new(scenes)),
            requests: Arc::default(),
        }
    }

    fn requests(&self) -> usize {
        *self.requests.lock().unwrap()
    }
}

impl SceneStore for CountingScenes {
    fn active_scene(&self) -> Option<Scene> {
        self.inner.active_scene()
    }

    fn scene_count(&self) -> usize {
        self.inner.scene_count()
    }

    fn set_active_scene_index(&mut self, index: usize) {
        *self.requests.lock().unwrap() += 1;
        self.inner.set_active_scene_index(index);
    }
}

fn counting_engine(
    tempo: ManualTempo,
    scenes: CountingScenes,
    auto: impl AutoSceneConfigStore + 'static,
) -> Engine {
    Engine::new(
        EngineConfig::default(),
        scenes,
        RealtimeStore::new(),
        RenderGraph::new(),
    )
    .with_tempo_source(tempo)
    .with_auto_scene(auto)
    .with_scheduler(AutoSceneScheduler::with_seed(9))
}

#[test]
fn stalled_frame_still_fires_once_per_tick() {
    let scenes = CountingScenes::new(numbered_scenes(2));
    let auto = AutoSceneState {
        enabled: true,
        period: 1.0,
        bombacity: 0.0,
    };
    let mut engine = counting_engine(ManualTempo::new(3.0, 120.0), scenes.clone(), auto);

    // A twenty second stall covers forty beats, ten whole four beat scenes,
    // so the boundary test passes even mid-scene. The tick still issues a
    // single request.
    assert!(matches!(
        engine.tick(20_000.0),
        FrameOutcome::Rendered {
            scene_change: Some(_)
        }
    ));
    assert_eq!(scenes.requests(), 1);
}

#[test]
fn frames_that_do_not_fire_request_nothing() {
    let tempo = ManualTempo::new(3.0, 120.0);
    let scenes = CountingScenes::new(numbered_scenes(2));
    let auto = SharedAutoScene::new(AutoSceneState {
        enabled: false,
        period: 1.0,
        bombacity: 0.0,
    });
    let mut engine = counting_engine(tempo.clone(), scenes.clone(), auto.clone());

    // Disabled: even a stall frame stays quiet.
    engine.tick(20_000.0);
    assert_eq!(scenes.requests(), 0);

    // Enabled, but beat 2.5 is mid-scene and the frame spans one beat.
    auto.update(|state| state.enabled = true);
    tempo.set_beat(2.5);
    assert_eq!(
        engine.tick(20_500.0),
        FrameOutcome::Rendered { scene_change: None }
    );
    assert_eq!(scenes.requests(), 0);
}

#[test]
fn published_output_tracks_the_active_scene_and_stays_normalised() {
    let tempo = ManualTempo::new(0.0, 128.0);
    let mut wild = Scene::new("wild", 0);
    wild.base_params.insert(Param::Brightness, 0.9);
    for period in [0.5, 1.0, 3.0] {
        let modulator = wild.add_modulator();
        modulator.lfo = Lfo::new(LfoShape::Sine, period);
        modulator.modulation.insert(Param::Brightness, 1.0);
        modulator.modulation.insert(Param::Strobe, 0.0);
    }
    let scenes = SharedScenes::new(SceneCollection::new(vec![wild.clone()]));
    let store = RealtimeStore::new();
    let mut engine = Engine::new(
        EngineConfig::default(),
        scenes,
        store.clone(),
        RenderGraph::new(),
    )
    .with_tempo_source(tempo.clone());

    let mut now = 0.0;
    for step in 0..64 {
        let beat = step as f64 * 0.173;
        tempo.set_beat(beat);
        now += 16.0;
        engine.tick(now);

        let snapshot = store.latest().unwrap();
        let expected = compute_output_params(beat, &wild, None).unwrap();
        assert_eq!(snapshot.output_params, expected);
        for (param, value) in snapshot.output_params.iter() {
            assert!((0.0..=1.0).contains(&value), "{param} = {value}");
        }
    }
}

#[test]
fn scene_edits_from_the_host_are_picked_up_next_frame() {
    let scenes = SharedScenes::new(SceneCollection::new(numbered_scenes(3)));
    let store = RealtimeStore::new();
    let mut engine = Engine::new(
        EngineConfig::default(),
        scenes.clone(),
        store.clone(),
        RenderGraph::new(),
    )
    .with_tempo_source(ManualTempo::new(0.0, 120.0));

    engine.tick(16.0);
    assert_eq!(store.latest().unwrap().output_params[Param::Hue], 0.0);

    let mut host = scenes.clone();
    host.set_active_scene_index(2);
    engine.tick(32.0);
    let hue = store.latest().unwrap().output_params[Param::Hue];
    assert!((hue - 2.0 / 3.0).abs() < 1e-12);
}
