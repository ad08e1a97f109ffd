use std::sync::{Arc, Mutex};

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::{scene::SceneStore, timeline::TimeState};

/// Auto-scene settings. Owned by whoever configures the show; the engine only
/// reads them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoSceneState {
    pub enabled: bool,
    /// Scene length, in units of [`crate::QUANTUM`] beats.
    pub period: f64,
    /// Selection breadth knob. Passed through to scene selection, which is
    /// currently uniform.
    pub bombacity: f64,
}

impl Default for AutoSceneState {
    fn default() -> Self {
        Self {
            enabled: false,
            period: 1.0,
            bombacity: 0.0,
        }
    }
}

pub trait AutoSceneConfigStore {
    fn auto_scene_config(&self) -> AutoSceneState;
}

impl AutoSceneConfigStore for AutoSceneState {
    fn auto_scene_config(&self) -> AutoSceneState {
        *self
    }
}

/// Cloneable handle so a UI can toggle auto-scene while the engine runs.
#[derive(Debug, Clone, Default)]
pub struct SharedAutoScene {
    inner: Arc<Mutex<AutoSceneState>>,
}

impl SharedAutoScene {
    pub fn new(state: AutoSceneState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    pub fn update(&self, f: impl FnOnce(&mut AutoSceneState)) {
        match self.inner.lock() {
            Ok(mut guard) => f(&mut guard),
            Err(_) => tracing::warn!("auto-scene config has been poisoned"),
        }
    }
}

impl AutoSceneConfigStore for SharedAutoScene {
    fn auto_scene_config(&self) -> AutoSceneState {
        match self.inner.lock() {
            Ok(guard) => *guard,
            Err(_) => {
                tracing::warn!("auto-scene config has been poisoned, disabling");
                AutoSceneState::default()
            }
        }
    }
}

/// Returns true when this frame crossed a scene boundary.
///
/// The test is `beat mod (quantum * period) < dt_beats`: the frame's own beat
/// delta is the window. A frame longer than a whole scene fires on every
/// boundary it lands past, and an abrupt tempo change can shift the window
/// past a boundary without firing. The remainder takes the sign of the beat,
/// so a negative period behaves like its magnitude; a zero or NaN scene
/// length never fires.
pub fn is_new_scene(time: &TimeState, period: f64) -> bool {
    let beats_per_scene = time.quantum * period;
    if beats_per_scene == 0.0 || beats_per_scene.is_nan() {
        return false;
    }
    time.beat % beats_per_scene < time.dt_beats()
}

/// Watches beat boundaries and requests a random scene when auto-scene is on.
#[derive(Debug)]
pub struct AutoSceneScheduler {
    rng: StdRng,
}

impl Default for AutoSceneScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl AutoSceneScheduler {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic selection for tests and replays.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Checks the boundary for this frame and, when it fires, issues exactly
    /// one activation request. Returns the requested index.
    pub fn tick(
        &mut self,
        time: &TimeState,
        config: &AutoSceneState,
        store: &mut dyn SceneStore,
    ) -> Option<usize> {
        if !config.enabled || !is_new_scene(time, config.period) {
            return None;
        }

        let index = self.pick_scene(store.scene_count(), config.bombacity)?;
        tracing::debug!(index, beat = time.beat, "auto-scene change");
        store.set_active_scene_index(index);
        Some(index)
    }

    fn pick_scene(&mut self, scene_count: usize, bombacity: f64) -> Option<usize> {
        if scene_count == 0 {
            return None;
        }
        tracing::trace!(bombacity, scene_count, "picking random scene");
        Some(self.rng.gen_range(0..scene_count))
    }
}
