use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::{
    modulation::Modulator,
    oscillator::{Lfo, LfoShape},
    params::{BaseParams, Param},
    BeatlightError, Result,
};

/// Independently addressable sub-region of a scene. Splits share the parent's
/// oscillators but carry their own base values and modulation depths.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SplitScene {
    #[serde(default)]
    pub base_params: BaseParams,
}

/// A light scene: base values plus the modulators animating them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub name: String,
    #[serde(default)]
    pub base_params: BaseParams,
    #[serde(default)]
    pub modulators: Vec<Modulator>,
    #[serde(default)]
    pub split_scenes: Vec<SplitScene>,
}

impl Scene {
    pub fn new(name: impl Into<String>, split_count: usize) -> Self {
        Self {
            name: name.into(),
            base_params: BaseParams::new(),
            modulators: Vec::new(),
            split_scenes: vec![SplitScene::default(); split_count],
        }
    }

    pub fn split_count(&self) -> usize {
        self.split_scenes.len()
    }

    /// Appends a ramp modulator sized for this scene's splits and returns it
    /// for further editing.
    pub fn add_modulator(&mut self) -> &mut Modulator {
        self.modulators.push(Modulator::new(self.split_count()));
        let last = self.modulators.len() - 1;
        &mut self.modulators[last]
    }

    /// A handful of scenes used when no configuration supplies any.
    pub fn demo_set() -> Vec<Scene> {
        let mut pulse = Scene::new("Pulse", 0);
        pulse.base_params.insert(Param::Hue, 0.6);
        pulse.base_params.insert(Param::Brightness, 0.5);
        let modulator = pulse.add_modulator();
        modulator.lfo = Lfo::new(LfoShape::Sine, 1.0);
        modulator.modulation.insert(Param::Brightness, 1.0);

        let mut sweep = Scene::new("Sweep", 2);
        sweep.base_params.insert(Param::Saturation, 0.8);
        let modulator = sweep.add_modulator();
        modulator.lfo = Lfo::new(LfoShape::Triangle, 4.0);
        modulator.modulation.insert(Param::X, 1.0);
        modulator.split_modulations[0].insert(Param::X, 1.0);
        modulator.split_modulations[1].insert(Param::X, 0.0);

        let mut strobe = Scene::new("Strobe", 0);
        strobe.base_params.insert(Param::Epicness, 0.9);
        strobe.base_params.insert(Param::Strobe, 0.5);
        let modulator = strobe.add_modulator();
        modulator.lfo = Lfo::new(LfoShape::Square { duty: 0.5 }, 0.5);
        modulator.modulation.insert(Param::Black, 0.8);

        vec![pulse, sweep, strobe]
    }
}

/// Scene storage as seen by the frame loop: it reads the active scene and may
/// ask for a different one to be activated, but never edits scenes itself.
pub trait SceneStore {
    fn active_scene(&self) -> Option<Scene>;
    fn scene_count(&self) -> usize;
    fn set_active_scene_index(&mut self, index: usize);
}

/// Ordered scene list with at most one active entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneCollection {
    scenes: Vec<Scene>,
    active: Option<usize>,
}

impl SceneCollection {
    pub fn new(scenes: Vec<Scene>) -> Self {
        let active = if scenes.is_empty() { None } else { Some(0) };
        Self { scenes, active }
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn push(&mut self, scene: Scene) {
        self.scenes.push(scene);
    }

    pub fn deactivate(&mut self) {
        self.active = None;
    }
}

impl SceneStore for SceneCollection {
    fn active_scene(&self) -> Option<Scene> {
        self.active.and_then(|index| self.scenes.get(index)).cloned()
    }

    fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    fn set_active_scene_index(&mut self, index: usize) {
        if index < self.scenes.len() {
            self.active = Some(index);
        } else {
            tracing::warn!(
                index,
                count = self.scenes.len(),
                "ignoring activation of unknown scene"
            );
        }
    }
}

/// Cloneable handle to a [`SceneCollection`] shared between the engine and
/// whatever edits scenes.
#[derive(Debug, Clone, Default)]
pub struct SharedScenes {
    inner: Arc<Mutex<SceneCollection>>,
}

impl SharedScenes {
    pub fn new(collection: SceneCollection) -> Self {
        Self {
            inner: Arc::new(Mutex::new(collection)),
        }
    }

    /// Runs `f` with exclusive access to the collection.
    pub fn with<T>(&self, f: impl FnOnce(&mut SceneCollection) -> T) -> Result<T> {
        let mut guard = self.lock()?;
        Ok(f(&mut guard))
    }

    fn lock(&self) -> Result<MutexGuard<'_, SceneCollection>> {
        self.inner
            .lock()
            .map_err(|_| BeatlightError::msg("scene store has been poisoned"))
    }
}

impl SceneStore for SharedScenes {
    fn active_scene(&self) -> Option<Scene> {
        match self.lock() {
            Ok(guard) => guard.active_scene(),
            Err(err) => {
                tracing::warn!(%err, "treating scene store as empty");
                None
            }
        }
    }

    fn scene_count(&self) -> usize {
        self.lock().map(|guard| guard.scene_count()).unwrap_or(0)
    }

    fn set_active_scene_index(&mut self, index: usize) {
        match self.lock() {
            Ok(mut guard) => guard.set_active_scene_index(index),
            Err(err) => tracing::warn!(%err, index, "dropping scene activation"),
        }
    }
}
