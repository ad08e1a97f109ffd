//! Core library for the Beatlight lighting engine.
//!
//! Each frame the [`Engine`] reads the beat position from a [`TempoSource`],
//! runs the active [`Scene`]'s modulators against it to produce
//! [`OutputParams`], publishes the result as a [`RealtimeSnapshot`], lets the
//! [`AutoSceneScheduler`] decide whether to switch scenes on a beat boundary,
//! and finally hands the snapshot to a [`FrameRenderer`]. DMX output, the
//! visualizer and scene editing live outside this crate and plug in through
//! the traits re-exported here.

pub mod autoscene;
pub mod config;
pub mod engine;
pub mod error;
pub mod math;
pub mod modulation;
pub mod oscillator;
pub mod params;
pub mod render;
pub mod scene;
pub mod timeline;

pub use autoscene::{
    is_new_scene, AutoSceneConfigStore, AutoSceneScheduler, AutoSceneState, SharedAutoScene,
};
pub use config::{AppConfig, EngineConfig, TempoConfig};
pub use engine::{Engine, FrameLoop, FrameOutcome, FrameStats};
pub use error::{BeatlightError, Result};
pub use modulation::{compute_output_params, compute_split_output_params, Modulation, Modulator};
pub use oscillator::{Lfo, LfoShape};
pub use params::{map_undefined_params_to_default, BaseParams, OutputParams, Param};
pub use render::{FrameRenderer, RealtimePublisher, RealtimeSnapshot, RealtimeStore, RenderGraph};
pub use scene::{Scene, SceneCollection, SceneStore, SharedScenes, SplitScene};
pub use timeline::{InternalClock, TempoReading, TempoSource, TimeState, QUANTUM};
