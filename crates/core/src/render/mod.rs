use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::{params::OutputParams, timeline::TimeState};

/// Everything downstream consumers need for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RealtimeSnapshot {
    pub time: TimeState,
    pub output_params: OutputParams,
}

/// Sink for the per-frame snapshot (DMX output stage, UI meters, ...).
pub trait RealtimePublisher {
    fn publish(&mut self, snapshot: Arc<RealtimeSnapshot>);
}

/// Visual renderer fed once per accepted frame, after publishing.
pub trait FrameRenderer {
    fn on_frame(&mut self, snapshot: &RealtimeSnapshot);
}

/// Latest published snapshot. Readers always get a whole frame: publishing
/// swaps the shared pointer, it never edits fields in place.
#[derive(Debug, Clone, Default)]
pub struct RealtimeStore {
    latest: Arc<Mutex<Option<Arc<RealtimeSnapshot>>>>,
}

impl RealtimeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> Option<Arc<RealtimeSnapshot>> {
        match self.latest.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => {
                tracing::warn!("realtime store has been poisoned");
                None
            }
        }
    }
}

impl RealtimePublisher for RealtimeStore {
    fn publish(&mut self, snapshot: Arc<RealtimeSnapshot>) {
        match self.latest.lock() {
            Ok(mut guard) => *guard = Some(snapshot),
            Err(_) => tracing::warn!("dropping snapshot, realtime store has been poisoned"),
        }
    }
}

/// In-process stand-in for the visualizer. Keeps the most recent frame and a
/// frame counter so the pipeline can be observed end to end.
#[derive(Debug, Default)]
pub struct RenderGraph {
    frames_drawn: u64,
    last_frame: Option<RealtimeSnapshot>,
}

impl RenderGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    pub fn last_frame(&self) -> Option<&RealtimeSnapshot> {
        self.last_frame.as_ref()
    }
}

impl FrameRenderer for RenderGraph {
    fn on_frame(&mut self, snapshot: &RealtimeSnapshot) {
        self.frames_drawn += 1;
        self.last_frame = Some(*snapshot);
        tracing::trace!(beat = snapshot.time.beat, "frame drawn");
    }
}

/// Shared handle so the host can inspect a renderer owned by the engine.
impl<R: FrameRenderer> FrameRenderer for Arc<Mutex<R>> {
    fn on_frame(&mut self, snapshot: &RealtimeSnapshot) {
        match self.lock() {
            Ok(mut renderer) => renderer.on_frame(snapshot),
            Err(_) => tracing::warn!("renderer has been poisoned"),
        }
    }
}
