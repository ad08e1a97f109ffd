use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Beats per rhythmic cycle. Fixed for the lifetime of the process.
pub const QUANTUM: f64 = 4.0;

pub const MIN_BPM: f64 = 20.0;
pub const MAX_BPM: f64 = 999.0;

/// What a tempo source reports at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoReading {
    pub beat: f64,
    pub bpm: f64,
}

/// Per-frame timing snapshot handed to the modulation engine and the
/// auto-scene scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeState {
    pub beat: f64,
    pub bpm: f64,
    /// Milliseconds since the previous accepted frame.
    pub dt: f64,
    pub quantum: f64,
}

impl TimeState {
    pub fn new(reading: TempoReading, dt: f64) -> Self {
        Self {
            beat: reading.beat,
            bpm: reading.bpm,
            dt,
            quantum: QUANTUM,
        }
    }

    /// How many beats elapsed during this frame.
    pub fn dt_beats(&self) -> f64 {
        (self.dt / 60_000.0) * self.bpm
    }
}

/// Source of musical time, such as a network tempo session.
pub trait TempoSource {
    fn current_time_state(&self) -> TempoReading;
    /// Shifts the tempo by `delta_bpm`.
    fn nudge_tempo(&mut self, delta_bpm: f64);
    fn set_enabled(&mut self, enabled: bool);
}

/// Free-running beat clock.
///
/// The beat position is derived from a monotonic anchor rather than
/// accumulated per frame. Tempo changes re-anchor the clock at the current
/// beat so the position stays continuous. Disabling sync does not stop the
/// clock; it only marks it as not following a shared session.
#[derive(Debug, Clone)]
pub struct InternalClock {
    anchor: Instant,
    anchor_beat: f64,
    bpm: f64,
    enabled: bool,
}

impl InternalClock {
    pub fn new(bpm: f64) -> Self {
        Self::starting_at(Instant::now(), bpm)
    }

    /// Creates a clock whose beat 0 falls on `anchor`.
    pub fn starting_at(anchor: Instant, bpm: f64) -> Self {
        Self {
            anchor,
            anchor_beat: 0.0,
            bpm: clamp_bpm(bpm),
            enabled: true,
        }
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Beat position at `now`. Instants before the anchor read as the anchor.
    pub fn beat_at(&self, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(self.anchor).as_secs_f64();
        self.anchor_beat + elapsed * self.bpm / 60.0
    }

    pub fn set_tempo_at(&mut self, now: Instant, bpm: f64) {
        self.anchor_beat = self.beat_at(now);
        self.anchor = now;
        self.bpm = clamp_bpm(bpm);
    }
}

impl TempoSource for InternalClock {
    fn current_time_state(&self) -> TempoReading {
        TempoReading {
            beat: self.beat_at(Instant::now()),
            bpm: self.bpm,
        }
    }

    fn nudge_tempo(&mut self, delta_bpm: f64) {
        let bpm = self.bpm + delta_bpm;
        self.set_tempo_at(Instant::now(), bpm);
        tracing::debug!(bpm = self.bpm, "tempo nudged");
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

fn clamp_bpm(bpm: f64) -> f64 {
    if bpm.is_nan() {
        MIN_BPM
    } else {
        bpm.clamp(MIN_BPM, MAX_BPM)
    }
}
