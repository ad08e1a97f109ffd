use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::math::{clamp_normalized, to_unipolar};

/// Waveform of an [`Lfo`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LfoShape {
    /// Raised cosine; starts and ends each cycle at 0.
    Sine,
    /// Rises linearly from 0 to 1 across the cycle.
    Ramp,
    /// Rises for the first half of the cycle and falls for the second.
    Triangle,
    /// High while the phase is below `duty`.
    Square { duty: f64 },
}

/// Beat-synced low-frequency oscillator.
///
/// The oscillator keeps no running phase: its value is a pure function of the
/// beat position, so two engines reading the same tempo clock always agree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lfo {
    pub shape: LfoShape,
    /// Length of one cycle, in beats.
    #[serde(default = "default_period")]
    pub period: f64,
    /// Offset applied to the phase, as a fraction of a cycle.
    #[serde(default)]
    pub phase_shift: f64,
    /// Inverts the output.
    #[serde(default)]
    pub flip: bool,
}

fn default_period() -> f64 {
    1.0
}

impl Default for Lfo {
    fn default() -> Self {
        Self::ramp()
    }
}

impl Lfo {
    pub fn new(shape: LfoShape, period: f64) -> Self {
        Self {
            shape,
            period,
            phase_shift: 0.0,
            flip: false,
        }
    }

    /// One-beat ramp, used for freshly created modulators.
    pub fn ramp() -> Self {
        Self::new(LfoShape::Ramp, default_period())
    }

    pub fn with_phase_shift(mut self, phase_shift: f64) -> Self {
        self.phase_shift = phase_shift;
        self
    }

    pub fn flipped(mut self) -> Self {
        self.flip = !self.flip;
        self
    }

    /// Position within the current cycle, in `[0, 1)`.
    pub fn phase(&self, beats: f64) -> f64 {
        if !(self.period.is_finite() && self.period > 0.0) || !beats.is_finite() {
            return 0.0;
        }
        let phase = (beats / self.period + self.phase_shift).rem_euclid(1.0);
        // rem_euclid rounds tiny negative inputs up to exactly 1.0.
        if phase >= 1.0 {
            0.0
        } else {
            phase
        }
    }

    /// Evaluates the oscillator at `beats`, returning a value in `[0, 1]`.
    pub fn evaluate(&self, beats: f64) -> f64 {
        let phase = self.phase(beats);
        let value = match self.shape {
            LfoShape::Sine => to_unipolar(-(TAU * phase).cos()),
            LfoShape::Ramp => phase,
            LfoShape::Triangle => {
                if phase < 0.5 {
                    2.0 * phase
                } else {
                    2.0 - 2.0 * phase
                }
            }
            LfoShape::Square { duty } => {
                if phase < duty {
                    1.0
                } else {
                    0.0
                }
            }
        };
        let value = if self.flip { 1.0 - value } else { value };
        clamp_normalized(value)
    }
}
