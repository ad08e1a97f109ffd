use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::{
    math::{clamp_normalized, to_bipolar},
    params::{map_undefined_params_to_default, OutputParams, Param},
    scene::Scene,
    BeatlightError, Lfo, Result,
};

/// Per-parameter modulation depth in `[0, 1]`. A missing entry means the
/// modulator leaves that parameter alone; `0.5` is a neutral depth and values
/// below it invert the oscillator.
pub type Modulation = BTreeMap<Param, f64>;

/// An oscillator together with the depths it applies, both for the scene as a
/// whole and for each of the scene's splits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modulator {
    pub lfo: Lfo,
    #[serde(default)]
    pub modulation: Modulation,
    #[serde(default)]
    pub split_modulations: Vec<Modulation>,
}

impl Modulator {
    /// Creates a ramp modulator with empty depth maps for the scene root and
    /// for each of `split_count` splits.
    pub fn new(split_count: usize) -> Self {
        Self {
            lfo: Lfo::ramp(),
            modulation: Modulation::new(),
            split_modulations: vec![Modulation::new(); split_count],
        }
    }

    pub fn with_lfo(mut self, lfo: Lfo) -> Self {
        self.lfo = lfo;
        self
    }

    /// Depth map that applies to `split_index`, or the root map for `None`.
    pub fn modulation_for(&self, split_index: Option<usize>) -> Result<&Modulation> {
        match split_index {
            None => Ok(&self.modulation),
            Some(index) => {
                self.split_modulations
                    .get(index)
                    .ok_or(BeatlightError::ModulatorSplitMismatch {
                        index,
                        len: self.split_modulations.len(),
                    })
            }
        }
    }
}

/// One modulator's contribution for the current beat.
struct ModSnapshot<'a> {
    modulation: &'a Modulation,
    lfo_value: f64,
}

/// Resolves the output parameters of `scene` (or one of its splits) at
/// `beats`.
///
/// Each modulator that sets a depth for a parameter adds
/// `bipolar(depth) * bipolar(lfo) / 2` to the parameter's base value, so a
/// single modulator moves a value by at most half the range. Contributions are
/// folded left to right in modulator order and the sum is clamped to `[0, 1]`.
pub fn compute_output_params(
    beats: f64,
    scene: &Scene,
    split_index: Option<usize>,
) -> Result<OutputParams> {
    let base_params = match split_index {
        None => &scene.base_params,
        Some(index) => {
            &scene
                .split_scenes
                .get(index)
                .ok_or(BeatlightError::SplitOutOfRange {
                    index,
                    count: scene.split_scenes.len(),
                })?
                .base_params
        }
    };
    let mapped = map_undefined_params_to_default(base_params);

    let snapshots = scene
        .modulators
        .iter()
        .map(|modulator| {
            Ok(ModSnapshot {
                modulation: modulator.modulation_for(split_index)?,
                lfo_value: modulator.lfo.evaluate(beats),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut output = OutputParams::default();
    for param in Param::iter() {
        output.set(param, output_param(mapped[param], param, &snapshots));
    }
    Ok(output)
}

/// Resolves every split of `scene` at `beats`, in split order.
pub fn compute_split_output_params(beats: f64, scene: &Scene) -> Result<Vec<OutputParams>> {
    (0..scene.split_count())
        .map(|index| compute_output_params(beats, scene, Some(index)))
        .collect()
}

fn output_param(base: f64, param: Param, snapshots: &[ModSnapshot<'_>]) -> f64 {
    let sum = snapshots.iter().fold(base, |sum, snapshot| {
        match snapshot.modulation.get(&param) {
            None => sum,
            Some(&depth) => {
                let depth = to_bipolar(clamp_normalized(depth));
                let lfo = to_bipolar(clamp_normalized(snapshot.lfo_value));
                sum + depth * lfo / 2.0
            }
        }
    });
    clamp_normalized(sum)
}
