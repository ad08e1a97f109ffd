use std::{collections::BTreeMap, fmt, ops::Index};

use serde::{Deserialize, Serialize};
use strum::{EnumCount as UseEnumCount, IntoEnumIterator};
use strum_macros::{Display, EnumCount, EnumIter, EnumString, IntoStaticStr};

use crate::math::clamp_normalized;

/// Lighting attributes driven by the engine. Every value is normalised to
/// `[0, 1]`; fixtures and effects decide what that range means.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumCount,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Param {
    Hue,
    Saturation,
    Brightness,
    X,
    Y,
    Width,
    Height,
    XAxis,
    YAxis,
    Black,
    Strobe,
    Epicness,
    Randomize,
}

impl Param {
    /// Value used when a scene leaves the parameter unset.
    pub fn default_value(self) -> f64 {
        match self {
            Param::Hue => 0.0,
            Param::Saturation => 1.0,
            Param::Brightness => 1.0,
            Param::X | Param::Y => 0.5,
            Param::Width | Param::Height => 1.0,
            Param::XAxis | Param::YAxis => 0.5,
            Param::Black | Param::Strobe | Param::Epicness | Param::Randomize => 0.0,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Partially specified parameter values as authored on a scene.
pub type BaseParams = BTreeMap<Param, f64>;

/// Resolves every parameter, falling back to [`Param::default_value`].
pub fn map_undefined_params_to_default(base: &BaseParams) -> OutputParams {
    let mut resolved = OutputParams::default();
    for param in Param::iter() {
        let value = base
            .get(&param)
            .copied()
            .unwrap_or_else(|| param.default_value());
        resolved.set(param, value);
    }
    resolved
}

/// Fully resolved value for every [`Param`]. Indexing is total, so consumers
/// never have to handle a missing entry.
#[derive(Clone, Copy, PartialEq)]
pub struct OutputParams {
    values: [f64; Param::COUNT],
}

impl Default for OutputParams {
    fn default() -> Self {
        let mut values = [0.0; Param::COUNT];
        for param in Param::iter() {
            values[param.index()] = param.default_value();
        }
        Self { values }
    }
}

impl OutputParams {
    pub fn get(&self, param: Param) -> f64 {
        self.values[param.index()]
    }

    pub fn set(&mut self, param: Param, value: f64) {
        self.values[param.index()] = value;
    }

    /// Iterates `(param, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (Param, f64)> + '_ {
        Param::iter().map(move |param| (param, self.get(param)))
    }

    /// Returns a copy with every value clamped into `[0, 1]`.
    pub fn clamped(&self) -> Self {
        let mut out = *self;
        for value in out.values.iter_mut() {
            *value = clamp_normalized(*value);
        }
        out
    }
}

impl Index<Param> for OutputParams {
    type Output = f64;

    fn index(&self, param: Param) -> &f64 {
        &self.values[param.index()]
    }
}

impl fmt::Debug for OutputParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(param, value)| (<&'static str>::from(param), value)))
            .finish()
    }
}

impl Serialize for OutputParams {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

impl<'de> Deserialize<'de> for OutputParams {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let partial = BaseParams::deserialize(deserializer)?;
        Ok(map_undefined_params_to_default(&partial))
    }
}
