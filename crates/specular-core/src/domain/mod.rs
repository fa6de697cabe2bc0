pub mod errors;

pub use errors::{EvaluateError, SetupError, SpecularError, SpecularResult};

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Execution strategy for one full evaluation over all contrasts.
///
/// Resolved once from its configuration string when the experiment is set up;
/// the hot evaluation loop only ever matches on the enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CalcStrategy {
    #[default]
    Sequential,
    PointsParallel,
    ContrastsParallel,
}

impl CalcStrategy {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::PointsParallel => "points",
            Self::ContrastsParallel => "contrasts",
        }
    }

    /// Case-insensitive resolution of a configuration string.
    ///
    /// Unrecognized labels keep the historical fall-back to sequential
    /// execution, but the fall-back is surfaced through a warning instead of
    /// passing silently.
    pub fn resolve(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "" | "sequential" | "serial" | "single" => Self::Sequential,
            "points" | "points-parallel" | "parallel points" => Self::PointsParallel,
            "contrasts" | "contrasts-parallel" | "parallel contrasts" => Self::ContrastsParallel,
            other => {
                tracing::warn!(
                    strategy = other,
                    "unrecognized parallel strategy, falling back to sequential"
                );
                Self::Sequential
            }
        }
    }
}

impl Display for CalcStrategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

impl From<String> for CalcStrategy {
    fn from(label: String) -> Self {
        Self::resolve(&label)
    }
}

impl From<CalcStrategy> for String {
    fn from(strategy: CalcStrategy) -> Self {
        strategy.as_str().to_string()
    }
}

/// Sample orientation convention for one contrast.
///
/// `MediumToSubstrate` lists layers from the incident medium down to the
/// substrate; `SubstrateToMedium` is its mirror, used when the beam enters
/// through the substrate side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Orientation {
    #[default]
    MediumToSubstrate,
    SubstrateToMedium,
}

impl Orientation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MediumToSubstrate => "medium/substrate",
            Self::SubstrateToMedium => "substrate/medium",
        }
    }

    pub fn resolve(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "" | "medium/substrate" | "air/substrate" => Self::MediumToSubstrate,
            "substrate/medium" | "substrate/liquid" | "mirrored" => Self::SubstrateToMedium,
            other => {
                tracing::warn!(
                    orientation = other,
                    "unrecognized orientation, falling back to medium/substrate"
                );
                Self::MediumToSubstrate
            }
        }
    }
}

impl Display for Orientation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

impl From<String> for Orientation {
    fn from(label: String) -> Self {
        Self::resolve(&label)
    }
}

impl From<Orientation> for String {
    fn from(orientation: Orientation) -> Self {
        orientation.as_str().to_string()
    }
}

/// How a contrast's background level enters the comparison between the
/// simulated curve and its measured data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BackgroundMode {
    /// Constant level added to the scaled simulation.
    #[default]
    Additive,
    /// Constant level removed from the measured intensity before comparison.
    Subtractive,
    /// Per-point background profile supplied with the contrast data, added to
    /// the scaled simulation; falls back to the constant level where absent.
    FunctionOfQ,
}

impl BackgroundMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Additive => "additive",
            Self::Subtractive => "subtractive",
            Self::FunctionOfQ => "function-of-q",
        }
    }

    pub fn resolve(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "" | "additive" | "constant" | "add" => Self::Additive,
            "subtractive" | "subtract" | "data" => Self::Subtractive,
            "function-of-q" | "function" | "q-dependent" => Self::FunctionOfQ,
            other => {
                tracing::warn!(
                    background = other,
                    "unrecognized background mode, falling back to additive"
                );
                Self::Additive
            }
        }
    }
}

impl Display for BackgroundMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

impl From<String> for BackgroundMode {
    fn from(label: String) -> Self {
        Self::resolve(&label)
    }
}

impl From<BackgroundMode> for String {
    fn from(mode: BackgroundMode) -> Self {
        mode.as_str().to_string()
    }
}
