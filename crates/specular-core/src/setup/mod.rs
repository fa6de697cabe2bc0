//! Experiment setup records: the seam between external configuration loading
//! and the engine types.
//!
//! The engine structs carry serde derives directly, so a setup is one JSON
//! document with no intermediate copy-structs; `validate` performs the
//! structural checks the evaluation hot path then assumes.

use crate::domain::{SetupError, SpecularResult};
use crate::modules::dispatch::CalculationControls;
use crate::modules::objective::Evaluator;
use crate::modules::params::ParameterSet;
use crate::modules::stack::{Contrast, LayerSpec};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExperimentSetup {
    #[serde(default)]
    pub layers: Vec<LayerSpec>,
    #[serde(default)]
    pub contrasts: Vec<Contrast>,
    #[serde(default)]
    pub parameters: ParameterSet,
    #[serde(default)]
    pub controls: CalculationControls,
}

impl ExperimentSetup {
    pub fn from_json_str(source: &str) -> Result<Self, SetupError> {
        serde_json::from_str(source).map_err(|error| SetupError::Parse(error.to_string()))
    }

    pub fn to_json_string(&self) -> Result<String, SetupError> {
        serde_json::to_string_pretty(self).map_err(|error| SetupError::Parse(error.to_string()))
    }

    /// Structural checks performed once, before any evaluation.
    pub fn validate(&self) -> Result<(), SetupError> {
        self.parameters.validate()?;
        for layer in &self.layers {
            layer.validate(self.parameters.layers.len())?;
        }
        for contrast in &self.contrasts {
            contrast.validate(self.layers.len(), &self.parameters)?;
        }
        Ok(())
    }

    pub fn into_evaluator(self) -> SpecularResult<Evaluator> {
        self.validate()?;
        Ok(Evaluator::new(
            self.layers,
            self.contrasts,
            self.parameters,
            self.controls,
        ))
    }
}
