//! Objective-function adapters: the only surface search drivers see.
//!
//! Every driver hands the engine a candidate vector for the fitted slots and
//! gets a scalar back. The shared [`Evaluator`] does the actual work; the
//! per-driver adapters are deliberately thin.

pub mod bounds;

use crate::domain::SpecularResult;
use crate::modules::dispatch::{evaluate_all, CalculationControls, Evaluation};
use crate::modules::params::{FittedMetadata, ParameterSet};
use crate::modules::stack::{Contrast, LayerSpec};

/// Owns the immutable experiment description and the mutable parameter set
/// for the duration of one optimization run.
#[derive(Debug, Clone)]
pub struct Evaluator {
    catalog: Vec<LayerSpec>,
    contrasts: Vec<Contrast>,
    params: ParameterSet,
    controls: CalculationControls,
    fitted_metadata: FittedMetadata,
    last: Option<Evaluation>,
}

impl Evaluator {
    pub fn new(
        catalog: Vec<LayerSpec>,
        contrasts: Vec<Contrast>,
        mut params: ParameterSet,
        controls: CalculationControls,
    ) -> Self {
        let fitted_metadata = params.pack();
        Self {
            catalog,
            contrasts,
            params,
            controls,
            fitted_metadata,
            last: None,
        }
    }

    /// Total chi-squared for one candidate vector.
    ///
    /// The full evaluation is retained so a caller wanting curves or profiles
    /// for the last-evaluated point does not pay for a second run.
    pub fn evaluate(&mut self, candidate: &[f64]) -> SpecularResult<f64> {
        self.params.set_fitted(candidate)?;
        self.params.unpack();

        let evaluation = evaluate_all(&self.catalog, &self.contrasts, &self.params, &self.controls);
        let total = evaluation.total_chi_squared;
        self.last = Some(evaluation);
        Ok(total)
    }

    /// `-chi^2 / 2`, the Gaussian log-likelihood the sampling drivers expect.
    pub fn log_likelihood(&mut self, candidate: &[f64]) -> SpecularResult<f64> {
        Ok(-0.5 * self.evaluate(candidate)?)
    }

    /// Re-run the current fitted vector, refreshing the retained evaluation.
    pub fn evaluate_current(&mut self) -> SpecularResult<f64> {
        let current = self.params.fitted().to_vec();
        self.evaluate(&current)
    }

    pub fn last_evaluation(&self) -> Option<&Evaluation> {
        self.last.as_ref()
    }

    pub fn take_last_evaluation(&mut self) -> Option<Evaluation> {
        self.last.take()
    }

    pub fn fitted_values(&self) -> &[f64] {
        self.params.fitted()
    }

    pub fn fitted_limits(&self) -> &[(f64, f64)] {
        &self.fitted_metadata.limits
    }

    pub fn fitted_names(&self) -> &[String] {
        &self.fitted_metadata.names
    }

    pub fn controls(&self) -> &CalculationControls {
        &self.controls
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }
}

/// Candidate-to-scalar contract shared by all search drivers.
pub trait SearchObjective {
    fn objective(&mut self, candidate: &[f64]) -> SpecularResult<f64>;
}

/// Local simplex search minimizes chi-squared directly.
#[derive(Debug)]
pub struct SimplexObjective<'a>(pub &'a mut Evaluator);

impl SearchObjective for SimplexObjective<'_> {
    fn objective(&mut self, candidate: &[f64]) -> SpecularResult<f64> {
        self.0.evaluate(candidate)
    }
}

/// Differential evolution minimizes chi-squared directly.
#[derive(Debug)]
pub struct DifferentialEvolutionObjective<'a>(pub &'a mut Evaluator);

impl SearchObjective for DifferentialEvolutionObjective<'_> {
    fn objective(&mut self, candidate: &[f64]) -> SpecularResult<f64> {
        self.0.evaluate(candidate)
    }
}

/// Population MCMC samples the Gaussian log-likelihood.
#[derive(Debug)]
pub struct PopulationMcmcObjective<'a>(pub &'a mut Evaluator);

impl SearchObjective for PopulationMcmcObjective<'_> {
    fn objective(&mut self, candidate: &[f64]) -> SpecularResult<f64> {
        self.0.log_likelihood(candidate)
    }
}

/// Nested sampling samples the Gaussian log-likelihood.
#[derive(Debug)]
pub struct NestedSamplerObjective<'a>(pub &'a mut Evaluator);

impl SearchObjective for NestedSamplerObjective<'_> {
    fn objective(&mut self, candidate: &[f64]) -> SpecularResult<f64> {
        self.0.log_likelihood(candidate)
    }
}
