//! Parallel dispatch and aggregation over contrasts.
//!
//! One evaluation runs the assembler and forward model for every contrast
//! under one of three interchangeable strategies. Workers only ever read the
//! shared catalog, contrasts and parameter set, and write disjoint output
//! regions, so the strategies are numerically equivalent by construction;
//! the per-contrast chi-squared sum is commutative.

use crate::domain::{BackgroundMode, CalcStrategy};
use crate::modules::abeles::{reflectivity, reflectivity_into, smear_gaussian};
use crate::modules::params::ParameterSet;
use crate::modules::profile::{sld_profile, SldProfile, DEFAULT_PROFILE_STEP};
use crate::modules::stack::{assemble, AssembledStack, Contrast, LayerSpec};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// q grid used when a contrast carries no measured data.
const DEFAULT_SIM_POINTS: usize = 500;
const DEFAULT_SIM_RANGE: (f64, f64) = (0.005, 0.7);

/// Slice size handed to each points-parallel worker.
const POINTS_CHUNK: usize = 64;

/// Run-wide calculation options, resolved once at setup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculationControls {
    pub strategy: CalcStrategy,
    /// Compute SLD depth profiles on every evaluation rather than only for
    /// the final reported point.
    pub compute_sld_profile: bool,
    pub profile_step: f64,
}

impl Default for CalculationControls {
    fn default() -> Self {
        Self {
            strategy: CalcStrategy::Sequential,
            compute_sld_profile: false,
            profile_step: DEFAULT_PROFILE_STEP,
        }
    }
}

/// Simulation byproducts for one contrast.
#[derive(Debug, Clone, PartialEq)]
pub struct ContrastResult {
    pub name: String,
    /// Weighted sum of squared residuals, or `None` when the contrast has no
    /// measured data to compare against.
    pub chi_squared: Option<f64>,
    pub simulated_q: Vec<f64>,
    pub simulated: Vec<f64>,
    pub shifted_q: Vec<f64>,
    pub shifted_intensity: Vec<f64>,
    pub shifted_uncertainty: Vec<f64>,
    pub sld_profile: Option<SldProfile>,
    pub resolved_layers: AssembledStack,
}

/// One full forward-model evaluation. Created fresh per call; ownership
/// transfers to the objective adapter that requested it.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub contrasts: Vec<ContrastResult>,
    pub total_chi_squared: f64,
}

/// Evaluate every contrast under the configured strategy and aggregate.
pub fn evaluate_all(
    catalog: &[LayerSpec],
    contrasts: &[Contrast],
    params: &ParameterSet,
    controls: &CalculationControls,
) -> Evaluation {
    tracing::debug!(
        strategy = %controls.strategy,
        contrasts = contrasts.len(),
        "running forward model"
    );

    let results: Vec<ContrastResult> = match controls.strategy {
        CalcStrategy::Sequential => contrasts
            .iter()
            .map(|contrast| evaluate_contrast(catalog, contrast, params, controls, false))
            .collect(),
        CalcStrategy::PointsParallel => contrasts
            .iter()
            .map(|contrast| evaluate_contrast(catalog, contrast, params, controls, true))
            .collect(),
        CalcStrategy::ContrastsParallel => contrasts
            .par_iter()
            .map(|contrast| evaluate_contrast(catalog, contrast, params, controls, false))
            .collect(),
    };

    let total_chi_squared = results.iter().filter_map(|result| result.chi_squared).sum();
    Evaluation {
        contrasts: results,
        total_chi_squared,
    }
}

fn evaluate_contrast(
    catalog: &[LayerSpec],
    contrast: &Contrast,
    params: &ParameterSet,
    controls: &CalculationControls,
    points_parallel: bool,
) -> ContrastResult {
    let stack = assemble(catalog, contrast, params);
    let scale = params.scale_factors.values[contrast.scale];
    let background = params.backgrounds.values[contrast.background];
    let q_shift = params.q_shifts.values[contrast.q_shift];
    let resolution = params.resolutions.values[contrast.resolution];

    let profile = controls
        .compute_sld_profile
        .then(|| sld_profile(&stack, controls.profile_step));

    match &contrast.data {
        Some(data) => {
            let (lower, upper) = data.sim_limits;
            let mut shifted_q = Vec::with_capacity(data.q.len());
            let mut shifted_intensity = Vec::with_capacity(data.q.len());
            let mut shifted_uncertainty = Vec::with_capacity(data.q.len());
            let mut point_background = Vec::with_capacity(data.q.len());
            for (row, &q) in data.q.iter().enumerate() {
                let q = q + q_shift;
                if q < lower || q > upper {
                    continue;
                }
                shifted_q.push(q);
                shifted_intensity.push(data.intensity[row] / scale);
                shifted_uncertainty.push(data.uncertainty[row] / scale);
                point_background.push(
                    data.background_profile
                        .as_ref()
                        .map_or(background, |profile| profile[row]),
                );
            }

            let raw = reflect_points(&shifted_q, &stack, points_parallel);
            let mut simulated = smear_gaussian(&shifted_q, &raw, resolution);
            match contrast.background_mode {
                BackgroundMode::Additive => {
                    for value in &mut simulated {
                        *value += background;
                    }
                }
                BackgroundMode::Subtractive => {
                    for value in &mut shifted_intensity {
                        *value -= background;
                    }
                }
                BackgroundMode::FunctionOfQ => {
                    for (value, &level) in simulated.iter_mut().zip(&point_background) {
                        *value += level;
                    }
                }
            }

            let chi_squared = shifted_q
                .iter()
                .enumerate()
                .map(|(index, _)| {
                    let residual =
                        (simulated[index] - shifted_intensity[index]) / shifted_uncertainty[index];
                    residual * residual
                })
                .sum();

            ContrastResult {
                name: contrast.name.clone(),
                chi_squared: Some(chi_squared),
                simulated_q: shifted_q.clone(),
                simulated,
                shifted_q,
                shifted_intensity,
                shifted_uncertainty,
                sld_profile: profile,
                resolved_layers: stack,
            }
        }
        None => {
            let simulated_q = linspace(DEFAULT_SIM_RANGE.0, DEFAULT_SIM_RANGE.1, DEFAULT_SIM_POINTS);
            let raw = reflect_points(&simulated_q, &stack, points_parallel);
            let mut simulated = smear_gaussian(&simulated_q, &raw, resolution);
            if !matches!(contrast.background_mode, BackgroundMode::Subtractive) {
                for value in &mut simulated {
                    *value += background;
                }
            }

            ContrastResult {
                name: contrast.name.clone(),
                chi_squared: None,
                simulated_q,
                simulated,
                shifted_q: Vec::new(),
                shifted_intensity: Vec::new(),
                shifted_uncertainty: Vec::new(),
                sld_profile: profile,
                resolved_layers: stack,
            }
        }
    }
}

fn reflect_points(q: &[f64], stack: &AssembledStack, points_parallel: bool) -> Vec<f64> {
    if !points_parallel || q.len() <= POINTS_CHUNK {
        return reflectivity(q, stack);
    }

    let mut out = vec![0.0; q.len()];
    out.par_chunks_mut(POINTS_CHUNK)
        .zip(q.par_chunks(POINTS_CHUNK))
        .for_each(|(slice, samples)| reflectivity_into(samples, stack, slice));
    out
}

fn linspace(start: f64, end: f64, points: usize) -> Vec<f64> {
    if points < 2 {
        return vec![start];
    }
    let step = (end - start) / (points - 1) as f64;
    (0..points).map(|index| start + index as f64 * step).collect()
}
