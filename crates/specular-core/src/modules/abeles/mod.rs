//! Abeles transfer-matrix forward model.
//!
//! One call per contrast; the 2x2 complex recursion over interfaces is the
//! single performance-critical inner loop of the whole engine, so it stays
//! allocation-free per q point and routes every complex quotient through the
//! stable branch-selecting divide.

use crate::modules::stack::AssembledStack;
use crate::numerics::stable_div;
use num_complex::Complex64;

/// Nudge applied to the bulk-in SLD imaginary part so an exact-zero
/// absorption term cannot produce NaNs in downstream divisions.
const ABSORPTION_EPSILON: f64 = 1.0e-30;

const FOUR_PI: f64 = 4.0 * std::f64::consts::PI;

/// Gaussian resolution kernels are truncated at this many standard
/// deviations on either side.
const RESOLUTION_SIGMA_CUTOFF: f64 = 3.5;

/// FWHM to standard deviation for a Gaussian, 1 / (2 sqrt(2 ln 2)).
const FWHM_TO_SIGMA: f64 = 0.424660900144009521;

/// Predicted reflected intensity at each momentum-transfer sample.
pub fn reflectivity(q: &[f64], stack: &AssembledStack) -> Vec<f64> {
    let mut out = vec![0.0; q.len()];
    reflectivity_into(q, stack, &mut out);
    out
}

/// Same as [`reflectivity`], writing into a caller-owned slice.
///
/// The points-parallel dispatch strategy hands each worker a disjoint output
/// slice, so this is the seam the fan-out runs through.
pub fn reflectivity_into(q: &[f64], stack: &AssembledStack, out: &mut [f64]) {
    debug_assert_eq!(q.len(), out.len());

    let bulk_in = Complex64::new(stack.bulk_in.re, stack.bulk_in.im + ABSORPTION_EPSILON);

    // SLD contrast of every medium below an interface, relative to bulk-in.
    let sld_steps: Vec<Complex64> = stack
        .rows
        .iter()
        .map(|row| row.sld - bulk_in)
        .chain(std::iter::once(stack.bulk_out - bulk_in))
        .collect();
    let sigmas = stack.interface_roughness();
    let thicknesses: Vec<f64> = stack.rows.iter().map(|row| row.thickness).collect();

    for (&qi, slot) in q.iter().zip(out.iter_mut()) {
        *slot = reflect_one(qi, &sld_steps, &sigmas, &thicknesses);
    }
}

fn reflect_one(q: f64, sld_steps: &[Complex64], sigmas: &[f64], thicknesses: &[f64]) -> f64 {
    let k0 = Complex64::new(0.5 * q, 0.0);
    let k0_sq = k0 * k0;

    let mut k_top = k0;
    let mut m00 = Complex64::new(1.0, 0.0);
    let mut m01 = Complex64::new(0.0, 0.0);
    let mut m10 = Complex64::new(0.0, 0.0);
    let mut m11 = Complex64::new(1.0, 0.0);

    for (interface, &step) in sld_steps.iter().enumerate() {
        let k_bot = (k0_sq - FOUR_PI * step).sqrt();

        let sigma = sigmas[interface];
        let damping = (-2.0 * k_top * k_bot * (sigma * sigma)).exp();
        let fresnel = stable_div(k_top - k_bot, k_top + k_bot) * damping;

        // Phase accumulated crossing the layer above this interface; the
        // bulk-in medium carries none.
        let (phase, phase_inv) = if interface == 0 {
            (Complex64::new(1.0, 0.0), Complex64::new(1.0, 0.0))
        } else {
            let beta = Complex64::i() * k_top * thicknesses[interface - 1];
            (beta.exp(), (-beta).exp())
        };

        let l00 = phase;
        let l01 = fresnel * phase;
        let l10 = fresnel * phase_inv;
        let l11 = phase_inv;

        let n00 = m00 * l00 + m01 * l10;
        let n01 = m00 * l01 + m01 * l11;
        let n10 = m10 * l00 + m11 * l10;
        let n11 = m10 * l01 + m11 * l11;
        m00 = n00;
        m01 = n01;
        m10 = n10;
        m11 = n11;

        k_top = k_bot;
    }

    stable_div(m01, m00).norm_sqr()
}

/// Gaussian q-resolution smearing of a simulated curve on its own grid.
///
/// `resolution` is the fractional FWHM width dq/q; zero or negative widths
/// return the curve untouched. Weights are renormalized over the truncated
/// window, so a constant curve smears to itself even at the grid edges.
pub fn smear_gaussian(q: &[f64], reflectivity: &[f64], resolution: f64) -> Vec<f64> {
    debug_assert_eq!(q.len(), reflectivity.len());
    if resolution <= 0.0 || q.len() < 2 {
        return reflectivity.to_vec();
    }

    let mut smeared = Vec::with_capacity(q.len());
    for (index, &center) in q.iter().enumerate() {
        let sigma = resolution * center.abs() * FWHM_TO_SIGMA;
        if sigma <= 0.0 {
            smeared.push(reflectivity[index]);
            continue;
        }

        let window = RESOLUTION_SIGMA_CUTOFF * sigma;
        let mut weight_sum = 0.0;
        let mut value_sum = 0.0;
        for (&sample, &value) in q.iter().zip(reflectivity) {
            let offset = sample - center;
            if offset.abs() > window {
                continue;
            }
            let weight = (-0.5 * (offset / sigma).powi(2)).exp();
            weight_sum += weight;
            value_sum += weight * value;
        }
        smeared.push(value_sum / weight_sum);
    }
    smeared
}
