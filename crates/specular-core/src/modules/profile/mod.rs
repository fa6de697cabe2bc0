//! Continuous SLD-versus-depth profiles for reporting and plotting.
//!
//! Each interface contributes an error-function step broadened by its
//! roughness, matching the Gaussian interface convention the Debye-Waller
//! damping in the forward model assumes.

use crate::modules::stack::AssembledStack;
use crate::numerics::erf;

/// Grid spacing used when the calculation controls do not set one, in the
/// same depth unit as layer thicknesses.
pub const DEFAULT_PROFILE_STEP: f64 = 0.5;

/// Sharp interfaces are widened to this sigma so the erf argument stays
/// finite on the grid.
const MIN_INTERFACE_SIGMA: f64 = 1.0e-8;

const SQRT_2: f64 = std::f64::consts::SQRT_2;

/// Real SLD sampled on a uniform depth grid; depth zero is the bulk-in
/// interface, positive depth runs into the stack.
#[derive(Debug, Clone, PartialEq)]
pub struct SldProfile {
    pub depth: Vec<f64>,
    pub sld: Vec<f64>,
}

pub fn sld_profile(stack: &AssembledStack, step: f64) -> SldProfile {
    let step = if step > 0.0 { step } else { DEFAULT_PROFILE_STEP };

    let sigmas = stack.interface_roughness();
    let max_sigma = sigmas.iter().copied().fold(0.0_f64, f64::max);
    let margin = (4.0 * max_sigma).max(10.0);

    // Interface depths: cumulative thickness, starting at the bulk-in face.
    let mut interface_depths = Vec::with_capacity(stack.rows.len() + 1);
    let mut depth = 0.0;
    interface_depths.push(depth);
    for row in &stack.rows {
        depth += row.thickness;
        interface_depths.push(depth);
    }
    let total_thickness = depth;

    // Real SLD of the medium below each interface.
    let below: Vec<f64> = stack
        .rows
        .iter()
        .map(|row| row.sld.re)
        .chain(std::iter::once(stack.bulk_out.re))
        .collect();

    let start = -margin;
    let end = total_thickness + margin;
    let points = ((end - start) / step).ceil() as usize + 1;

    let mut profile = SldProfile {
        depth: Vec::with_capacity(points),
        sld: Vec::with_capacity(points),
    };
    for index in 0..points {
        let z = start + index as f64 * step;
        let mut value = stack.bulk_in.re;
        let mut above = stack.bulk_in.re;
        for ((&interface_z, &sigma), &lower) in
            interface_depths.iter().zip(&sigmas).zip(&below)
        {
            let width = sigma.max(MIN_INTERFACE_SIGMA) * SQRT_2;
            value += (lower - above) * 0.5 * (1.0 + erf((z - interface_z) / width));
            above = lower;
        }
        profile.depth.push(z);
        profile.sld.push(value);
    }
    profile
}
