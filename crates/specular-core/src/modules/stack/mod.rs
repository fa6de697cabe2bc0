//! Layer assembler: from catalog orderings to per-contrast physical stacks.
//!
//! Catalog layers are immutable and reference slots in the layer parameter
//! group rather than owning numbers, so every evaluation resolves a fresh
//! stack from the current unpacked parameter values. A contrast owns only an
//! ordering over the catalog plus its orientation.

use crate::domain::{BackgroundMode, Orientation, SetupError};
use crate::modules::params::{GroupKind, ParameterSet};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Which bounding medium a partially covered layer blends toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoveragePhase {
    BulkIn,
    BulkOut,
}

/// Fractional surface coverage of a layer, as a slot in the layer parameter
/// group holding a percentage in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoverageSpec {
    pub percent: usize,
    pub phase: CoveragePhase,
}

/// One immutable catalog entry. All numeric fields are slot indices into the
/// layer parameter group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub name: String,
    pub thickness: usize,
    pub sld_real: usize,
    #[serde(default)]
    pub sld_imag: Option<usize>,
    pub roughness: usize,
    #[serde(default)]
    pub coverage: Option<CoverageSpec>,
}

impl LayerSpec {
    pub fn validate(&self, layer_group_len: usize) -> Result<(), SetupError> {
        let mut slots = vec![self.thickness, self.sld_real, self.roughness];
        if let Some(imag) = self.sld_imag {
            slots.push(imag);
        }
        if let Some(coverage) = self.coverage {
            slots.push(coverage.percent);
        }
        for index in slots {
            if index >= layer_group_len {
                return Err(SetupError::LayerSlotOutOfRange {
                    layer: self.name.clone(),
                    group: GroupKind::Layers.as_str(),
                    index,
                    len: layer_group_len,
                });
            }
        }
        Ok(())
    }
}

/// Measured (q, intensity, uncertainty) triples plus the simulation range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContrastData {
    pub q: Vec<f64>,
    pub intensity: Vec<f64>,
    pub uncertainty: Vec<f64>,
    #[serde(default)]
    pub background_profile: Option<Vec<f64>>,
    pub sim_limits: (f64, f64),
}

/// One measurement configuration. Slot fields index the per-group parameter
/// vectors; `layer_order` indexes the layer catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contrast {
    pub name: String,
    pub layer_order: Vec<usize>,
    #[serde(default)]
    pub orientation: Orientation,
    pub background: usize,
    #[serde(default)]
    pub background_mode: BackgroundMode,
    pub scale: usize,
    pub q_shift: usize,
    pub bulk_in: usize,
    pub bulk_out: usize,
    pub resolution: usize,
    /// Slot in the layer parameter group holding the substrate roughness.
    pub substrate_roughness: usize,
    #[serde(default)]
    pub data: Option<ContrastData>,
}

impl Contrast {
    pub fn validate(&self, catalog_len: usize, params: &ParameterSet) -> Result<(), SetupError> {
        for &index in &self.layer_order {
            if index >= catalog_len {
                return Err(SetupError::LayerIndexOutOfRange {
                    contrast: self.name.clone(),
                    index,
                    catalog: catalog_len,
                });
            }
        }

        let slots = [
            (GroupKind::Backgrounds, self.background, params.backgrounds.len()),
            (GroupKind::ScaleFactors, self.scale, params.scale_factors.len()),
            (GroupKind::QShifts, self.q_shift, params.q_shifts.len()),
            (GroupKind::BulkIn, self.bulk_in, params.bulk_in.len()),
            (GroupKind::BulkOut, self.bulk_out, params.bulk_out.len()),
            (GroupKind::Resolutions, self.resolution, params.resolutions.len()),
            (GroupKind::Layers, self.substrate_roughness, params.layers.len()),
        ];
        for (kind, index, len) in slots {
            if index >= len {
                return Err(SetupError::ContrastSlotOutOfRange {
                    contrast: self.name.clone(),
                    group: kind.as_str(),
                    index,
                    len,
                });
            }
        }

        if let Some(data) = &self.data {
            if data.q.len() != data.intensity.len() || data.q.len() != data.uncertainty.len() {
                return Err(SetupError::RaggedData {
                    contrast: self.name.clone(),
                    q: data.q.len(),
                    intensity: data.intensity.len(),
                    uncertainty: data.uncertainty.len(),
                });
            }
            for (row, &sigma) in data.uncertainty.iter().enumerate() {
                if sigma <= 0.0 {
                    return Err(SetupError::NonPositiveUncertainty {
                        contrast: self.name.clone(),
                        row,
                        value: sigma,
                    });
                }
            }
            if let Some(profile) = &data.background_profile {
                if profile.len() != data.q.len() {
                    return Err(SetupError::BackgroundProfileMismatch {
                        contrast: self.name.clone(),
                        profile: profile.len(),
                        points: data.q.len(),
                    });
                }
            }
            let (lower, upper) = data.sim_limits;
            if lower >= upper {
                return Err(SetupError::EmptySimulationRange {
                    contrast: self.name.clone(),
                    lower,
                    upper,
                });
            }
        }

        Ok(())
    }
}

/// One resolved slab row. `roughness` is the layer's declared value; the
/// interface assignment happens in [`AssembledStack::interface_roughness`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StackRow {
    pub thickness: f64,
    pub sld: Complex64,
    pub roughness: f64,
}

impl StackRow {
    pub const fn zeroed() -> Self {
        Self {
            thickness: 0.0,
            sld: Complex64::new(0.0, 0.0),
            roughness: 0.0,
        }
    }
}

/// Resolved physical stack for one contrast and one evaluation.
///
/// Owned by the evaluation that created it; never shared across contrasts.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledStack {
    pub rows: Vec<StackRow>,
    pub substrate_roughness: f64,
    pub bulk_in: Complex64,
    pub bulk_out: Complex64,
}

impl AssembledStack {
    /// Per-interface roughness, right-shifted by one position relative to the
    /// layer rows: the substrate roughness damps the bulk-in interface and
    /// each row's roughness damps the interface below that row. Length is
    /// `rows + 1`, one value per interface.
    pub fn interface_roughness(&self) -> Vec<f64> {
        std::iter::once(self.substrate_roughness)
            .chain(self.rows.iter().map(|row| row.roughness))
            .collect()
    }
}

/// Resolve a contrast's ordered stack from the current parameter values.
///
/// Preconditions (catalog indices and parameter slots in range) are checked at
/// setup, not here; a degenerate ordering yields a single zeroed row.
pub fn assemble(catalog: &[LayerSpec], contrast: &Contrast, params: &ParameterSet) -> AssembledStack {
    let layer_values = &params.layers.values;
    let bulk_in = Complex64::new(params.bulk_in.values[contrast.bulk_in], 0.0);
    let bulk_out = Complex64::new(params.bulk_out.values[contrast.bulk_out], 0.0);
    let input_substrate_roughness = layer_values[contrast.substrate_roughness];

    let mut rows: Vec<StackRow> = contrast
        .layer_order
        .iter()
        .map(|&index| {
            let spec = &catalog[index];
            let mut sld = Complex64::new(
                layer_values[spec.sld_real],
                spec.sld_imag.map_or(0.0, |slot| layer_values[slot]),
            );
            if let Some(coverage) = spec.coverage {
                let fraction = (layer_values[coverage.percent]).clamp(0.0, 100.0) / 100.0;
                let target = match coverage.phase {
                    CoveragePhase::BulkIn => bulk_in,
                    CoveragePhase::BulkOut => bulk_out,
                };
                sld += (target - sld) * fraction;
            }
            StackRow {
                thickness: layer_values[spec.thickness],
                sld,
                roughness: layer_values[spec.roughness],
            }
        })
        .collect();

    let substrate_roughness = match contrast.orientation {
        Orientation::MediumToSubstrate => input_substrate_roughness,
        Orientation::SubstrateToMedium => {
            // The last declared roughness takes over the substrate interface;
            // the remaining values shift one row so each still damps the
            // interface below its layer, and the input substrate roughness
            // moves to the bulk-out interface.
            let promoted = rows
                .last()
                .map_or(input_substrate_roughness, |row| row.roughness);
            rows.reverse();
            let count = rows.len();
            for index in 0..count.saturating_sub(1) {
                rows[index].roughness = rows[index + 1].roughness;
            }
            if let Some(last) = rows.last_mut() {
                last.roughness = input_substrate_roughness;
            }
            promoted
        }
    };

    if rows.is_empty() {
        rows.push(StackRow::zeroed());
    }

    AssembledStack {
        rows,
        substrate_roughness,
        bulk_in,
        bulk_out,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        assemble, Contrast, CoveragePhase, CoverageSpec, LayerSpec, StackRow,
    };
    use crate::domain::{BackgroundMode, Orientation, SetupError};
    use crate::modules::params::{ParameterGroup, ParameterSet};
    use num_complex::Complex64;

    fn layer_group(values: &[f64]) -> ParameterGroup {
        ParameterGroup {
            names: (0..values.len()).map(|index| format!("layer slot {index}")).collect(),
            values: values.to_vec(),
            fitted: vec![false; values.len()],
            limits: vec![(f64::NEG_INFINITY, f64::INFINITY); values.len()],
        }
    }

    fn scalar_group(name: &str, value: f64) -> ParameterGroup {
        ParameterGroup {
            names: vec![name.to_string()],
            values: vec![value],
            fitted: vec![false],
            limits: vec![(f64::NEG_INFINITY, f64::INFINITY)],
        }
    }

    fn sample_params() -> ParameterSet {
        let mut params = ParameterSet::default();
        // slots: 0 substrate rough, then (thick, sld, rough) pairs and a
        // trailing coverage percentage.
        params.layers = layer_group(&[3.0, 10.0, 2.0e-6, 4.0, 50.0, 4.0e-6, 5.0, 25.0]);
        params.backgrounds = scalar_group("background", 1.0e-6);
        params.scale_factors = scalar_group("scale", 1.0);
        params.q_shifts = scalar_group("q shift", 0.0);
        params.bulk_in = scalar_group("air", 0.0);
        params.bulk_out = scalar_group("d2o", 6.0e-6);
        params.resolutions = scalar_group("resolution", 0.03);
        params
    }

    fn sample_catalog() -> Vec<LayerSpec> {
        vec![
            LayerSpec {
                name: "first".to_string(),
                thickness: 1,
                sld_real: 2,
                sld_imag: None,
                roughness: 3,
                coverage: None,
            },
            LayerSpec {
                name: "second".to_string(),
                thickness: 4,
                sld_real: 5,
                sld_imag: None,
                roughness: 6,
                coverage: None,
            },
        ]
    }

    fn sample_contrast(orientation: Orientation) -> Contrast {
        Contrast {
            name: "plain".to_string(),
            layer_order: vec![0, 1],
            orientation,
            background: 0,
            background_mode: BackgroundMode::Additive,
            scale: 0,
            q_shift: 0,
            bulk_in: 0,
            bulk_out: 0,
            resolution: 0,
            substrate_roughness: 0,
            data: None,
        }
    }

    #[test]
    fn standard_orientation_keeps_declared_order_and_input_substrate_roughness() {
        let params = sample_params();
        let stack = assemble(
            &sample_catalog(),
            &sample_contrast(Orientation::MediumToSubstrate),
            &params,
        );

        assert_eq!(stack.rows.len(), 2);
        assert_eq!(stack.rows[0].thickness, 10.0);
        assert_eq!(stack.rows[1].thickness, 50.0);
        assert_eq!(stack.substrate_roughness, 3.0);
        assert_eq!(stack.interface_roughness(), vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn mirrored_orientation_promotes_last_roughness_and_shifts_the_rest() {
        let params = sample_params();
        let stack = assemble(
            &sample_catalog(),
            &sample_contrast(Orientation::SubstrateToMedium),
            &params,
        );

        // Reversed rows: second layer first.
        assert_eq!(stack.rows[0].thickness, 50.0);
        assert_eq!(stack.rows[1].thickness, 10.0);
        // Last declared roughness becomes the substrate roughness; the input
        // substrate roughness lands on the bulk-out interface.
        assert_eq!(stack.substrate_roughness, 5.0);
        assert_eq!(stack.interface_roughness(), vec![5.0, 4.0, 3.0]);
    }

    #[test]
    fn coverage_blends_sld_toward_the_chosen_bulk() {
        let params = sample_params();
        let mut catalog = sample_catalog();
        catalog[0].coverage = Some(CoverageSpec {
            percent: 7, // slot holding 25.0
            phase: CoveragePhase::BulkOut,
        });

        let stack = assemble(
            &catalog,
            &sample_contrast(Orientation::MediumToSubstrate),
            &params,
        );

        let expected = 2.0e-6 + (6.0e-6 - 2.0e-6) * 0.25;
        assert!((stack.rows[0].sld.re - expected).abs() < 1.0e-18);
        assert_eq!(stack.rows[0].sld.im, 0.0);
        // The uncovered layer is untouched.
        assert_eq!(stack.rows[1].sld, Complex64::new(4.0e-6, 0.0));
    }

    #[test]
    fn empty_ordering_yields_a_single_zeroed_placeholder_row() {
        let params = sample_params();
        let mut contrast = sample_contrast(Orientation::MediumToSubstrate);
        contrast.layer_order.clear();

        let stack = assemble(&sample_catalog(), &contrast, &params);

        assert_eq!(stack.rows, vec![StackRow::zeroed()]);
        assert_eq!(stack.substrate_roughness, 3.0);
    }

    #[test]
    fn contrast_validation_rejects_out_of_range_layer_indices() {
        let params = sample_params();
        let mut contrast = sample_contrast(Orientation::MediumToSubstrate);
        contrast.layer_order.push(9);

        let error = contrast.validate(2, &params).expect_err("bad index");
        assert_eq!(
            error,
            SetupError::LayerIndexOutOfRange {
                contrast: "plain".to_string(),
                index: 9,
                catalog: 2,
            }
        );
    }

    #[test]
    fn layer_validation_rejects_out_of_range_slots() {
        let spec = LayerSpec {
            name: "broken".to_string(),
            thickness: 42,
            sld_real: 0,
            sld_imag: None,
            roughness: 0,
            coverage: None,
        };

        let error = spec.validate(8).expect_err("bad slot");
        assert!(matches!(
            error,
            SetupError::LayerSlotOutOfRange { index: 42, len: 8, .. }
        ));
    }
}
