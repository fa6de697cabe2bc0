//! Parameter demultiplexer: the fitted/fixed split over named groups.
//!
//! A [`ParameterSet`] carries eight named groups in a fixed concatenation
//! order. [`ParameterSet::pack`] splits the group values into the `fitted` and
//! `other` vectors (and extracts the matching limits and names for the search
//! drivers); [`ParameterSet::unpack`] performs the inverse merge. Both walk
//! the groups strictly left to right in the same order, which is what makes
//! the split a round trip.

use crate::domain::{EvaluateError, SetupError};
use serde::{Deserialize, Serialize};

/// The fixed group order shared by pack and unpack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKind {
    Layers,
    Backgrounds,
    ScaleFactors,
    QShifts,
    BulkIn,
    BulkOut,
    Resolutions,
    DomainRatios,
}

impl GroupKind {
    pub const ALL: [GroupKind; 8] = [
        Self::Layers,
        Self::Backgrounds,
        Self::ScaleFactors,
        Self::QShifts,
        Self::BulkIn,
        Self::BulkOut,
        Self::Resolutions,
        Self::DomainRatios,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Layers => "layers",
            Self::Backgrounds => "backgrounds",
            Self::ScaleFactors => "scale factors",
            Self::QShifts => "q shifts",
            Self::BulkIn => "bulk in",
            Self::BulkOut => "bulk out",
            Self::Resolutions => "resolutions",
            Self::DomainRatios => "domain ratios",
        }
    }
}

/// One named block of physical quantities with its fit mask and limits.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParameterGroup {
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub values: Vec<f64>,
    #[serde(default)]
    pub fitted: Vec<bool>,
    #[serde(default)]
    pub limits: Vec<(f64, f64)>,
}

impl ParameterGroup {
    pub fn new(
        kind: GroupKind,
        names: Vec<String>,
        values: Vec<f64>,
        fitted: Vec<bool>,
        limits: Vec<(f64, f64)>,
    ) -> Result<Self, SetupError> {
        let group = Self {
            names,
            values,
            fitted,
            limits,
        };
        group.validate(kind)?;
        Ok(group)
    }

    /// Shape checks performed once at setup; the pack/unpack hot path assumes
    /// they hold.
    pub fn validate(&self, kind: GroupKind) -> Result<(), SetupError> {
        let group = kind.as_str();
        if self.fitted.len() != self.values.len() {
            return Err(SetupError::MaskLengthMismatch {
                group,
                values: self.values.len(),
                masks: self.fitted.len(),
            });
        }
        if self.names.len() != self.values.len() {
            return Err(SetupError::NameCountMismatch {
                group,
                values: self.values.len(),
                names: self.names.len(),
            });
        }
        if self.limits.len() != self.values.len() {
            return Err(SetupError::LimitCountMismatch {
                group,
                values: self.values.len(),
                limits: self.limits.len(),
            });
        }
        for (index, &(lower, upper)) in self.limits.iter().enumerate() {
            if lower > upper {
                return Err(SetupError::InvertedLimit {
                    group,
                    index,
                    lower,
                    upper,
                });
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn fitted_count(&self) -> usize {
        self.fitted.iter().filter(|fit| **fit).count()
    }

    pub fn value(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }
}

/// Limits and names for the currently fitted slots, in fitted-vector order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FittedMetadata {
    pub limits: Vec<(f64, f64)>,
    pub names: Vec<String>,
}

/// The full named parameter collection plus its fitted/other split.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParameterSet {
    #[serde(default)]
    pub layers: ParameterGroup,
    #[serde(default)]
    pub backgrounds: ParameterGroup,
    #[serde(default)]
    pub scale_factors: ParameterGroup,
    #[serde(default)]
    pub q_shifts: ParameterGroup,
    #[serde(default)]
    pub bulk_in: ParameterGroup,
    #[serde(default)]
    pub bulk_out: ParameterGroup,
    #[serde(default)]
    pub resolutions: ParameterGroup,
    #[serde(default)]
    pub domain_ratios: ParameterGroup,
    #[serde(skip)]
    fitted: Vec<f64>,
    #[serde(skip)]
    other: Vec<f64>,
}

impl ParameterSet {
    pub fn groups(&self) -> [(GroupKind, &ParameterGroup); 8] {
        [
            (GroupKind::Layers, &self.layers),
            (GroupKind::Backgrounds, &self.backgrounds),
            (GroupKind::ScaleFactors, &self.scale_factors),
            (GroupKind::QShifts, &self.q_shifts),
            (GroupKind::BulkIn, &self.bulk_in),
            (GroupKind::BulkOut, &self.bulk_out),
            (GroupKind::Resolutions, &self.resolutions),
            (GroupKind::DomainRatios, &self.domain_ratios),
        ]
    }

    fn groups_mut(&mut self) -> [&mut ParameterGroup; 8] {
        [
            &mut self.layers,
            &mut self.backgrounds,
            &mut self.scale_factors,
            &mut self.q_shifts,
            &mut self.bulk_in,
            &mut self.bulk_out,
            &mut self.resolutions,
            &mut self.domain_ratios,
        ]
    }

    pub fn validate(&self) -> Result<(), SetupError> {
        for (kind, group) in self.groups() {
            group.validate(kind)?;
        }
        Ok(())
    }

    /// Split the named group values into the fitted and other vectors,
    /// extracting the matching limits and names for the fitted slots.
    ///
    /// Traversal is strict left-to-right, group by group, in [`GroupKind::ALL`]
    /// order; [`Self::unpack`] walks the identical order.
    pub fn pack(&mut self) -> FittedMetadata {
        let mut fitted = Vec::new();
        let mut other = Vec::new();
        let mut metadata = FittedMetadata::default();

        for (_, group) in self.groups() {
            for (index, (&slot, &is_fitted)) in group.values.iter().zip(&group.fitted).enumerate() {
                if is_fitted {
                    fitted.push(slot);
                    metadata.limits.push(group.limits[index]);
                    metadata.names.push(group.names[index].clone());
                } else {
                    other.push(slot);
                }
            }
        }

        self.fitted = fitted;
        self.other = other;
        metadata
    }

    /// Merge the fitted and other vectors back into the named group values.
    pub fn unpack(&mut self) {
        let fitted = std::mem::take(&mut self.fitted);
        let other = std::mem::take(&mut self.other);

        let mut fit_cursor = 0;
        let mut other_cursor = 0;
        for group in self.groups_mut() {
            for (slot, &is_fitted) in group.values.iter_mut().zip(&group.fitted) {
                if is_fitted {
                    *slot = fitted[fit_cursor];
                    fit_cursor += 1;
                } else {
                    *slot = other[other_cursor];
                    other_cursor += 1;
                }
            }
        }

        self.fitted = fitted;
        self.other = other;
    }

    /// Overwrite the fitted vector with a search driver's candidate.
    pub fn set_fitted(&mut self, candidate: &[f64]) -> Result<(), EvaluateError> {
        if candidate.len() != self.fitted.len() {
            return Err(EvaluateError::CandidateLengthMismatch {
                expected: self.fitted.len(),
                actual: candidate.len(),
            });
        }
        self.fitted.copy_from_slice(candidate);
        Ok(())
    }

    pub fn fitted(&self) -> &[f64] {
        &self.fitted
    }

    pub fn other(&self) -> &[f64] {
        &self.other
    }

    pub fn fitted_len(&self) -> usize {
        self.fitted.len()
    }
}
