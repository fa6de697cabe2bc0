pub type SpecularResult<T> = Result<T, SpecularError>;

/// Umbrella error for the engine's fallible surfaces.
///
/// The hot evaluation path itself never raises; a bad candidate only ever
/// surfaces as a NaN objective, which search drivers treat as a rejection.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SpecularError {
    #[error(transparent)]
    Setup(#[from] SetupError),
    #[error(transparent)]
    Evaluate(#[from] EvaluateError),
}

/// Structural problems in an experiment description, caught once at setup so
/// the evaluation loop can assume consistent shapes.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SetupError {
    #[error("failed to parse experiment setup: {0}")]
    Parse(String),
    #[error(
        "parameter group '{group}' has {values} values but {masks} fit-mask entries"
    )]
    MaskLengthMismatch {
        group: &'static str,
        values: usize,
        masks: usize,
    },
    #[error("parameter group '{group}' has {values} values but {names} names")]
    NameCountMismatch {
        group: &'static str,
        values: usize,
        names: usize,
    },
    #[error("parameter group '{group}' has {values} values but {limits} limit pairs")]
    LimitCountMismatch {
        group: &'static str,
        values: usize,
        limits: usize,
    },
    #[error(
        "parameter group '{group}' slot {index} has lower limit {lower} above upper limit {upper}"
    )]
    InvertedLimit {
        group: &'static str,
        index: usize,
        lower: f64,
        upper: f64,
    },
    #[error(
        "layer '{layer}' references parameter slot {index} but group '{group}' holds {len} slots"
    )]
    LayerSlotOutOfRange {
        layer: String,
        group: &'static str,
        index: usize,
        len: usize,
    },
    #[error(
        "contrast '{contrast}' references layer index {index} but the catalog holds {catalog} layers"
    )]
    LayerIndexOutOfRange {
        contrast: String,
        index: usize,
        catalog: usize,
    },
    #[error(
        "contrast '{contrast}' references slot {index} of group '{group}' which holds {len} slots"
    )]
    ContrastSlotOutOfRange {
        contrast: String,
        group: &'static str,
        index: usize,
        len: usize,
    },
    #[error(
        "contrast '{contrast}' data columns disagree: {q} q values, {intensity} intensities, {uncertainty} uncertainties"
    )]
    RaggedData {
        contrast: String,
        q: usize,
        intensity: usize,
        uncertainty: usize,
    },
    #[error("contrast '{contrast}' data row {row} has non-positive uncertainty {value}")]
    NonPositiveUncertainty {
        contrast: String,
        row: usize,
        value: f64,
    },
    #[error(
        "contrast '{contrast}' background profile holds {profile} values for {points} data points"
    )]
    BackgroundProfileMismatch {
        contrast: String,
        profile: usize,
        points: usize,
    },
    #[error(
        "contrast '{contrast}' simulation range ({lower}, {upper}) is empty or inverted"
    )]
    EmptySimulationRange {
        contrast: String,
        lower: f64,
        upper: f64,
    },
}

/// Problems raised at the objective-adapter boundary.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluateError {
    #[error("candidate vector holds {actual} values but {expected} slots are fitted")]
    CandidateLengthMismatch { expected: usize, actual: usize },
}
