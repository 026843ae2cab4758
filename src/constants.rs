/// Continuity correction added per leaf in the pessimistic error estimate.
pub const PESSIMISTIC_LEAF_PENALTY: f64 = 0.5;
/// Token used by data files for a missing value.
pub const MISSING_TOKEN: &str = "?";
/// Name given to a class attribute declared without one.
pub const DEFAULT_CLASS_NAME: &str = "Class";
/// Tolerance used when comparing summed fractional weights.
pub const WEIGHT_EPS: f64 = 1e-9;

pub const DEFAULT_MAX_DEPTH: usize = 16;
pub const DEFAULT_MIN_SAMPLES_SPLIT: usize = 2;
pub const DEFAULT_MIN_SAMPLES_LEAF: usize = 1;
pub const DEFAULT_MAX_NOMINAL_BRUTE_FORCE_SCALE: usize = 8;
