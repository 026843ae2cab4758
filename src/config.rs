//! Tree Configuration
//!
//! Options consumed by the tree builder, the pruner and the data reader,
//! and the JSON I/O shared by configurations and persisted trees.
use crate::constants::{
    DEFAULT_MAX_DEPTH, DEFAULT_MAX_NOMINAL_BRUTE_FORCE_SCALE, DEFAULT_MIN_SAMPLES_LEAF, DEFAULT_MIN_SAMPLES_SPLIT,
};
use crate::errors::DecisionTreeError;
use crate::utils::{validate_float_parameter, validate_int_parameter};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::path::Path;

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}
fn default_min_samples_split() -> usize {
    DEFAULT_MIN_SAMPLES_SPLIT
}
fn default_min_samples_leaf() -> usize {
    DEFAULT_MIN_SAMPLES_LEAF
}
fn default_max_nominal_brute_force_scale() -> usize {
    DEFAULT_MAX_NOMINAL_BRUTE_FORCE_SCALE
}
fn default_post_prune() -> bool {
    true
}

/// Configuration for growing and pruning a `Tree`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Nodes at this depth are not split, the root has depth 1.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Nodes with fewer instances are not split.
    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: usize,
    /// Smallest number of instances a nominal branch may hold.
    #[serde(default = "default_min_samples_leaf")]
    pub min_samples_leaf: usize,
    /// Smallest gain accepted for a split.
    #[serde(default)]
    pub min_impurity_decrease: f64,
    /// Number of category groups above which the lightest groups are merged
    /// before searching binary partitions. Must be at least 2.
    #[serde(default = "default_max_nominal_brute_force_scale")]
    pub max_nominal_brute_force_scale: usize,
    /// Smallest pessimistic error decrease for which a subtree is collapsed.
    #[serde(default)]
    pub min_post_prune_generalization_error_decrease: f64,
    /// Read unparsable or unknown raw values as missing instead of failing.
    #[serde(default)]
    pub consider_invalid_data_as_missing: bool,
    /// Run pessimistic post-pruning after the tree is grown.
    #[serde(default = "default_post_prune")]
    pub post_prune: bool,
}

impl Default for TreeConfig {
    fn default() -> Self {
        TreeConfig {
            max_depth: DEFAULT_MAX_DEPTH,
            min_samples_split: DEFAULT_MIN_SAMPLES_SPLIT,
            min_samples_leaf: DEFAULT_MIN_SAMPLES_LEAF,
            min_impurity_decrease: 0.0,
            max_nominal_brute_force_scale: DEFAULT_MAX_NOMINAL_BRUTE_FORCE_SCALE,
            min_post_prune_generalization_error_decrease: 0.0,
            consider_invalid_data_as_missing: false,
            post_prune: true,
        }
    }
}

impl TreeConfig {
    /// Check every option is within its accepted range.
    pub fn validate(&self) -> Result<(), DecisionTreeError> {
        validate_int_parameter(self.max_depth, 1, usize::MAX, "max_depth")?;
        validate_int_parameter(self.min_samples_split, 0, usize::MAX, "min_samples_split")?;
        validate_int_parameter(self.min_samples_leaf, 0, usize::MAX, "min_samples_leaf")?;
        validate_float_parameter(self.min_impurity_decrease, 0.0, f64::INFINITY, "min_impurity_decrease")?;
        // One bit per group in the partition mask.
        validate_int_parameter(
            self.max_nominal_brute_force_scale,
            2,
            usize::BITS as usize - 1,
            "max_nominal_brute_force_scale",
        )?;
        validate_float_parameter(
            self.min_post_prune_generalization_error_decrease,
            f64::NEG_INFINITY,
            f64::INFINITY,
            "min_post_prune_generalization_error_decrease",
        )?;
        Ok(())
    }

    // Set methods for parameters

    /// Set the maximum depth.
    /// * `max_depth` - Nodes reaching this depth become leaves.
    pub fn set_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the minimum number of instances needed to split a node.
    pub fn set_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    /// Set the minimum number of instances in a nominal branch.
    pub fn set_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf;
        self
    }

    /// Set the minimum gain of a split.
    pub fn set_min_impurity_decrease(mut self, min_impurity_decrease: f64) -> Self {
        self.min_impurity_decrease = min_impurity_decrease;
        self
    }

    /// Set the brute force scale of nominal binary splits.
    /// * `max_nominal_brute_force_scale` - Categories are merged down to this many
    ///   groups before every partition is tried, so the search visits at most
    ///   `2^scale - 2` partitions.
    pub fn set_max_nominal_brute_force_scale(mut self, max_nominal_brute_force_scale: usize) -> Self {
        self.max_nominal_brute_force_scale = max_nominal_brute_force_scale;
        self
    }

    /// Set the pessimistic error decrease required to collapse a subtree.
    pub fn set_min_post_prune_generalization_error_decrease(mut self, decrease: f64) -> Self {
        self.min_post_prune_generalization_error_decrease = decrease;
        self
    }

    pub fn set_consider_invalid_data_as_missing(mut self, consider_invalid_data_as_missing: bool) -> Self {
        self.consider_invalid_data_as_missing = consider_invalid_data_as_missing;
        self
    }

    pub fn set_post_prune(mut self, post_prune: bool) -> Self {
        self.post_prune = post_prune;
        self
    }
}

/// IO
pub trait JsonIO: Serialize + DeserializeOwned + Sized {
    /// Save as a json object to a file.
    ///
    /// * `path` - Path to save to.
    fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), DecisionTreeError> {
        fs::write(path, self.json_dump()?).map_err(|e| DecisionTreeError::UnableToWrite(e.to_string()))
    }

    /// Dump as a json object
    fn json_dump(&self) -> Result<String, DecisionTreeError> {
        serde_json::to_string(self).map_err(|e| DecisionTreeError::UnableToWrite(e.to_string()))
    }

    /// Load from Json string
    ///
    /// * `json_str` - String object, which can be serialized to json.
    fn from_json(json_str: &str) -> Result<Self, DecisionTreeError> {
        serde_json::from_str::<Self>(json_str).map_err(|e| DecisionTreeError::UnableToRead(e.to_string()))
    }

    /// Load from a path to a json object.
    ///
    /// * `path` - Path to load from.
    fn load<P: AsRef<Path>>(path: P) -> Result<Self, DecisionTreeError> {
        let json_str = fs::read_to_string(path).map_err(|e| DecisionTreeError::UnableToRead(e.to_string()))?;
        Self::from_json(&json_str)
    }
}

impl JsonIO for TreeConfig {}
