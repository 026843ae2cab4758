//! Splitter
//!
//! Split search for a single attribute at a node. Continuous attributes are
//! split on a threshold, nominal attributes on groups of categories.
mod continuous;
mod nominal;

pub use continuous::ContinuousSplitter;
pub use nominal::NominalSplitter;

use crate::data::{Attribute, WeightedInstance};
use crate::errors::DecisionTreeError;
use crate::node::Condition;

/// One child produced by a split.
#[derive(Debug)]
pub struct Branch<'a> {
    pub condition: Condition,
    /// Instances sent down this branch, including missing-value fragments.
    pub instances: Vec<WeightedInstance<'a>>,
    pub is_prioritized: bool,
}

impl Branch<'_> {
    pub fn weight(&self) -> f64 {
        crate::data::sum_weights(&self.instances)
    }
}

/// Best split found on one attribute.
#[derive(Debug)]
pub struct SplitInfo<'a> {
    pub gain: f64,
    pub branches: Vec<Branch<'a>>,
}

/// Search for the best split of a node's instances on one attribute.
pub trait Splitter {
    /// Returns `None` when the attribute gives no split with positive gain.
    ///
    /// * `instances` - Weighted instances at the node.
    /// * `index` - Position of the attribute among the feature attributes.
    /// * `attribute` - The attribute itself.
    /// * `parent_entropy` - Entropy of `instances`.
    fn best_split<'a>(
        &self,
        instances: &[WeightedInstance<'a>],
        index: usize,
        attribute: &Attribute,
        parent_entropy: f64,
    ) -> Result<Option<SplitInfo<'a>>, DecisionTreeError>;
}

/// Mark the heaviest branch as the missing-value fallback, the first one wins ties.
pub(crate) fn prioritize_heaviest(branches: &mut [Branch]) {
    let weights: Vec<f64> = branches.iter().map(Branch::weight).collect();
    let mut best = 0;
    for (i, w) in weights.iter().enumerate() {
        if *w > weights[best] {
            best = i;
        }
    }
    for (i, b) in branches.iter_mut().enumerate() {
        b.is_prioritized = i == best;
    }
}
