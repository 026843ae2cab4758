use super::tree::Tree;
use crate::data::Instance;
use crate::errors::DecisionTreeError;
use crate::node::Node;
use rayon::prelude::*;

impl Node {
    /// Child of this internal node that `instance` descends into.
    ///
    /// A present value goes to the first child whose condition holds, a
    /// missing or unmatched value goes to the prioritized child.
    pub fn route(&self, instance: &Instance) -> Result<&Node, DecisionTreeError> {
        let attribute = self.split_attribute().ok_or_else(|| {
            DecisionTreeError::PredictionRoutingFailure(self.num, "node has no split condition".to_string())
        })?;
        let value = instance.value(attribute).ok_or_else(|| {
            DecisionTreeError::PredictionRoutingFailure(
                self.num,
                format!("instance has no value for attribute {}", attribute),
            )
        })?;
        if !value.is_missing() {
            let matched = self
                .children
                .iter()
                .find(|c| c.condition.as_ref().is_some_and(|cond| cond.is_met(value)));
            if let Some(child) = matched {
                return Ok(child);
            }
        }
        self.prioritized_child().ok_or_else(|| {
            DecisionTreeError::PredictionRoutingFailure(
                self.num,
                format!("no child accepts value {} and none is prioritized", value),
            )
        })
    }

    /// Leaf of this subtree that `instance` ends up in.
    pub fn find_leaf(&self, instance: &Instance) -> Result<&Node, DecisionTreeError> {
        let mut node = self;
        while !node.is_leaf() {
            node = node.route(instance)?;
        }
        Ok(node)
    }

    /// Class predicted by this subtree.
    pub fn predict(&self, instance: &Instance) -> Result<&str, DecisionTreeError> {
        let leaf = self.find_leaf(instance)?;
        leaf.leaf_class.as_deref().ok_or_else(|| {
            DecisionTreeError::PredictionRoutingFailure(leaf.num, "leaf has no class".to_string())
        })
    }
}

impl Tree {
    /// Predict the class of a single instance.
    pub fn predict(&self, instance: &Instance) -> Result<&str, DecisionTreeError> {
        self.root.predict(instance)
    }

    /// Predict the class of every instance, in order.
    ///
    /// * `instances` - Instances to classify.
    /// * `parallel` - Classify on the rayon thread pool.
    pub fn predict_batch(&self, instances: &[Instance], parallel: bool) -> Result<Vec<String>, DecisionTreeError> {
        if parallel {
            instances
                .par_iter()
                .map(|i| self.predict(i).map(str::to_string))
                .collect()
        } else {
            instances.iter().map(|i| self.predict(i).map(str::to_string)).collect()
        }
    }
}
