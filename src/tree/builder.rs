use crate::config::TreeConfig;
use crate::data::{AttributeKind, Instance, Schema, WeightedInstance};
use crate::errors::DecisionTreeError;
use crate::impurity::entropy_of;
use crate::node::SplittableNode;
use crate::splitter::{ContinuousSplitter, NominalSplitter, SplitInfo, Splitter};
use crate::tree::Tree;
use log::{debug, info, warn};

/// Grows a `Tree` top-down by recursive splitting.
///
/// The builder owns the counter node ids are drawn from, so ids are unique
/// within one tree and assigned in creation order, root first.
pub struct TreeBuilder<'s> {
    schema: &'s Schema,
    config: &'s TreeConfig,
    continuous: ContinuousSplitter,
    nominal: NominalSplitter,
    next_num: usize,
}

impl<'s> TreeBuilder<'s> {
    pub fn new(schema: &'s Schema, config: &'s TreeConfig) -> Self {
        let n_classes = schema.n_classes();
        TreeBuilder {
            schema,
            config,
            continuous: ContinuousSplitter::new(n_classes),
            nominal: NominalSplitter::new(
                n_classes,
                config.min_samples_leaf,
                config.max_nominal_brute_force_scale,
            ),
            next_num: 0,
        }
    }

    fn take_num(&mut self) -> usize {
        let num = self.next_num;
        self.next_num += 1;
        num
    }

    /// Grow a tree on `instances` and label its leaves. No pruning is done here.
    pub fn build(mut self, instances: &[Instance]) -> Result<Tree, DecisionTreeError> {
        self.config.validate()?;
        let mut unknown_class = 0;
        let weighted: Vec<WeightedInstance> = instances
            .iter()
            .filter_map(|i| {
                let label = i.class_label()?;
                let class = self.schema.class_index(label);
                if class.is_none() {
                    unknown_class += 1;
                }
                class.map(|c| WeightedInstance::new(i, c))
            })
            .collect();
        if unknown_class > 0 {
            warn!("Skipping {} instances with a class value outside the schema.", unknown_class);
        }
        if weighted.is_empty() {
            return Err(DecisionTreeError::NoValidInstances);
        }
        debug!(
            "Building tree on {} of {} instances.",
            weighted.len(),
            instances.len()
        );
        if self.schema.features().is_empty() {
            warn!("Schema has no feature attributes, the tree will be a single leaf.");
        }

        let mut root = SplittableNode::root(self.take_num(), weighted);
        self.split_node(&mut root)?;

        let tree = Tree {
            attributes: self.schema.features().to_vec(),
            root: root.as_node(self.schema.class_values()),
        };
        info!(
            "Built tree: {} nodes, {} leaves, depth {}.",
            tree.node_count(),
            tree.leaf_count(),
            tree.max_depth()
        );
        Ok(tree)
    }

    /// Best split over every feature attribute, the first attribute wins ties.
    fn find_best_split<'a>(
        &self,
        instances: &[WeightedInstance<'a>],
    ) -> Result<Option<SplitInfo<'a>>, DecisionTreeError> {
        let parent_entropy = entropy_of(instances, self.schema.n_classes());
        let mut best: Option<SplitInfo<'a>> = None;
        for (index, attribute) in self.schema.features().iter().enumerate() {
            let split = match attribute.kind {
                AttributeKind::Continuous => self.continuous.best_split(instances, index, attribute, parent_entropy)?,
                AttributeKind::Nominal(_) => self.nominal.best_split(instances, index, attribute, parent_entropy)?,
            };
            if let Some(split) = split {
                if split.gain > best.as_ref().map_or(0.0, |b| b.gain) {
                    best = Some(split);
                }
            }
        }
        Ok(best)
    }

    fn split_node<'a>(&mut self, node: &mut SplittableNode<'a>) -> Result<(), DecisionTreeError> {
        if node.depth >= self.config.max_depth {
            return Ok(());
        }
        if node.instances.len() < self.config.min_samples_split {
            return Ok(());
        }
        let Some(first) = node.instances.first() else {
            return Ok(());
        };
        if node.instances.iter().all(|i| i.class == first.class) {
            return Ok(());
        }

        let Some(best) = self.find_best_split(&node.instances)? else {
            return Ok(());
        };
        if best.gain < self.config.min_impurity_decrease {
            return Ok(());
        }

        node.split_gain = best.gain;
        debug!(
            "Splitting node {} into {} branches, gain {:.4}.",
            node.num,
            best.branches.len(),
            node.split_gain
        );
        let depth = node.depth + 1;
        let mut children = Vec::with_capacity(best.branches.len());
        for branch in best.branches {
            children.push(SplittableNode {
                num: self.take_num(),
                depth,
                condition: Some(branch.condition),
                instances: branch.instances,
                children: Vec::new(),
                is_prioritized: branch.is_prioritized,
                split_gain: 0.0,
            });
        }
        // Only leaves need their instances, for the majority vote.
        node.instances = Vec::new();
        node.children = children;

        for child in node.children.iter_mut() {
            self.split_node(child)?;
        }
        Ok(())
    }
}
