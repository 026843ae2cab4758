use crate::config::TreeConfig;
use crate::data::{Instance, Schema, WeightedInstance};
use crate::errors::DecisionTreeError;
use crate::impurity::ClassWeights;
use crate::metrics::evaluation::evaluate_node;
use crate::node::Node;
use crate::tree::Tree;
use hashbrown::HashMap;
use log::{debug, info};
use std::collections::VecDeque;

/// Record, for every node, the child index path from the root and its parent's id.
fn index_nodes(
    node: &Node,
    path: &mut Vec<usize>,
    paths: &mut HashMap<usize, Vec<usize>>,
    parents: &mut HashMap<usize, usize>,
) {
    paths.insert(node.num, path.clone());
    for (i, child) in node.children.iter().enumerate() {
        parents.insert(child.num, node.num);
        path.push(i);
        index_nodes(child, path, paths, parents);
        path.pop();
    }
}

fn node_at<'n>(root: &'n Node, path: &[usize]) -> Option<&'n Node> {
    path.iter().try_fold(root, |node, &i| node.children.get(i))
}

fn node_at_mut<'n>(root: &'n mut Node, path: &[usize]) -> Option<&'n mut Node> {
    path.iter().try_fold(root, |node, &i| node.children.get_mut(i))
}

/// Internal nodes whose children are all leaves, in pre-order.
fn collect_prune_ready(node: &Node, ready: &mut VecDeque<usize>) {
    if node.is_prune_ready() {
        ready.push_back(node.num);
    } else {
        node.children.iter().for_each(|c| collect_prune_ready(c, ready));
    }
}

/// Replay routing from the root, recording the instances that reach every node.
fn route_instances<'i>(
    root: &Node,
    instances: &[&'i Instance],
) -> Result<HashMap<usize, Vec<&'i Instance>>, DecisionTreeError> {
    let mut routed: HashMap<usize, Vec<&Instance>> = HashMap::new();
    for instance in instances {
        let mut node = root;
        loop {
            routed.entry(node.num).or_default().push(*instance);
            if node.is_leaf() {
                break;
            }
            node = node.route(instance)?;
        }
    }
    Ok(routed)
}

/// Class a collapsed node predicts: the majority of its routed instances, or
/// the prioritized child's class when no instance reaches it.
fn collapsed_class(node: &Node, instances: &[&Instance], schema: &Schema) -> Option<String> {
    let weighted: Vec<WeightedInstance> = instances
        .iter()
        .filter_map(|i| {
            let class = schema.class_index(i.class_label()?)?;
            Some(WeightedInstance::new(i, class))
        })
        .collect();
    if weighted.is_empty() {
        return node
            .prioritized_child()
            .or_else(|| node.children.first())
            .and_then(|c| c.leaf_class.clone());
    }
    let majority = ClassWeights::from_instances(&weighted, schema.n_classes()).majority();
    schema.class_values().get(majority).cloned()
}

/// Collapse `node` into a leaf when that lowers the pessimistic error on its
/// routed instances by at least `min_decrease`. Returns whether it was collapsed.
fn try_collapse(
    node: &mut Node,
    instances: &[&Instance],
    schema: &Schema,
    min_decrease: f64,
) -> Result<bool, DecisionTreeError> {
    let Some(class) = collapsed_class(node, instances, schema) else {
        return Err(DecisionTreeError::PredictionRoutingFailure(
            node.num,
            "no class to collapse the node into".to_string(),
        ));
    };
    let before = evaluate_node(node, instances.iter().copied())?.pessimistic_error;

    let children = std::mem::take(&mut node.children);
    node.leaf_class = Some(class);
    let after = evaluate_node(node, instances.iter().copied())?.pessimistic_error;

    if before - after < min_decrease {
        node.children = children;
        node.leaf_class = None;
        return Ok(false);
    }
    debug!(
        "Collapsed node {} ({} children), pessimistic error {:.4} -> {:.4}.",
        node.num,
        children.len(),
        before,
        after
    );
    Ok(true)
}

impl Tree {
    /// Collapse subtrees bottom-up while doing so does not raise their
    /// pessimistic error on the training instances routed to them.
    ///
    /// * `schema` - Schema the tree was grown with.
    /// * `instances` - Training instances, those with a missing class or a class
    ///   outside the schema are ignored.
    /// * `config` - Supplies `min_post_prune_generalization_error_decrease`.
    ///
    /// Returns the number of collapsed nodes.
    pub fn prune(
        &mut self,
        schema: &Schema,
        instances: &[Instance],
        config: &TreeConfig,
    ) -> Result<usize, DecisionTreeError> {
        let old_n_nodes = self.node_count();
        // Same instances the builder grew the tree on.
        let labeled: Vec<&Instance> = instances
            .iter()
            .filter(|i| i.class_label().and_then(|l| schema.class_index(l)).is_some())
            .collect();

        let mut paths = HashMap::new();
        let mut parents = HashMap::new();
        index_nodes(&self.root, &mut Vec::new(), &mut paths, &mut parents);
        let routed = route_instances(&self.root, &labeled)?;

        let mut queue = VecDeque::new();
        collect_prune_ready(&self.root, &mut queue);

        let mut collapsed = 0;
        while let Some(num) = queue.pop_front() {
            let path = paths.get(&num).ok_or_else(|| {
                DecisionTreeError::PredictionRoutingFailure(num, "node missing from the tree".to_string())
            })?;
            let Some(node) = node_at_mut(&mut self.root, path) else {
                continue;
            };
            let node_instances = routed.get(&num).map(Vec::as_slice).unwrap_or(&[]);
            if !try_collapse(
                node,
                node_instances,
                schema,
                config.min_post_prune_generalization_error_decrease,
            )? {
                continue;
            }
            collapsed += 1;

            if let Some(parent_num) = parents.get(&num) {
                let parent_ready = paths
                    .get(parent_num)
                    .and_then(|p| node_at(&self.root, p))
                    .is_some_and(Node::is_prune_ready);
                if parent_ready {
                    queue.push_back(*parent_num);
                }
            }
        }

        info!(
            "Pruning: collapsed {} nodes, n_nodes: {} -> {}",
            collapsed,
            old_n_nodes,
            self.node_count()
        );
        Ok(collapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Attribute, Value};
    use crate::node::Condition;

    fn schema() -> Schema {
        Schema::new(vec![Attribute::continuous("x")], Attribute::nominal("class", ["A", "B"])).unwrap()
    }

    fn row(x: f64, class: &str) -> Instance {
        Instance::new(vec![Value::Numeric(x)], class.into())
    }

    fn leaf(num: usize, class: &str, prio: bool, condition: Condition) -> Node {
        Node {
            num,
            condition: Some(condition),
            children: Vec::new(),
            is_prioritized: prio,
            leaf_class: Some(class.to_string()),
        }
    }

    fn split(
        num: usize,
        condition: Option<Condition>,
        prio: bool,
        threshold: f64,
        left: &str,
        right: &str,
        ids: (usize, usize),
    ) -> Node {
        Node {
            num,
            condition,
            children: vec![
                leaf(ids.0, left, true, Condition::LessThan { attribute: 0, threshold }),
                leaf(ids.1, right, false, Condition::GreaterThanEq { attribute: 0, threshold }),
            ],
            is_prioritized: prio,
            leaf_class: None,
        }
    }

    fn stump(left: &str, right: &str) -> Tree {
        Tree {
            attributes: vec![Attribute::continuous("x")],
            root: split(0, None, false, 2.5, left, right, (1, 2)),
        }
    }

    /// x < 2.5 -> A, otherwise (x < 3.5 -> A, otherwise B)
    fn two_levels() -> Tree {
        let right = split(
            2,
            Some(Condition::GreaterThanEq { attribute: 0, threshold: 2.5 }),
            false,
            3.5,
            "A",
            "B",
            (3, 4),
        );
        Tree {
            attributes: vec![Attribute::continuous("x")],
            root: Node {
                num: 0,
                condition: None,
                children: vec![leaf(1, "A", true, Condition::LessThan { attribute: 0, threshold: 2.5 }), right],
                is_prioritized: false,
                leaf_class: None,
            },
        }
    }

    #[test]
    fn test_collapses_when_error_decreases() {
        let mut tree = stump("A", "B");
        let data = vec![row(1.0, "A"), row(2.0, "A"), row(3.0, "A"), row(4.0, "B")];
        // (1 + 2 * 0.5) / 4 = 0.5 before, (1 + 0.5) / 4 = 0.375 after.
        let collapsed = tree.prune(&schema(), &data, &TreeConfig::default()).unwrap();
        assert_eq!(collapsed, 1);
        assert!(tree.root.is_leaf());
        assert_eq!(tree.root.leaf_class.as_deref(), Some("A"));
    }

    #[test]
    fn test_keeps_useful_split() {
        let mut tree = stump("A", "B");
        let data = vec![row(1.0, "A"), row(2.0, "A"), row(3.0, "B"), row(4.0, "B")];
        let before = tree.test_run(&data).unwrap().pessimistic_error;
        let collapsed = tree.prune(&schema(), &data, &TreeConfig::default()).unwrap();
        assert_eq!(collapsed, 0);
        assert_eq!(tree, stump("A", "B"));
        assert_eq!(tree.test_run(&data).unwrap().pessimistic_error, before);
    }

    #[test]
    fn test_collapse_propagates_to_parent() {
        let mut tree = two_levels();
        let data = vec![row(1.0, "A"), row(2.0, "A"), row(3.0, "A"), row(4.0, "B"), row(5.0, "A")];
        let collapsed = tree.prune(&schema(), &data, &TreeConfig::default()).unwrap();
        assert_eq!(collapsed, 2);
        assert!(tree.root.is_leaf());
        assert_eq!(tree.root.leaf_class.as_deref(), Some("A"));
    }

    #[test]
    fn test_min_decrease_blocks_collapse() {
        let mut tree = two_levels();
        let data = vec![row(1.0, "A"), row(2.0, "A"), row(3.0, "A"), row(4.0, "B"), row(5.0, "A")];
        // The inner node only improves by 1/6.
        let config = TreeConfig::default().set_min_post_prune_generalization_error_decrease(0.2);
        let collapsed = tree.prune(&schema(), &data, &config).unwrap();
        assert_eq!(collapsed, 0);
        assert_eq!(tree, two_levels());
    }

    #[test]
    fn test_unreached_node_takes_prioritized_class() {
        let mut tree = two_levels();
        // Nothing reaches the inner node, it collapses into its prioritized
        // child's class and then the root collapses too.
        let data = vec![row(1.0, "A"), row(2.0, "A")];
        let collapsed = tree.prune(&schema(), &data, &TreeConfig::default()).unwrap();
        assert_eq!(collapsed, 2);
        assert_eq!(tree.root.leaf_class.as_deref(), Some("A"));
    }

    #[test]
    fn test_ignores_classes_outside_schema() {
        let mut tree = stump("A", "B");
        let data = vec![
            row(1.0, "A"),
            row(2.0, "A"),
            row(3.0, "B"),
            row(4.0, "B"),
            row(3.0, "C"),
            row(4.0, "C"),
        ];
        let collapsed = tree.prune(&schema(), &data, &TreeConfig::default()).unwrap();
        assert_eq!(collapsed, 0);
        assert_eq!(tree, stump("A", "B"));
    }

    #[test]
    fn test_missing_values_follow_prioritized_branch() {
        let tree = stump("A", "B");
        let data = vec![row(1.0, "A"), Instance::new(vec![Value::Missing], "A".into()), row(3.0, "B")];
        let labeled: Vec<&Instance> = data.iter().collect();
        let routed = route_instances(&tree.root, &labeled).unwrap();
        assert_eq!(routed[&0].len(), 3);
        assert_eq!(routed[&1].len(), 2);
        assert_eq!(routed[&2].len(), 1);
    }
}
