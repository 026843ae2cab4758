use crate::config::TreeConfig;
use crate::data::{Attribute, Instance, Schema};
use crate::errors::DecisionTreeError;
use crate::node::{Condition, Node};
use crate::tree::builder::TreeBuilder;
use std::fmt::{self, Display};

/// A fitted classification tree.
#[derive(Clone, Debug, PartialEq)]
pub struct Tree {
    /// Feature attributes, in the positional order instance values follow.
    pub attributes: Vec<Attribute>,
    pub root: Node,
}

impl Tree {
    /// Grow a tree on `instances`, then prune it when `config.post_prune` is set.
    ///
    /// * `schema` - Feature and class attributes of the instances.
    /// * `instances` - Training instances, those with a missing class are skipped.
    /// * `config` - Growing and pruning options.
    pub fn fit(schema: &Schema, instances: &[Instance], config: &TreeConfig) -> Result<Self, DecisionTreeError> {
        config.validate()?;
        let mut tree = TreeBuilder::new(schema, config).build(instances)?;
        if config.post_prune {
            tree.prune(schema, instances, config)?;
        }
        Ok(tree)
    }

    pub fn node_count(&self) -> usize {
        self.root.node_count()
    }

    pub fn leaf_count(&self) -> usize {
        self.root.leaf_count()
    }

    /// Depth of the deepest leaf, a single leaf tree has depth 1.
    pub fn max_depth(&self) -> usize {
        self.root.depth()
    }

    pub fn leaves(&self) -> Vec<&Node> {
        self.root.leaves()
    }

    fn attribute_name(&self, index: usize) -> String {
        self.attributes
            .get(index)
            .map_or_else(|| format!("[{}]", index), |a| a.name.clone())
    }

    fn describe(&self, condition: &Condition) -> String {
        let name = self.attribute_name(condition.attribute());
        match condition {
            Condition::LessThan { threshold, .. } => format!("{} < {}", name, threshold),
            Condition::GreaterThanEq { threshold, .. } => format!("{} >= {}", name, threshold),
            Condition::Range { low, high, .. } => format!("{} < {} <= {}", low, name, high),
            Condition::IsOneOf { values, .. } => format!("{} in {{{}}}", name, values.join(", ")),
        }
    }

    fn fmt_node(&self, f: &mut fmt::Formatter, node: &Node, indent: usize) -> fmt::Result {
        if let Some(condition) = &node.condition {
            write!(f, "{}{}", "  ".repeat(indent), self.describe(condition))?;
            if let (true, Some(class)) = (node.is_leaf(), &node.leaf_class) {
                write!(f, ": {}", class)?;
            }
            // Marks the branch missing values take.
            if node.is_prioritized {
                write!(f, " *")?;
            }
            writeln!(f)?;
        } else if let Some(class) = &node.leaf_class {
            writeln!(f, "{}", class)?;
        }
        let indent = if node.condition.is_some() { indent + 1 } else { indent };
        for child in &node.children {
            self.fmt_node(f, child, indent)?;
        }
        Ok(())
    }
}

impl Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.fmt_node(f, &self.root, 0)
    }
}
