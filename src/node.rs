use crate::data::{Value, WeightedInstance};
use crate::impurity::ClassWeights;
use std::fmt;

/// Test an instance must pass to reach a child from its parent.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `value < threshold`
    LessThan { attribute: usize, threshold: f64 },
    /// `value >= threshold`
    GreaterThanEq { attribute: usize, threshold: f64 },
    /// `low < value <= high`. Reserved, the split search never produces it
    /// and it cannot be read back from a persisted tree.
    Range { attribute: usize, low: f64, high: f64 },
    /// The category is one of `values`.
    IsOneOf { attribute: usize, values: Vec<String> },
}

impl Condition {
    /// Index of the tested attribute in the tree's feature attributes.
    pub fn attribute(&self) -> usize {
        match self {
            Condition::LessThan { attribute, .. }
            | Condition::GreaterThanEq { attribute, .. }
            | Condition::Range { attribute, .. }
            | Condition::IsOneOf { attribute, .. } => *attribute,
        }
    }

    /// Whether a present value satisfies the condition. A value of the wrong
    /// kind never does.
    pub fn is_met(&self, value: &Value) -> bool {
        match self {
            Condition::LessThan { threshold, .. } => value.as_numeric().is_some_and(|v| v < *threshold),
            Condition::GreaterThanEq { threshold, .. } => value.as_numeric().is_some_and(|v| v >= *threshold),
            Condition::Range { low, high, .. } => value.as_numeric().is_some_and(|v| *low < v && v <= *high),
            Condition::IsOneOf { values, .. } => value.as_category().is_some_and(|v| values.iter().any(|a| a == v)),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Condition::LessThan { attribute, threshold } => write!(f, "[{}] < {}", attribute, threshold),
            Condition::GreaterThanEq { attribute, threshold } => write!(f, "[{}] >= {}", attribute, threshold),
            Condition::Range { attribute, low, high } => write!(f, "{} < [{}] <= {}", low, attribute, high),
            Condition::IsOneOf { attribute, values } => write!(f, "[{}] in {{{}}}", attribute, values.join(", ")),
        }
    }
}

/// A node of a finished tree.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub num: usize,
    /// `None` only on the root.
    pub condition: Option<Condition>,
    pub children: Vec<Node>,
    /// Branch taken by instances whose tested value is missing or unmatched.
    pub is_prioritized: bool,
    /// Set on leaves only.
    pub leaf_class: Option<String>,
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// An internal node whose children are all leaves.
    pub fn is_prune_ready(&self) -> bool {
        !self.children.is_empty() && self.children.iter().all(Node::is_leaf)
    }

    /// Attribute tested by this node's children.
    pub fn split_attribute(&self) -> Option<usize> {
        self.children
            .first()
            .and_then(|c| c.condition.as_ref())
            .map(Condition::attribute)
    }

    pub fn prioritized_child(&self) -> Option<&Node> {
        self.children.iter().find(|c| c.is_prioritized)
    }

    /// Number of nodes in this subtree, including itself.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Node::node_count).sum::<usize>()
    }

    pub fn leaf_count(&self) -> usize {
        if self.is_leaf() {
            1
        } else {
            self.children.iter().map(Node::leaf_count).sum()
        }
    }

    /// Depth of this subtree, a single leaf has depth 1.
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(Node::depth).max().unwrap_or(0)
    }

    pub fn leaves(&self) -> Vec<&Node> {
        if self.is_leaf() {
            vec![self]
        } else {
            self.children.iter().flat_map(Node::leaves).collect()
        }
    }
}

impl fmt::Display for Node {
    // This trait requires `fmt` with this exact signature.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let cond = self
            .condition
            .as_ref()
            .map_or_else(|| "root".to_string(), |c| c.to_string());
        let prio = if self.is_prioritized { "*" } else { "" };
        match &self.leaf_class {
            Some(c) if self.is_leaf() => write!(f, "{}:{}{} leaf={}", self.num, cond, prio, c),
            _ => write!(f, "{}:{}{} children={}", self.num, cond, prio, self.children.len()),
        }
    }
}

/// A node while the tree is grown, still holding the instances that reached it.
#[derive(Debug)]
pub struct SplittableNode<'a> {
    pub num: usize,
    pub depth: usize,
    pub condition: Option<Condition>,
    pub instances: Vec<WeightedInstance<'a>>,
    pub children: Vec<SplittableNode<'a>>,
    pub is_prioritized: bool,
    pub split_gain: f64,
}

impl<'a> SplittableNode<'a> {
    /// Create the root, which is a leaf until it is split.
    pub fn root(num: usize, instances: Vec<WeightedInstance<'a>>) -> Self {
        SplittableNode {
            num,
            depth: 1,
            condition: None,
            instances,
            children: Vec::new(),
            is_prioritized: false,
            split_gain: 0.0,
        }
    }

    /// Finish the subtree, labelling every leaf with the weighted majority
    /// class of its instances and dropping the instances.
    pub fn as_node(self, class_values: &[String]) -> Node {
        let leaf_class = if self.children.is_empty() {
            let majority = ClassWeights::from_instances(&self.instances, class_values.len()).majority();
            class_values.get(majority).cloned()
        } else {
            None
        };
        Node {
            num: self.num,
            condition: self.condition,
            children: self
                .children
                .into_iter()
                .map(|c| c.as_node(class_values))
                .collect(),
            is_prioritized: self.is_prioritized,
            leaf_class,
        }
    }
}
