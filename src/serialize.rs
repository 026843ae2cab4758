//! Serialize
//!
//! Persisted JSON form of a fitted tree. Conditions refer to their attribute
//! by index into the shared attribute list stored next to the root node.
use crate::config::JsonIO;
use crate::data::{Attribute, AttributeKind};
use crate::errors::DecisionTreeError;
use crate::node::{Condition, Node};
use crate::tree::Tree;
use hashbrown::HashSet;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistentAttributeKind {
    Continuous,
    Nominal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistentAttribute {
    pub name: String,
    pub kind: PersistentAttributeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PersistentConditionKind {
    #[serde(rename = "lt")]
    LessThan,
    #[serde(rename = "ge")]
    GreaterThanEq,
    #[serde(rename = "range")]
    Range,
    #[serde(rename = "is_one_of")]
    IsOneOf,
}

/// `lt` keeps its threshold in `upper`, `ge` in `lower`, `range` uses both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistentCondition {
    pub kind: PersistentConditionKind,
    pub attr_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted_values: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistentNode {
    pub uniq_id: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<PersistentCondition>,
    #[serde(default)]
    pub children: Vec<PersistentNode>,
    #[serde(default)]
    pub is_prioritized: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leaf_class: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistentTree {
    pub attributes: Vec<PersistentAttribute>,
    pub root_node: PersistentNode,
}

impl JsonIO for PersistentTree {}

impl From<&Attribute> for PersistentAttribute {
    fn from(attribute: &Attribute) -> Self {
        let kind = match attribute.kind {
            AttributeKind::Continuous => PersistentAttributeKind::Continuous,
            AttributeKind::Nominal(_) => PersistentAttributeKind::Nominal,
        };
        PersistentAttribute {
            name: attribute.name.clone(),
            kind,
        }
    }
}

impl From<&Condition> for PersistentCondition {
    fn from(condition: &Condition) -> Self {
        let (kind, upper, lower, accepted_values) = match condition {
            Condition::LessThan { threshold, .. } => (PersistentConditionKind::LessThan, Some(*threshold), None, None),
            Condition::GreaterThanEq { threshold, .. } => {
                (PersistentConditionKind::GreaterThanEq, None, Some(*threshold), None)
            }
            Condition::Range { low, high, .. } => (PersistentConditionKind::Range, Some(*high), Some(*low), None),
            Condition::IsOneOf { values, .. } => (PersistentConditionKind::IsOneOf, None, None, Some(values.clone())),
        };
        PersistentCondition {
            kind,
            attr_index: condition.attribute(),
            upper,
            lower,
            accepted_values,
        }
    }
}

impl From<&Node> for PersistentNode {
    fn from(node: &Node) -> Self {
        PersistentNode {
            uniq_id: node.num,
            condition: node.condition.as_ref().map(PersistentCondition::from),
            children: node.children.iter().map(PersistentNode::from).collect(),
            is_prioritized: node.is_prioritized,
            leaf_class: node.leaf_class.clone(),
        }
    }
}

impl From<&Tree> for PersistentTree {
    fn from(tree: &Tree) -> Self {
        PersistentTree {
            attributes: tree.attributes.iter().map(PersistentAttribute::from).collect(),
            root_node: PersistentNode::from(&tree.root),
        }
    }
}

fn failure<T>(msg: String) -> Result<T, DecisionTreeError> {
    Err(DecisionTreeError::DeserializationFailure(msg))
}

fn to_attribute(attribute: &PersistentAttribute) -> Attribute {
    match attribute.kind {
        PersistentAttributeKind::Continuous => Attribute::continuous(attribute.name.as_str()),
        // Accepted values are not persisted.
        PersistentAttributeKind::Nominal => Attribute::nominal(attribute.name.as_str(), Vec::<String>::new()),
    }
}

fn to_condition(condition: &PersistentCondition, attributes: &[Attribute]) -> Result<Condition, DecisionTreeError> {
    let attribute = condition.attr_index;
    let Some(attr) = attributes.get(attribute) else {
        return failure(format!(
            "attribute index {} out of range, the tree has {} attributes",
            attribute,
            attributes.len()
        ));
    };
    let expects_continuous = !matches!(condition.kind, PersistentConditionKind::IsOneOf);
    if attr.is_continuous() != expects_continuous {
        return failure(format!(
            "condition {:?} does not apply to attribute {}",
            condition.kind, attr.name
        ));
    }
    match (condition.kind, condition.upper, condition.lower, &condition.accepted_values) {
        (PersistentConditionKind::LessThan, Some(threshold), _, _) => Ok(Condition::LessThan { attribute, threshold }),
        (PersistentConditionKind::GreaterThanEq, _, Some(threshold), _) => {
            Ok(Condition::GreaterThanEq { attribute, threshold })
        }
        (PersistentConditionKind::IsOneOf, _, _, Some(values)) => Ok(Condition::IsOneOf {
            attribute,
            values: values.clone(),
        }),
        (PersistentConditionKind::Range, ..) => failure("range conditions cannot be read back".to_string()),
        (kind, ..) => failure(format!("condition {:?} on attribute {} is missing its bounds", kind, attr.name)),
    }
}

fn to_node(
    node: &PersistentNode,
    attributes: &[Attribute],
    is_root: bool,
    seen: &mut HashSet<usize>,
) -> Result<Node, DecisionTreeError> {
    if !seen.insert(node.uniq_id) {
        return failure(format!("duplicate node id {}", node.uniq_id));
    }
    let condition = match (&node.condition, is_root) {
        (None, true) => None,
        (Some(c), false) => Some(to_condition(c, attributes)?),
        (Some(_), true) => return failure("root node carries a condition".to_string()),
        (None, false) => return failure(format!("node {} has no condition", node.uniq_id)),
    };
    if node.children.is_empty() {
        if node.leaf_class.is_none() {
            return failure(format!("leaf {} has no class", node.uniq_id));
        }
    } else {
        let prioritized = node.children.iter().filter(|c| c.is_prioritized).count();
        if prioritized != 1 {
            return failure(format!(
                "node {} has {} prioritized children, expected 1",
                node.uniq_id, prioritized
            ));
        }
        // Routing reads the tested attribute from the first child.
        let mut tested = node.children.iter().filter_map(|c| c.condition.as_ref().map(|c| c.attr_index));
        if let Some(first) = tested.next() {
            if tested.any(|a| a != first) {
                return failure(format!("children of node {} test different attributes", node.uniq_id));
            }
        }
    }
    let children = node
        .children
        .iter()
        .map(|c| to_node(c, attributes, false, seen))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Node {
        num: node.uniq_id,
        condition,
        leaf_class: if children.is_empty() { node.leaf_class.clone() } else { None },
        children,
        is_prioritized: node.is_prioritized,
    })
}

impl TryFrom<&PersistentTree> for Tree {
    type Error = DecisionTreeError;

    fn try_from(persisted: &PersistentTree) -> Result<Self, Self::Error> {
        let attributes: Vec<Attribute> = persisted.attributes.iter().map(to_attribute).collect();
        let root = to_node(&persisted.root_node, &attributes, true, &mut HashSet::new())?;
        Ok(Tree { attributes, root })
    }
}

impl Tree {
    /// Dump the tree as a json object.
    pub fn json_dump(&self) -> Result<String, DecisionTreeError> {
        PersistentTree::from(self).json_dump()
    }

    /// Load a tree from a json string.
    pub fn from_json(json_str: &str) -> Result<Self, DecisionTreeError> {
        Tree::try_from(&PersistentTree::from_json(json_str)?)
    }

    /// Save the tree as a json object to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), DecisionTreeError> {
        PersistentTree::from(self).save(path)
    }

    /// Load a tree from a json file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DecisionTreeError> {
        Tree::try_from(&PersistentTree::load(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Instance, Value};
    use tempfile::tempdir;

    fn leaf(num: usize, class: &str, prio: bool, condition: Condition) -> Node {
        Node {
            num,
            condition: Some(condition),
            children: Vec::new(),
            is_prioritized: prio,
            leaf_class: Some(class.to_string()),
        }
    }

    /// x < 2.5 -> A, otherwise color in {blue} -> B, color in {red} -> A
    fn tree() -> Tree {
        let right = Node {
            num: 2,
            condition: Some(Condition::GreaterThanEq { attribute: 0, threshold: 2.5 }),
            children: vec![
                leaf(3, "B", true, Condition::IsOneOf { attribute: 1, values: vec!["blue".to_string()] }),
                leaf(4, "A", false, Condition::IsOneOf { attribute: 1, values: vec!["red".to_string()] }),
            ],
            is_prioritized: false,
            leaf_class: None,
        };
        Tree {
            attributes: vec![Attribute::continuous("x"), Attribute::nominal("color", ["red", "blue"])],
            root: Node {
                num: 0,
                condition: None,
                children: vec![leaf(1, "A", true, Condition::LessThan { attribute: 0, threshold: 2.5 }), right],
                is_prioritized: false,
                leaf_class: None,
            },
        }
    }

    fn queries() -> Vec<Instance> {
        vec![
            Instance::new(vec![Value::Numeric(1.0), "blue".into()], Value::Missing),
            Instance::new(vec![Value::Numeric(3.0), "blue".into()], Value::Missing),
            Instance::new(vec![Value::Numeric(3.0), "red".into()], Value::Missing),
            Instance::new(vec![Value::Numeric(3.0), Value::Missing], Value::Missing),
            Instance::new(vec![Value::Missing, "red".into()], Value::Missing),
        ]
    }

    #[test]
    fn test_round_trip_preserves_predictions() {
        let tree = tree();
        let json = tree.json_dump().unwrap();
        let loaded = Tree::from_json(&json).unwrap();
        assert_eq!(loaded.root, tree.root);
        assert_eq!(loaded.attributes[0], tree.attributes[0]);
        assert_eq!(loaded.attributes[1].name, "color");
        assert_eq!(
            loaded.predict_batch(&queries(), false).unwrap(),
            tree.predict_batch(&queries(), false).unwrap()
        );
    }

    #[test]
    fn test_persisted_layout() {
        let json = tree().json_dump().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["attributes"][1]["kind"], "nominal");
        let first = &value["root_node"]["children"][0];
        assert_eq!(first["condition"]["kind"], "lt");
        assert_eq!(first["condition"]["upper"], 2.5);
        assert_eq!(first["leaf_class"], "A");
        assert!(value["root_node"].get("condition").is_none());
        assert!(value["root_node"].get("leaf_class").is_none());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tree.json");
        let tree = tree();
        tree.save(&path).unwrap();
        assert_eq!(Tree::load(&path).unwrap().root, tree.root);
    }

    #[test]
    fn test_range_is_not_read_back() {
        let mut tree = tree();
        tree.root.children[0].condition = Some(Condition::Range { attribute: 0, low: 0.0, high: 2.5 });
        let json = tree.json_dump().unwrap();
        assert!(json.contains("\"range\""));
        assert!(matches!(
            Tree::from_json(&json),
            Err(DecisionTreeError::DeserializationFailure(_))
        ));
    }

    #[test]
    fn test_invalid_trees_are_rejected() {
        let mut persisted = PersistentTree::from(&tree());
        persisted.root_node.children[0].condition.as_mut().unwrap().attr_index = 7;
        assert!(matches!(
            Tree::try_from(&persisted),
            Err(DecisionTreeError::DeserializationFailure(_))
        ));

        let mut persisted = PersistentTree::from(&tree());
        persisted.root_node.children[1].is_prioritized = true;
        assert!(Tree::try_from(&persisted).is_err());

        let mut persisted = PersistentTree::from(&tree());
        persisted.root_node.children[0].leaf_class = None;
        assert!(Tree::try_from(&persisted).is_err());

        let mut persisted = PersistentTree::from(&tree());
        persisted.root_node.children[1].children[0].uniq_id = 1;
        assert!(Tree::try_from(&persisted).is_err());

        // Siblings splitting on different attributes.
        let mut persisted = PersistentTree::from(&tree());
        persisted.root_node.children[1].condition = Some(PersistentCondition {
            kind: PersistentConditionKind::IsOneOf,
            attr_index: 1,
            upper: None,
            lower: None,
            accepted_values: Some(vec!["red".to_string()]),
        });
        assert!(matches!(
            Tree::try_from(&persisted),
            Err(DecisionTreeError::DeserializationFailure(_))
        ));

        assert!(matches!(Tree::from_json("{}"), Err(DecisionTreeError::UnableToRead(_))));
    }
}
