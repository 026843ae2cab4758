//! Data
//!
//! Attributes, values and instances handed to the tree builder by a loader,
//! and the weighted instance fragments used while growing and pruning.
use crate::constants::{MISSING_TOKEN, WEIGHT_EPS};
use crate::errors::DecisionTreeError;
use crate::utils::items_to_strings;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Kind of an attribute, nominal attributes carry their accepted values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeKind {
    Continuous,
    Nominal(Vec<String>),
}

/// A named attribute of the data set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub kind: AttributeKind,
}

impl Attribute {
    /// Create a continuous attribute.
    pub fn continuous<S: Into<String>>(name: S) -> Self {
        Attribute {
            name: name.into(),
            kind: AttributeKind::Continuous,
        }
    }

    /// Create a nominal attribute accepting `values`, in declaration order.
    pub fn nominal<S, I, V>(name: S, values: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Attribute {
            name: name.into(),
            kind: AttributeKind::Nominal(values.into_iter().map(Into::into).collect()),
        }
    }

    pub fn is_continuous(&self) -> bool {
        matches!(self.kind, AttributeKind::Continuous)
    }

    /// Accepted values of a nominal attribute, empty for continuous ones.
    pub fn accepted_values(&self) -> &[String] {
        match &self.kind {
            AttributeKind::Continuous => &[],
            AttributeKind::Nominal(values) => values,
        }
    }

    /// Parse a raw token into a value of this attribute.
    ///
    /// * `raw` - The token, surrounding whitespace is ignored and `?` means missing.
    /// * `invalid_as_missing` - Turn unparsable numbers and unknown categories
    ///   into missing values instead of failing.
    pub fn parse(&self, raw: &str, invalid_as_missing: bool) -> Result<Value, DecisionTreeError> {
        let raw = raw.trim();
        if raw == MISSING_TOKEN {
            return Ok(Value::Missing);
        }
        let parsed = match &self.kind {
            AttributeKind::Continuous => raw
                .parse::<f64>()
                .map(Value::Numeric)
                .map_err(|e| e.to_string()),
            AttributeKind::Nominal(values) => {
                if values.iter().any(|v| v == raw) {
                    Ok(Value::Categorical(raw.to_string()))
                } else {
                    Err(format!("expected one of {}", items_to_strings(values)))
                }
            }
        };
        match parsed {
            Ok(v) => Ok(v),
            Err(_) if invalid_as_missing => Ok(Value::Missing),
            Err(msg) => Err(DecisionTreeError::ParseValue(raw.to_string(), self.name.clone(), msg)),
        }
    }
}

/// A single observed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Numeric(f64),
    Categorical(String),
    Missing,
}

impl Value {
    /// A numeric NaN counts as missing.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Missing => true,
            Value::Numeric(v) => v.is_nan(),
            Value::Categorical(_) => false,
        }
    }

    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            Value::Numeric(v) if !v.is_nan() => Some(*v),
            _ => None,
        }
    }

    pub fn as_category(&self) -> Option<&str> {
        match self {
            Value::Categorical(v) => Some(v),
            _ => None,
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Numeric(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Categorical(v.to_string())
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Numeric(v) if !v.is_nan() => write!(f, "{}", v),
            Value::Categorical(v) => write!(f, "{}", v),
            _ => write!(f, "{}", MISSING_TOKEN),
        }
    }
}

/// A row of the data set. `values` is aligned with the schema's feature attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub values: Vec<Value>,
    pub class: Value,
}

impl Instance {
    pub fn new(values: Vec<Value>, class: Value) -> Self {
        Instance { values, class }
    }

    /// Class label, `None` when the class value is missing.
    pub fn class_label(&self) -> Option<&str> {
        self.class.as_category()
    }

    /// Value of the feature at `index`.
    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }
}

impl Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for v in &self.values {
            write!(f, "{}, ", v)?;
        }
        write!(f, "{}", self.class)
    }
}

/// Ordered feature attributes plus the nominal class attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    features: Vec<Attribute>,
    class: Attribute,
}

impl Schema {
    pub fn new(features: Vec<Attribute>, class: Attribute) -> Result<Self, DecisionTreeError> {
        match &class.kind {
            AttributeKind::Continuous => Err(DecisionTreeError::InvalidSchema(format!(
                "class attribute {} must be nominal",
                class.name
            ))),
            AttributeKind::Nominal(values) if values.is_empty() => Err(DecisionTreeError::InvalidSchema(
                format!("class attribute {} has no accepted values", class.name),
            )),
            AttributeKind::Nominal(_) => Ok(Schema { features, class }),
        }
    }

    pub fn features(&self) -> &[Attribute] {
        &self.features
    }

    pub fn class(&self) -> &Attribute {
        &self.class
    }

    /// Class labels in declaration order.
    pub fn class_values(&self) -> &[String] {
        self.class.accepted_values()
    }

    pub fn n_classes(&self) -> usize {
        self.class_values().len()
    }

    /// Position of `label` among the class values.
    pub fn class_index(&self, label: &str) -> Option<usize> {
        self.class_values().iter().position(|c| c == label)
    }
}

/// An instance, or a fraction of one, reaching a node during construction.
#[derive(Debug, Clone, Copy)]
pub struct WeightedInstance<'a> {
    pub instance: &'a Instance,
    /// Index of the instance's class among the schema's class values.
    pub class: usize,
    pub weight: f64,
}

impl<'a> WeightedInstance<'a> {
    pub fn new(instance: &'a Instance, class: usize) -> Self {
        WeightedInstance {
            instance,
            class,
            weight: 1.0,
        }
    }

    /// A fragment carrying `scale` of this instance's weight.
    pub fn scaled(&self, scale: f64) -> Self {
        WeightedInstance {
            weight: self.weight * scale,
            ..*self
        }
    }
}

/// Sum of the weights of a set of weighted instances.
pub fn sum_weights(instances: &[WeightedInstance]) -> f64 {
    instances.iter().map(|i| i.weight).sum()
}

/// Compare two summed weights allowing for floating point drift.
pub fn weights_match(a: f64, b: f64) -> bool {
    (a - b).abs() <= WEIGHT_EPS * a.abs().max(b.abs()).max(1.0)
}
