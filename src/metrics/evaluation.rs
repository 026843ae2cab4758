use crate::constants::PESSIMISTIC_LEAF_PENALTY;
use crate::data::Instance;
use crate::errors::DecisionTreeError;
use crate::node::Node;
use crate::tree::Tree;
use crate::utils::ratio;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::{self, Display};

/// Continuity corrected error estimate of a subtree with `leaves` leaves
/// misclassifying `errors` of `total` instances. An empty set counts as one
/// instance so the leaf penalty still applies.
pub fn pessimistic_error(errors: usize, leaves: usize, total: usize) -> f64 {
    let total = total.max(1) as f64;
    (errors as f64 + leaves as f64 * PESSIMISTIC_LEAF_PENALTY) / total
}

/// Results of running a tree, or a subtree, over a labeled instance set.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct TestResults {
    pub total: usize,
    pub correct: usize,
    pub errors: usize,
    pub accuracy: f64,
    pub class_data_count: BTreeMap<String, usize>,
    pub class_predicted_count: BTreeMap<String, usize>,
    pub class_correct_count: BTreeMap<String, usize>,
    pub class_error_count: BTreeMap<String, usize>,
    pub recall: BTreeMap<String, f64>,
    pub precision: BTreeMap<String, f64>,
    /// actual class -> predicted class -> count
    pub confusion_matrix: BTreeMap<String, BTreeMap<String, usize>>,
    pub pessimistic_error: f64,
}

/// Evaluate the subtree under `node` on `instances`. Instances with a missing
/// class value are skipped.
pub fn evaluate_node<'i, I>(node: &Node, instances: I) -> Result<TestResults, DecisionTreeError>
where
    I: IntoIterator<Item = &'i Instance>,
{
    let mut res = TestResults::default();
    for instance in instances {
        let Some(actual) = instance.class_label() else {
            continue;
        };
        let predicted = node.predict(instance)?;
        res.total += 1;
        *res.class_data_count.entry(actual.to_string()).or_default() += 1;
        *res.class_predicted_count.entry(predicted.to_string()).or_default() += 1;
        *res.confusion_matrix
            .entry(actual.to_string())
            .or_default()
            .entry(predicted.to_string())
            .or_default() += 1;
        if predicted == actual {
            res.correct += 1;
            *res.class_correct_count.entry(actual.to_string()).or_default() += 1;
        } else {
            res.errors += 1;
            *res.class_error_count.entry(actual.to_string()).or_default() += 1;
        }
    }

    res.accuracy = ratio(res.correct, res.total);
    for (class, count) in &res.class_data_count {
        let correct = res.class_correct_count.get(class).copied().unwrap_or(0);
        res.recall.insert(class.clone(), ratio(correct, *count));
    }
    for (class, count) in &res.class_predicted_count {
        let correct = res.class_correct_count.get(class).copied().unwrap_or(0);
        res.precision.insert(class.clone(), ratio(correct, *count));
    }
    res.pessimistic_error = pessimistic_error(res.errors, node.leaf_count(), res.total);
    Ok(res)
}

impl Tree {
    /// Evaluate the whole tree on a labeled instance set.
    pub fn test_run(&self, instances: &[Instance]) -> Result<TestResults, DecisionTreeError> {
        evaluate_node(&self.root, instances)
    }
}

impl Display for TestResults {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "Instances: {}, correct: {}, errors: {}",
            self.total, self.correct, self.errors
        )?;
        writeln!(f, "Accuracy: {:.4}", self.accuracy)?;
        writeln!(f, "Pessimistic error: {:.4}", self.pessimistic_error)?;
        for (class, count) in &self.class_data_count {
            writeln!(
                f,
                "  {}: {} instances, recall {:.4}, precision {:.4}",
                class,
                count,
                self.recall.get(class).copied().unwrap_or(0.0),
                self.precision.get(class).copied().unwrap_or(0.0),
            )?;
        }
        writeln!(f, "Confusion matrix (actual -> predicted):")?;
        for (actual, row) in &self.confusion_matrix {
            let cells: Vec<String> = row.iter().map(|(p, n)| format!("{}={}", p, n)).collect();
            writeln!(f, "  {}: {}", actual, cells.join(", "))?;
        }
        Ok(())
    }
}
