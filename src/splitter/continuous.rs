use super::{prioritize_heaviest, Branch, SplitInfo, Splitter};
use crate::data::{sum_weights, Attribute, Value, WeightedInstance};
use crate::errors::DecisionTreeError;
use crate::impurity::{split_gain, ClassWeights};
use crate::node::Condition;

/// Threshold search over a continuous attribute.
///
/// Instances are sorted by value and scanned once, moving one instance at a
/// time from the right partition to the left one. Every midpoint between two
/// distinct adjacent values is a candidate threshold.
pub struct ContinuousSplitter {
    pub n_classes: usize,
}

impl ContinuousSplitter {
    pub fn new(n_classes: usize) -> Self {
        ContinuousSplitter { n_classes }
    }
}

impl Splitter for ContinuousSplitter {
    fn best_split<'a>(
        &self,
        instances: &[WeightedInstance<'a>],
        index: usize,
        attribute: &Attribute,
        parent_entropy: f64,
    ) -> Result<Option<SplitInfo<'a>>, DecisionTreeError> {
        let mut known: Vec<(f64, WeightedInstance<'a>)> = Vec::with_capacity(instances.len());
        let mut missing = Vec::new();
        for wi in instances {
            match wi.instance.value(index) {
                Some(v) if v.is_missing() => missing.push(*wi),
                Some(Value::Numeric(x)) => known.push((*x, *wi)),
                Some(v) => {
                    return Err(DecisionTreeError::SplitComputationFailure(
                        attribute.name.clone(),
                        format!("expected a numeric value, found '{}'", v),
                    ))
                }
                None => {
                    return Err(DecisionTreeError::SplitComputationFailure(
                        attribute.name.clone(),
                        format!("instance has only {} values", wi.instance.values.len()),
                    ))
                }
            }
        }

        if known.len() < 2 {
            return Ok(None);
        }

        // Stable, so equal values keep their input order.
        known.sort_by(|a, b| a.0.total_cmp(&b.0));

        let total_weight = sum_weights(instances);
        let mut left = ClassWeights::new(self.n_classes);
        let mut right = ClassWeights::new(self.n_classes);
        known.iter().for_each(|(_, wi)| right.add(wi));

        // (gain, split point, threshold)
        let mut best: Option<(f64, usize, f64)> = None;
        for i in 1..known.len() {
            let (v1, moved) = &known[i - 1];
            left.add(moved);
            right.remove(moved);

            let v2 = known[i].0;
            if *v1 >= v2 {
                continue;
            }
            let threshold = v1 + (v2 - v1) / 2.0;
            // Adjacent floats can round the midpoint onto an observed value.
            if !(*v1 < threshold && threshold < v2) {
                continue;
            }

            let gain = split_gain(parent_entropy, [&left, &right], total_weight);
            if gain > best.map_or(0.0, |b| b.0) {
                best = Some((gain, i, threshold));
            }
        }

        let Some((gain, point, threshold)) = best else {
            return Ok(None);
        };

        let mut left_instances: Vec<WeightedInstance<'a>> = known[..point].iter().map(|(_, wi)| *wi).collect();
        let mut right_instances: Vec<WeightedInstance<'a>> = known[point..].iter().map(|(_, wi)| *wi).collect();
        let left_weight = sum_weights(&left_instances);
        let right_weight = sum_weights(&right_instances);
        let known_weight = left_weight + right_weight;
        for wi in &missing {
            left_instances.push(wi.scaled(left_weight / known_weight));
            right_instances.push(wi.scaled(right_weight / known_weight));
        }

        let mut branches = vec![
            Branch {
                condition: Condition::LessThan {
                    attribute: index,
                    threshold,
                },
                instances: left_instances,
                is_prioritized: false,
            },
            Branch {
                condition: Condition::GreaterThanEq {
                    attribute: index,
                    threshold,
                },
                instances: right_instances,
                is_prioritized: false,
            },
        ];
        prioritize_heaviest(&mut branches);

        Ok(Some(SplitInfo { gain, branches }))
    }
}
