//! Impurity
//!
//! Shannon entropy and information gain over weighted class distributions.
use crate::data::WeightedInstance;

/// Weighted class counts, indexed like the schema's class values.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassWeights {
    weights: Vec<f64>,
    total: f64,
}

impl ClassWeights {
    pub fn new(n_classes: usize) -> Self {
        ClassWeights {
            weights: vec![0.0; n_classes],
            total: 0.0,
        }
    }

    pub fn from_instances(instances: &[WeightedInstance], n_classes: usize) -> Self {
        let mut cw = ClassWeights::new(n_classes);
        instances.iter().for_each(|i| cw.add(i));
        cw
    }

    #[inline]
    pub fn add(&mut self, instance: &WeightedInstance) {
        self.weights[instance.class] += instance.weight;
        self.total += instance.weight;
    }

    #[inline]
    pub fn remove(&mut self, instance: &WeightedInstance) {
        self.weights[instance.class] -= instance.weight;
        self.total -= instance.weight;
    }

    /// Add all of `other`'s weights into `self`.
    pub fn merge(&mut self, other: &ClassWeights) {
        self.weights
            .iter_mut()
            .zip(other.weights.iter())
            .for_each(|(w, o)| *w += o);
        self.total += other.total;
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    /// Class with the largest weight, the first declared class wins ties.
    pub fn majority(&self) -> usize {
        let mut best = 0;
        for (i, w) in self.weights.iter().enumerate() {
            if *w > self.weights[best] {
                best = i;
            }
        }
        best
    }

    pub fn entropy(&self) -> f64 {
        entropy(&self.weights, self.total)
    }
}

/// Entropy in bits of a class distribution given its per-class weights and total.
pub fn entropy(weights: &[f64], total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    weights
        .iter()
        .map(|w| w / total)
        .filter(|p| *p > 0.0)
        .map(|p| -p * p.log2())
        .sum()
}

/// Entropy of a weighted instance set.
pub fn entropy_of(instances: &[WeightedInstance], n_classes: usize) -> f64 {
    ClassWeights::from_instances(instances, n_classes).entropy()
}

/// Information gain of a split.
///
/// * `parent_entropy` - Entropy of every instance at the node.
/// * `children` - Class weights of the non-missing instances sent to each child.
/// * `total_weight` - Weight at the node, including instances missing the tested value.
///
/// The gain is discounted by the fraction of weight whose value was known.
pub fn split_gain<'b, I>(parent_entropy: f64, children: I, total_weight: f64) -> f64
where
    I: IntoIterator<Item = &'b ClassWeights>,
{
    let (known, weighted_entropy) = children
        .into_iter()
        .fold((0.0, 0.0), |(k, e), c| (k + c.total(), e + c.total() * c.entropy()));
    if known <= 0.0 || total_weight <= 0.0 {
        return 0.0;
    }
    (parent_entropy - weighted_entropy / known) * known / total_weight
}
