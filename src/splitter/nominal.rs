use super::{prioritize_heaviest, Branch, SplitInfo, Splitter};
use crate::data::{sum_weights, Attribute, Value, WeightedInstance};
use crate::errors::DecisionTreeError;
use crate::impurity::{split_gain, ClassWeights};
use crate::node::Condition;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Instances sharing one or more categories.
#[derive(Debug, Clone)]
struct CategoryGroup<'a> {
    values: Vec<String>,
    instances: Vec<WeightedInstance<'a>>,
    class_weights: ClassWeights,
}

impl<'a> CategoryGroup<'a> {
    fn weight(&self) -> f64 {
        self.class_weights.total()
    }

    fn count(&self) -> usize {
        self.instances.len()
    }

    fn join(mut self, other: CategoryGroup<'a>) -> Self {
        self.values.extend(other.values);
        self.instances.extend(other.instances);
        self.class_weights.merge(&other.class_weights);
        self
    }

    /// Ascending by weight, then by category labels.
    fn order(&self, other: &Self) -> Ordering {
        self.weight()
            .total_cmp(&other.weight())
            .then_with(|| self.values.cmp(&other.values))
    }
}

/// Split search over a nominal attribute.
///
/// Two strategies are evaluated: a multi-way split with one branch per
/// observed category, and the best binary partition of the categories. When
/// there are more than `max_nominal_brute_force_scale` categories, the
/// lightest ones are merged before every bipartition is enumerated.
pub struct NominalSplitter {
    pub n_classes: usize,
    pub min_samples_leaf: usize,
    pub max_nominal_brute_force_scale: usize,
}

impl NominalSplitter {
    pub fn new(n_classes: usize, min_samples_leaf: usize, max_nominal_brute_force_scale: usize) -> Self {
        NominalSplitter {
            n_classes,
            min_samples_leaf,
            max_nominal_brute_force_scale,
        }
    }

    /// Group the known instances by category, ordered by label, and collect
    /// the instances missing the value.
    #[allow(clippy::type_complexity)]
    fn group_instances<'a>(
        &self,
        instances: &[WeightedInstance<'a>],
        index: usize,
        attribute: &Attribute,
    ) -> Result<(Vec<CategoryGroup<'a>>, Vec<WeightedInstance<'a>>), DecisionTreeError> {
        let mut groups: BTreeMap<&str, CategoryGroup<'a>> = BTreeMap::new();
        let mut missing = Vec::new();
        for wi in instances {
            match wi.instance.value(index) {
                Some(v) if v.is_missing() => missing.push(*wi),
                Some(Value::Categorical(c)) => {
                    let group = groups.entry(c.as_str()).or_insert_with(|| CategoryGroup {
                        values: vec![c.clone()],
                        instances: Vec::new(),
                        class_weights: ClassWeights::new(self.n_classes),
                    });
                    group.class_weights.add(wi);
                    group.instances.push(*wi);
                }
                Some(v) => {
                    return Err(DecisionTreeError::SplitComputationFailure(
                        attribute.name.clone(),
                        format!("expected a category, found '{}'", v),
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
        Ok((groups.into_values().collect(), missing))
    }

    fn satisfies_min_samples_leaf(&self, count: usize) -> bool {
        count >= self.min_samples_leaf
    }

    /// One branch per category.
    fn multi_way_split<'a>(
        &self,
        groups: &[CategoryGroup<'a>],
        parent_entropy: f64,
        total_weight: f64,
    ) -> Option<(f64, Vec<CategoryGroup<'a>>)> {
        if groups.len() < 2 || !groups.iter().all(|g| self.satisfies_min_samples_leaf(g.count())) {
            return None;
        }
        let gain = split_gain(parent_entropy, groups.iter().map(|g| &g.class_weights), total_weight);
        Some((gain, groups.to_vec()))
    }

    /// Merge the lightest groups until at most `max_nominal_brute_force_scale` remain.
    fn coarsen<'a>(&self, mut groups: Vec<CategoryGroup<'a>>) -> Vec<CategoryGroup<'a>> {
        groups.sort_by(CategoryGroup::order);
        while groups.len() > self.max_nominal_brute_force_scale.max(2) {
            let lightest = groups.remove(0);
            let second = groups.remove(0);
            groups.push(lightest.join(second));
            groups.sort_by(CategoryGroup::order);
        }
        groups
    }

    /// Best bipartition of the (coarsened) groups, by brute force over bitmasks.
    fn binary_split<'a>(
        &self,
        groups: Vec<CategoryGroup<'a>>,
        parent_entropy: f64,
        total_weight: f64,
    ) -> Option<(f64, Vec<CategoryGroup<'a>>)> {
        let groups = self.coarsen(groups);
        let k = groups.len();
        if k < 2 {
            return None;
        }

        // (gain, mask)
        let mut best: Option<(f64, usize)> = None;
        for mask in 1..(1_usize << k) - 1 {
            let mut left = ClassWeights::new(self.n_classes);
            let mut right = ClassWeights::new(self.n_classes);
            let (mut left_count, mut right_count) = (0, 0);
            for (j, g) in groups.iter().enumerate() {
                if mask & (1 << j) != 0 {
                    left.merge(&g.class_weights);
                    left_count += g.count();
                } else {
                    right.merge(&g.class_weights);
                    right_count += g.count();
                }
            }
            if !self.satisfies_min_samples_leaf(left_count) || !self.satisfies_min_samples_leaf(right_count) {
                continue;
            }
            let gain = split_gain(parent_entropy, [&left, &right], total_weight);
            if best.map_or(true, |(b, _)| gain > b) {
                best = Some((gain, mask));
            }
        }

        let (gain, mask) = best?;
        let mut left: Option<CategoryGroup<'a>> = None;
        let mut right: Option<CategoryGroup<'a>> = None;
        for (j, g) in groups.into_iter().enumerate() {
            let side = if mask & (1 << j) != 0 { &mut left } else { &mut right };
            *side = Some(match side.take() {
                Some(acc) => acc.join(g),
                None => g,
            });
        }
        Some((gain, vec![left?, right?]))
    }
}

impl Splitter for NominalSplitter {
    fn best_split<'a>(
        &self,
        instances: &[WeightedInstance<'a>],
        index: usize,
        attribute: &Attribute,
        parent_entropy: f64,
    ) -> Result<Option<SplitInfo<'a>>, DecisionTreeError> {
        if instances.is_empty() {
            return Ok(None);
        }
        let (groups, missing) = self.group_instances(instances, index, attribute)?;
        let total_weight = sum_weights(instances);

        let mut best: Option<(f64, Vec<CategoryGroup<'a>>)> = None;
        for candidate in [
            self.multi_way_split(&groups, parent_entropy, total_weight),
            self.binary_split(groups.clone(), parent_entropy, total_weight),
        ]
        .into_iter()
        .flatten()
        {
            if candidate.0 > best.as_ref().map_or(0.0, |b| b.0) {
                best = Some(candidate);
            }
        }
        let Some((gain, groups)) = best else {
            return Ok(None);
        };

        let known_weight: f64 = groups.iter().map(CategoryGroup::weight).sum();
        let mut branches: Vec<Branch<'a>> = groups
            .into_iter()
            .map(|g| {
                let share = g.weight() / known_weight;
                let mut instances = g.instances;
                instances.extend(missing.iter().map(|wi| wi.scaled(share)));
                Branch {
                    condition: Condition::IsOneOf {
                        attribute: index,
                        values: g.values,
                    },
                    instances,
                    is_prioritized: false,
                }
            })
            .collect();
        prioritize_heaviest(&mut branches);

        Ok(Some(SplitInfo { gain, branches }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{weights_match, Instance};
    use crate::impurity::entropy_of;

    fn build(rows: &[(&str, &str)]) -> Vec<Instance> {
        rows.iter()
            .map(|(v, c)| {
                let value = if *v == "?" { Value::Missing } else { (*v).into() };
                Instance::new(vec![value], (*c).into())
            })
            .collect()
    }

    fn weighted(data: &[Instance]) -> Vec<WeightedInstance> {
        data.iter()
            .map(|i| WeightedInstance::new(i, if i.class_label() == Some("A") { 0 } else { 1 }))
            .collect()
    }

    fn values_of(branch: &Branch) -> Vec<String> {
        match &branch.condition {
            Condition::IsOneOf { values, .. } => values.clone(),
            c => panic!("unexpected condition {}", c),
        }
    }

    #[test]
    fn test_multi_way_split() {
        let data = build(&[("x", "A"), ("x", "A"), ("y", "B"), ("y", "B"), ("z", "A"), ("z", "B")]);
        let wis = weighted(&data);
        let attr = Attribute::nominal("cat", ["x", "y", "z"]);
        let split = NominalSplitter::new(2, 1, 8)
            .best_split(&wis, 0, &attr, entropy_of(&wis, 2))
            .unwrap()
            .unwrap();
        // Both strategies separate x and y, the binary split is not strictly better.
        assert_eq!(split.branches.len(), 3);
        assert_eq!(values_of(&split.branches[0]), vec!["x".to_string()]);
        assert_eq!(split.branches.iter().filter(|b| b.is_prioritized).count(), 1);
        assert!(split.branches[0].is_prioritized);
    }

    #[test]
    fn test_min_samples_leaf_respected() {
        let data = build(&[("x", "A"), ("x", "A"), ("x", "A"), ("y", "B"), ("z", "B"), ("z", "A")]);
        let wis = weighted(&data);
        let attr = Attribute::nominal("cat", ["x", "y", "z"]);
        let splitter = NominalSplitter::new(2, 2, 8);
        let split = splitter
            .best_split(&wis, 0, &attr, entropy_of(&wis, 2))
            .unwrap()
            .unwrap();
        assert_eq!(split.branches.len(), 2);
        for b in &split.branches {
            assert!(b.instances.len() >= 2);
        }
        // y alone is too small, so it travels with another category.
        let y_branch = split
            .branches
            .iter()
            .find(|b| values_of(b).contains(&"y".to_string()))
            .unwrap();
        assert!(values_of(y_branch).len() >= 2);
    }

    #[test]
    fn test_lightest_categories_merged_before_brute_force() {
        // Weights: a=1, b=2, c=3, d=4, e=5; a and b are merged first.
        let mut rows = vec![("a", "B"), ("b", "A"), ("b", "A")];
        rows.extend([("c", "B"); 3]);
        rows.extend([("d", "A"); 4]);
        rows.extend([("e", "B"); 5]);
        let data = build(&rows);
        let wis = weighted(&data);
        let attr = Attribute::nominal("cat", ["a", "b", "c", "d", "e"]);
        let splitter = NominalSplitter::new(2, 1, 4);

        let (groups, _) = splitter.group_instances(&wis, 0, &attr).unwrap();
        let coarse = splitter.coarsen(groups.clone());
        assert_eq!(coarse.len(), 4);
        // The merged pair ties with c on weight and sorts first by label.
        assert_eq!(coarse[0].values, vec!["a".to_string(), "b".to_string()]);

        let (_, binary) = splitter
            .binary_split(groups, entropy_of(&wis, 2), sum_weights(&wis))
            .unwrap();
        let together = binary
            .iter()
            .any(|g| g.values.contains(&"a".to_string()) && g.values.contains(&"b".to_string()));
        assert!(together);
    }

    #[test]
    fn test_missing_distributed_by_share() {
        let data = build(&[("x", "A"), ("x", "A"), ("x", "A"), ("y", "B"), ("?", "A"), ("?", "B")]);
        let wis = weighted(&data);
        let attr = Attribute::nominal("cat", ["x", "y"]);
        let split = NominalSplitter::new(2, 1, 8)
            .best_split(&wis, 0, &attr, entropy_of(&wis, 2))
            .unwrap()
            .unwrap();
        let total: f64 = split.branches.iter().map(Branch::weight).sum();
        assert!(weights_match(total, 6.0));
        assert!(weights_match(split.branches[0].weight(), 3.0 + 2.0 * 0.75));
        assert_eq!(split.branches[0].instances.len(), 5);
    }

    #[test]
    fn test_single_category_gives_no_split() {
        let data = build(&[("x", "A"), ("x", "B")]);
        let wis = weighted(&data);
        let attr = Attribute::nominal("cat", ["x"]);
        let res = NominalSplitter::new(2, 1, 8)
            .best_split(&wis, 0, &attr, entropy_of(&wis, 2))
            .unwrap();
        assert!(res.is_none());
    }
}
