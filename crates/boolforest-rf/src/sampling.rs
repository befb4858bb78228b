//! Per-tree randomized feature and record subsampling.

use std::collections::BTreeSet;

use rand::Rng;
use rand::seq::index;

use crate::config::ForestConfig;
use crate::node::FeatureIndex;

const FLOOR_TOLERANCE: f64 = 1e-9;

/// Sizes fixed once per forest from the feature and record counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SamplingPlan {
    /// Number of features each tree may split on.
    pub feature_subset_size: usize,
    /// Number of record draws (with replacement) per tree.
    pub sample_size: usize,
}

impl SamplingPlan {
    /// Resolve the plan for a dataset of the given shape.
    ///
    /// The sample size is `floor(sample_fraction · n_records)`, computed with
    /// a small tolerance so that `2/3 · 3k` lands on `2k`.
    #[must_use]
    pub fn resolve(config: &ForestConfig, n_features: usize, n_records: usize) -> Self {
        let draws = (config.sample_fraction * n_records as f64 + FLOOR_TOLERANCE).floor();
        Self {
            feature_subset_size: config.max_features.resolve(n_features),
            sample_size: (draws as usize).min(n_records),
        }
    }
}

/// Draw `k` distinct feature indices uniformly from `0..n_features`.
///
/// `k` is clamped to `n_features`.
pub fn select_features(n_features: usize, k: usize, rng: &mut impl Rng) -> BTreeSet<FeatureIndex> {
    index::sample(rng, n_features, k.min(n_features))
        .into_iter()
        .map(FeatureIndex::new)
        .collect()
}

/// Draw `draw_count` record positions with replacement, and return them with
/// the held-out positions that were never drawn.
pub fn bootstrap_sample(
    n_records: usize,
    draw_count: usize,
    rng: &mut impl Rng,
) -> (Vec<usize>, Vec<usize>) {
    if n_records == 0 {
        return (Vec::new(), Vec::new());
    }
    let mut in_bag = vec![false; n_records];
    let mut bootstrap_indices = Vec::with_capacity(draw_count);
    for _ in 0..draw_count {
        let idx = rng.gen_range(0..n_records);
        bootstrap_indices.push(idx);
        in_bag[idx] = true;
    }
    let held_out: Vec<usize> = (0..n_records).filter(|&i| !in_bag[i]).collect();
    (bootstrap_indices, held_out)
}

/// Everything one training round draws before growing its tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeSample {
    /// Features the tree may split on.
    pub features: BTreeSet<FeatureIndex>,
    /// Record positions to train on (may repeat).
    pub in_bag: Vec<usize>,
    /// Record positions never drawn this round.
    pub held_out: Vec<usize>,
}

impl TreeSample {
    /// Draw a fresh feature subset and record sample.
    ///
    /// Features are drawn first, then records, from the same generator.
    pub fn draw(
        plan: &SamplingPlan,
        n_features: usize,
        n_records: usize,
        rng: &mut impl Rng,
    ) -> Self {
        let features = select_features(n_features, plan.feature_subset_size, rng);
        let (in_bag, held_out) = bootstrap_sample(n_records, plan.sample_size, rng);
        Self {
            features,
            in_bag,
            held_out,
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::config::MaxFeatures;

    #[test]
    fn plan_matches_default_sizes() {
        let config = ForestConfig::new(10).unwrap();
        let plan = SamplingPlan::resolve(&config, 5, 100);
        assert_eq!(plan.feature_subset_size, 2);
        assert_eq!(plan.sample_size, 66);

        let plan = SamplingPlan::resolve(&config, 16, 3);
        assert_eq!(plan.feature_subset_size, 4);
        assert_eq!(plan.sample_size, 2);

        for k in 1..200 {
            let plan = SamplingPlan::resolve(&config, 1, 3 * k);
            assert_eq!(plan.sample_size, 2 * k);
        }

        let plan = SamplingPlan::resolve(&config, 0, 1);
        assert_eq!(plan.feature_subset_size, 0);
        assert_eq!(plan.sample_size, 0);
    }

    #[test]
    fn plan_honours_overrides() {
        let config = ForestConfig::new(1)
            .unwrap()
            .with_max_features(MaxFeatures::All)
            .with_sample_fraction(1.0);
        let plan = SamplingPlan::resolve(&config, 4, 9);
        assert_eq!(plan.feature_subset_size, 4);
        assert_eq!(plan.sample_size, 9);
    }

    #[test]
    fn features_drawn_without_replacement() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..50 {
            let fs = select_features(10, 4, &mut rng);
            assert_eq!(fs.len(), 4);
            assert!(fs.iter().all(|f| f.index() < 10));
        }
        assert_eq!(select_features(3, 8, &mut rng).len(), 3);
        assert!(select_features(0, 1, &mut rng).is_empty());
    }

    #[test]
    fn held_out_is_complement_of_draws() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let (in_bag, held_out) = bootstrap_sample(30, 20, &mut rng);
        assert_eq!(in_bag.len(), 20);
        for i in 0..30 {
            assert_eq!(in_bag.contains(&i), !held_out.contains(&i), "position {i}");
        }
    }

    #[test]
    fn bootstrap_allows_repeats() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let (in_bag, held_out) = bootstrap_sample(5, 200, &mut rng);
        assert_eq!(in_bag.len(), 200);
        assert!(held_out.is_empty());
    }

    #[test]
    fn empty_population_draws_nothing() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let (in_bag, held_out) = bootstrap_sample(0, 0, &mut rng);
        assert!(in_bag.is_empty() && held_out.is_empty());
    }

    #[test]
    fn same_seed_same_sample() {
        let plan = SamplingPlan {
            feature_subset_size: 3,
            sample_size: 40,
        };
        let a = TreeSample::draw(&plan, 9, 60, &mut ChaCha8Rng::seed_from_u64(5));
        let b = TreeSample::draw(&plan, 9, 60, &mut ChaCha8Rng::seed_from_u64(5));
        assert_eq!(a, b);
    }
}
