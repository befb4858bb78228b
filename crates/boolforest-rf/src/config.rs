//! Configuration builder for random forest training.

use crate::error::RfError;

/// Fraction of the loaded records drawn (with replacement) to train each tree.
pub const DEFAULT_SAMPLE_FRACTION: f64 = 2.0 / 3.0;

/// Strategy for the size of the feature subset each tree may split on.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum MaxFeatures {
    /// `floor(sqrt(n_features))`, at least 1.
    Sqrt,
    /// `floor(log2(n_features))`, at least 1.
    Log2,
    /// A fixed count (clamped to the number of features).
    Fixed(usize),
    /// All features (no subsampling).
    All,
}

impl MaxFeatures {
    /// Resolve to a concrete subset size for `n_features` features.
    ///
    /// The result is at least 1 and never more than `n_features`, so it is 0
    /// only when there are no features at all.
    #[must_use]
    pub fn resolve(self, n_features: usize) -> usize {
        let raw = match self {
            MaxFeatures::Sqrt => (n_features as f64).sqrt().floor() as usize,
            MaxFeatures::Log2 => (n_features as f64).log2().floor().max(0.0) as usize,
            MaxFeatures::Fixed(n) => n,
            MaxFeatures::All => n_features,
        };
        raw.max(1).min(n_features)
    }
}

/// Configuration for random forest training.
///
/// Construct via [`ForestConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter         | Default                     |
/// |-------------------|-----------------------------|
/// | `max_features`    | `Sqrt`                      |
/// | `sample_fraction` | [`DEFAULT_SAMPLE_FRACTION`] |
/// | `seed`            | 42                          |
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ForestConfig {
    pub(crate) n_trees: usize,
    pub(crate) max_features: MaxFeatures,
    pub(crate) sample_fraction: f64,
    pub(crate) seed: u64,
}

impl ForestConfig {
    /// Create a new config with the given target number of trees.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::InvalidTreeCount`] if `n_trees` is zero.
    pub fn new(n_trees: usize) -> Result<Self, RfError> {
        if n_trees == 0 {
            return Err(RfError::InvalidTreeCount { n_trees });
        }
        Ok(Self {
            n_trees,
            max_features: MaxFeatures::Sqrt,
            sample_fraction: DEFAULT_SAMPLE_FRACTION,
            seed: 42,
        })
    }

    // --- Setters ---

    /// Set the feature-subset strategy.
    #[must_use]
    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    /// Set the fraction of records drawn per tree.
    #[must_use]
    pub fn with_sample_fraction(mut self, sample_fraction: f64) -> Self {
        self.sample_fraction = sample_fraction;
        self
    }

    /// Set the random seed for reproducibility.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    // --- Getters ---

    /// Return the target number of trees.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    /// Return the feature-subset strategy.
    #[must_use]
    pub fn max_features(&self) -> MaxFeatures {
        self.max_features
    }

    /// Return the per-tree sample fraction.
    #[must_use]
    pub fn sample_fraction(&self) -> f64 {
        self.sample_fraction
    }

    /// Return the random seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Check the parameters that cannot be rejected at construction.
    ///
    /// # Errors
    ///
    /// | Variant | When |
    /// |---|---|
    /// | [`RfError::InvalidTreeCount`] | `n_trees` is zero |
    /// | [`RfError::InvalidMaxFeatures`] | `max_features` is `Fixed(0)` |
    /// | [`RfError::InvalidSampleFraction`] | `sample_fraction` is not in (0.0, 1.0] |
    pub fn validate(&self) -> Result<(), RfError> {
        if self.n_trees == 0 {
            return Err(RfError::InvalidTreeCount { n_trees: 0 });
        }
        if let MaxFeatures::Fixed(0) = self.max_features {
            return Err(RfError::InvalidMaxFeatures { max_features: 0 });
        }
        if !(self.sample_fraction > 0.0 && self.sample_fraction <= 1.0) {
            return Err(RfError::InvalidSampleFraction {
                fraction: self.sample_fraction,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_trees_rejected() {
        assert!(matches!(
            ForestConfig::new(0),
            Err(RfError::InvalidTreeCount { n_trees: 0 })
        ));
    }

    #[test]
    fn defaults() {
        let c = ForestConfig::new(30).unwrap();
        assert_eq!(c.n_trees(), 30);
        assert_eq!(c.max_features(), MaxFeatures::Sqrt);
        assert!((c.sample_fraction() - 2.0 / 3.0).abs() < f64::EPSILON);
        assert_eq!(c.seed(), 42);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn sqrt_floors_with_minimum_one() {
        assert_eq!(MaxFeatures::Sqrt.resolve(1), 1);
        assert_eq!(MaxFeatures::Sqrt.resolve(3), 1);
        assert_eq!(MaxFeatures::Sqrt.resolve(5), 2);
        assert_eq!(MaxFeatures::Sqrt.resolve(16), 4);
        assert_eq!(MaxFeatures::Sqrt.resolve(24), 4);
        assert_eq!(MaxFeatures::Sqrt.resolve(0), 0);
    }

    #[test]
    fn other_strategies_resolve() {
        assert_eq!(MaxFeatures::Log2.resolve(8), 3);
        assert_eq!(MaxFeatures::Log2.resolve(1), 1);
        assert_eq!(MaxFeatures::Fixed(10).resolve(4), 4);
        assert_eq!(MaxFeatures::All.resolve(7), 7);
    }

    #[test]
    fn invalid_parameters_rejected() {
        let c = ForestConfig::new(1).unwrap().with_max_features(MaxFeatures::Fixed(0));
        assert!(matches!(c.validate(), Err(RfError::InvalidMaxFeatures { .. })));

        for fraction in [0.0, -0.5, 1.5, f64::NAN] {
            let c = ForestConfig::new(1).unwrap().with_sample_fraction(fraction);
            assert!(matches!(c.validate(), Err(RfError::InvalidSampleFraction { .. })));
        }
    }

    #[test]
    fn deserialized_zero_trees_fails_validation() {
        let c: ForestConfig = serde_json::from_str(
            r#"{"n_trees":0,"max_features":"Sqrt","sample_fraction":0.5,"seed":1}"#,
        )
        .unwrap();
        assert!(matches!(
            c.validate(),
            Err(RfError::InvalidTreeCount { n_trees: 0 })
        ));
    }
}
