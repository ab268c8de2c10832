//! Feature importance computed from a model dump.

use std::fmt;
use std::str::FromStr;

use crate::error::PlotError;
use crate::model::{ModelDump, TreeModel};

/// How importance is accumulated over the ensemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportanceType {
    /// Number of times each feature is used in splits.
    #[default]
    Split,
    /// Total gain from splits using each feature.
    Gain,
}

impl ImportanceType {
    pub fn as_str(self) -> &'static str {
        match self {
            ImportanceType::Split => "split",
            ImportanceType::Gain => "gain",
        }
    }
}

impl fmt::Display for ImportanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImportanceType {
    type Err = PlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "split" => Ok(ImportanceType::Split),
            "gain" => Ok(ImportanceType::Gain),
            other => Err(PlotError::InvalidParameter {
                name: "importance_type",
                reason: format!("expected 'split' or 'gain', got '{}'", other),
            }),
        }
    }
}

/// Accumulate importance over every split of every tree.
///
/// A split counts when its gain is positive, or when the dump records no
/// gain at all (hand-written dumps).
pub fn compute_importance(dump: &ModelDump, importance_type: ImportanceType) -> Vec<f64> {
    let mut scores = vec![0.0; dump.num_features()];
    for info in &dump.tree_info {
        info.tree_structure.for_each_split(&mut |split| {
            let gain = split.split_gain.as_ref().and_then(|g| g.as_f64());
            if gain.is_some_and(|g| g <= 0.0) {
                return;
            }
            if split.split_feature >= scores.len() {
                scores.resize(split.split_feature + 1, 0.0);
            }
            scores[split.split_feature] += match importance_type {
                ImportanceType::Split => 1.0,
                ImportanceType::Gain => gain.unwrap_or(0.0),
            };
        });
    }
    scores
}

/// Importance scores paired with feature names.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureImportance {
    names: Vec<String>,
    values: Vec<f64>,
    importance_type: ImportanceType,
}

impl FeatureImportance {
    /// Pair `values` with `names`. Extra entries on either side are dropped.
    pub fn new(names: Vec<String>, values: Vec<f64>, importance_type: ImportanceType) -> Self {
        let n = names.len().min(values.len());
        let mut names = names;
        let mut values = values;
        names.truncate(n);
        values.truncate(n);
        Self {
            names,
            values,
            importance_type,
        }
    }

    pub fn from_model<M: TreeModel + ?Sized>(model: &M, importance_type: ImportanceType) -> Self {
        Self::new(
            model.feature_names(),
            model.feature_importance(importance_type),
            importance_type,
        )
    }

    pub fn importance_type(&self) -> ImportanceType {
        self.importance_type
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(name, value)` pairs in ascending order of value.
    ///
    /// The sort is stable, so equal scores keep the feature order.
    pub fn sorted_ascending(&self) -> Vec<(&str, f64)> {
        let mut pairs: Vec<(&str, f64)> = self
            .names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
            .collect();
        pairs.sort_by(|a, b| a.1.total_cmp(&b.1));
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{dump_of, leaf, split, with_gain};

    #[test]
    fn importance_counts_and_sums_positive_gain_splits() {
        let tree = split(
            0,
            0,
            0.5,
            with_gain(split(1, 2, 1.0, leaf(0, 1.0), leaf(1, 2.0)), 3.0),
            with_gain(split(2, 0, 2.0, leaf(2, 3.0), leaf(3, 4.0)), 0.0),
        );
        let tree = with_gain(tree, 10.0);
        let dump = dump_of(vec![tree], &["a", "b", "c"]);

        assert_eq!(compute_importance(&dump, ImportanceType::Split), [1.0, 0.0, 1.0]);
        assert_eq!(compute_importance(&dump, ImportanceType::Gain), [10.0, 0.0, 3.0]);
    }

    #[test]
    fn parse_importance_type() {
        assert_eq!("gain".parse::<ImportanceType>().unwrap(), ImportanceType::Gain);
        assert!(matches!(
            "cover".parse::<ImportanceType>(),
            Err(PlotError::InvalidParameter { name: "importance_type", .. })
        ));
    }

    #[test]
    fn sorted_ascending_is_stable() {
        let imp = FeatureImportance::new(
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
            vec![5.0, 0.0, 10.0, 5.0],
            ImportanceType::Split,
        );
        assert_eq!(
            imp.sorted_ascending(),
            [("b", 0.0), ("a", 5.0), ("d", 5.0), ("c", 10.0)]
        );
        assert_eq!(imp.importance_type(), ImportanceType::Split);
    }
}
