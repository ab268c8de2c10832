//! Histograms of split thresholds.

use std::fmt;

use crate::error::{PlotError, Result};
use crate::model::{ModelDump, TreeModel};

/// A feature given either by position or by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureRef {
    Index(usize),
    Name(String),
}

impl FeatureRef {
    /// `"name"` or `"index"`, depending on how the feature was given.
    pub fn kind(&self) -> &'static str {
        match self {
            FeatureRef::Index(_) => "index",
            FeatureRef::Name(_) => "name",
        }
    }

    /// Parse a command-line value: digits are an index, anything else a name.
    pub fn parse(s: &str) -> Self {
        match s.parse() {
            Ok(idx) => FeatureRef::Index(idx),
            Err(_) => FeatureRef::Name(s.to_string()),
        }
    }
}

impl From<usize> for FeatureRef {
    fn from(idx: usize) -> Self {
        FeatureRef::Index(idx)
    }
}

impl From<&str> for FeatureRef {
    fn from(name: &str) -> Self {
        FeatureRef::Name(name.to_string())
    }
}

impl From<String> for FeatureRef {
    fn from(name: String) -> Self {
        FeatureRef::Name(name)
    }
}

impl fmt::Display for FeatureRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureRef::Index(i) => write!(f, "{}", i),
            FeatureRef::Name(n) => f.write_str(n),
        }
    }
}

/// Bin specification.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Bins {
    /// One bin per unique split value.
    #[default]
    Auto,
    /// Fixed number of equal-width bins over the value range.
    Count(usize),
    /// Explicit increasing bin edges.
    Edges(Vec<f64>),
}

/// Bin counts with `edges.len() == counts.len() + 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitValueHistogram {
    pub counts: Vec<u64>,
    pub edges: Vec<f64>,
}

impl SplitValueHistogram {
    /// True if no split fell into any bin.
    pub fn is_all_zero(&self) -> bool {
        self.counts.iter().all(|&c| c == 0)
    }

    /// Centre of every bin.
    pub fn midpoints(&self) -> Vec<f64> {
        self.edges.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect()
    }

    /// Width of the first bin.
    pub fn bin_width(&self) -> f64 {
        self.edges[1] - self.edges[0]
    }
}

/// Thresholds of every numeric split on `feature`, across all trees.
///
/// Categorical splits carry category sets rather than thresholds and are
/// skipped.
pub fn split_values(dump: &ModelDump, feature: &FeatureRef) -> Result<Vec<f64>> {
    let index = match feature {
        FeatureRef::Index(i) => *i,
        FeatureRef::Name(name) => dump
            .feature_names()
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| PlotError::UnknownFeature(name.clone()))?,
    };

    let mut values = Vec::new();
    for info in &dump.tree_info {
        info.tree_structure.for_each_split(&mut |split| {
            if split.split_feature == index {
                if let Some(v) = split.threshold.as_f64() {
                    values.push(v);
                }
            }
        });
    }
    Ok(values)
}

/// Collect the split values of `feature` and bin them.
pub fn split_value_histogram(
    dump: &ModelDump,
    feature: &FeatureRef,
    bins: &Bins,
) -> Result<SplitValueHistogram> {
    let values = split_values(dump, feature)?;
    histogram(&values, bins)
}

/// Bin `values` the way `numpy.histogram` does: equal-width bins over
/// `[min, max]`, the last bin closed on the right, values outside explicit
/// edges dropped.
pub fn histogram(values: &[f64], bins: &Bins) -> Result<SplitValueHistogram> {
    let edges = match bins {
        Bins::Edges(edges) => {
            if edges.len() < 2 || edges.windows(2).any(|w| !(w[0] <= w[1])) {
                return Err(PlotError::InvalidParameter {
                    name: "bins",
                    reason: "edges must be at least 2 increasing values".to_string(),
                });
            }
            edges.clone()
        }
        Bins::Count(0) => {
            return Err(PlotError::InvalidParameter {
                name: "bins",
                reason: "bin count must be positive".to_string(),
            });
        }
        Bins::Count(n) => uniform_edges(values, *n),
        Bins::Auto => uniform_edges(values, count_unique(values).max(1)),
    };

    let n_bins = edges.len() - 1;
    let (lo, hi) = (edges[0], edges[n_bins]);
    let mut counts = vec![0u64; n_bins];
    for &v in values {
        if v < lo || v > hi {
            continue;
        }
        let bin = edges.partition_point(|&e| e <= v).saturating_sub(1).min(n_bins - 1);
        counts[bin] += 1;
    }

    Ok(SplitValueHistogram { counts, edges })
}

fn count_unique(values: &[f64]) -> usize {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted.dedup();
    sorted.len()
}

fn uniform_edges(values: &[f64], n: usize) -> Vec<f64> {
    let (mut lo, mut hi) = values
        .iter()
        .fold(None, |acc: Option<(f64, f64)>, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
        .unwrap_or((0.0, 1.0));
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let step = (hi - lo) / n as f64;
    let mut edges: Vec<f64> = (0..n).map(|i| lo + step * i as f64).collect();
    edges.push(hi);
    edges
}
