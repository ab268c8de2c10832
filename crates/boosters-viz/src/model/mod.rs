//! Model handles consumed by the renderers.
//!
//! - [`TreeModel`]: anything that can produce a [`ModelDump`]. Feature names,
//!   importance and split histograms are derived from the dump.
//! - [`EvalSource`]: anything that can hand out an [`EvalResults`] record.
//! - [`Booster`]: a loaded model plus an optional evaluation history.

mod dump;
mod eval;

use std::path::Path;

pub use dump::{DecisionType, DumpNode, LeafNode, ModelDump, Scalar, SplitNode, TreeInfo};
pub use eval::{EvalResults, MetricHistory};

use crate::compat::lightgbm::{ConversionError, LgbModel, ParseError};
use crate::error::{PlotError, Result};
use crate::explainability::{self, Bins, FeatureRef, ImportanceType, SplitValueHistogram};

// =============================================================================
// TreeModel
// =============================================================================

/// A trained tree ensemble that can describe its own structure.
pub trait TreeModel {
    /// Nested description of every tree.
    fn model_dump(&self) -> &ModelDump;

    /// Feature names, `Column_<i>` when the model carries none.
    fn feature_names(&self) -> Vec<String> {
        let dump = self.model_dump();
        match &dump.feature_names {
            Some(names) => names.clone(),
            None => (0..dump.num_features())
                .map(|i| format!("Column_{}", i))
                .collect(),
        }
    }

    fn num_trees(&self) -> usize {
        self.model_dump().num_trees()
    }

    /// Per-feature importance, indexed like [`TreeModel::feature_names`].
    fn feature_importance(&self, importance_type: ImportanceType) -> Vec<f64> {
        explainability::compute_importance(self.model_dump(), importance_type)
    }

    /// Histogram of the thresholds used when splitting on `feature`.
    fn split_value_histogram(
        &self,
        feature: &FeatureRef,
        bins: &Bins,
    ) -> Result<SplitValueHistogram> {
        explainability::split_value_histogram(self.model_dump(), feature, bins)
    }
}

impl TreeModel for ModelDump {
    fn model_dump(&self) -> &ModelDump {
        self
    }
}

// =============================================================================
// EvalSource
// =============================================================================

/// Provider of a per-iteration evaluation record.
pub trait EvalSource {
    /// The record, or `None` if this handle never recorded one.
    fn eval_results(&self) -> Option<&EvalResults>;
}

impl EvalSource for EvalResults {
    fn eval_results(&self) -> Option<&EvalResults> {
        Some(self)
    }
}

// =============================================================================
// Booster
// =============================================================================

/// Error loading a [`Booster`] from disk.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Convert(#[from] ConversionError),
    #[error("invalid JSON model dump: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A loaded model with an optional evaluation history.
#[derive(Debug, Clone)]
pub struct Booster {
    dump: ModelDump,
    evals: Option<EvalResults>,
}

impl Booster {
    pub fn from_dump(dump: ModelDump) -> Self {
        Self { dump, evals: None }
    }

    /// Build from a parsed LightGBM text model.
    pub fn from_lightgbm(model: &LgbModel) -> std::result::Result<Self, ConversionError> {
        Ok(Self::from_dump(model.to_dump()?))
    }

    /// Load a model file.
    ///
    /// Files whose first non-blank character is `{` are read as a JSON dump,
    /// anything else as a LightGBM text model.
    pub fn from_file(path: impl AsRef<Path>) -> std::result::Result<Self, LoadError> {
        let content = std::fs::read_to_string(path)?;
        if content.trim_start().starts_with('{') {
            Ok(Self::from_dump(ModelDump::from_json(&content)?))
        } else {
            let model = LgbModel::from_string(&content)?;
            Ok(Self::from_lightgbm(&model)?)
        }
    }

    /// Attach the evaluation history recorded during training.
    pub fn with_eval_results(mut self, evals: EvalResults) -> Self {
        self.evals = Some(evals);
        self
    }

    pub fn dump(&self) -> &ModelDump {
        &self.dump
    }
}

impl TreeModel for Booster {
    fn model_dump(&self) -> &ModelDump {
        &self.dump
    }
}

impl EvalSource for Booster {
    fn eval_results(&self) -> Option<&EvalResults> {
        self.evals.as_ref()
    }
}

/// Resolve the record of an [`EvalSource`], failing if it has none.
pub(crate) fn require_eval_results<S: EvalSource + ?Sized>(source: &S) -> Result<&EvalResults> {
    source.eval_results().ok_or(PlotError::MissingEvalResults)
}
