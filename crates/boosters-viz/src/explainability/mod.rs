//! Explainability module.
//!
//! Summaries derived from a model's tree structure:
//!
//! - **Feature importance**: split counts or accumulated gain per feature
//! - **Split value histograms**: distribution of the thresholds chosen for a
//!   feature across the ensemble
//!
//! # Example
//!
//! ```
//! use boosters_viz::explainability::{FeatureImportance, ImportanceType};
//! use boosters_viz::testing::{dump_of, stump};
//!
//! let model = dump_of(vec![stump()], &["x", "y"]);
//! let importance = FeatureImportance::from_model(&model, ImportanceType::Split);
//! assert_eq!(importance.sorted_ascending(), [("y", 0.0), ("x", 1.0)]);
//! ```

mod importance;
mod split_hist;

pub use importance::{compute_importance, FeatureImportance, ImportanceType};
pub use split_hist::{
    histogram, split_value_histogram, split_values, Bins, FeatureRef, SplitValueHistogram,
};
