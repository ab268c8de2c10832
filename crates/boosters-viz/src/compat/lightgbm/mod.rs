//! LightGBM model format support.
//!
//! Parses LightGBM's text model format and converts it into the nested
//! [`ModelDump`](crate::model::ModelDump) the renderers walk.
//!
//! # Format Overview
//!
//! LightGBM text models have three main sections:
//! 1. **Header**: model metadata (num_class, feature names, objective)
//! 2. **Trees**: each tree's parallel arrays (splits, thresholds, children, leaves)
//! 3. **Footer**: feature importances and parameters, skipped while parsing
//!
//! Leaves are referenced from the child arrays as negative values (`!leaf`).
//! Categorical thresholds index into a bitset that the dump renders as a
//! `||`-separated category list.
//!
//! # Example
//!
//! ```ignore
//! use boosters_viz::compat::lightgbm::LgbModel;
//!
//! let model = LgbModel::from_file("model.txt")?;
//! let dump = model.to_dump()?;
//! println!("{}", dump.to_json()?);
//! ```

mod convert;
mod text;

pub use convert::ConversionError;
pub use text::*;
