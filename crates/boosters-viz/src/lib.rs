//! boosters-viz: diagnostic plots for gradient boosted tree ensembles.
//!
//! Renders what a trained model learned, from its dumped tree structure and
//! its recorded evaluation history.
//!
//! # Key Types
//!
//! - [`Booster`] / [`ModelDump`] - model handles, loaded from LightGBM text
//!   models or JSON dumps
//! - [`EvalResults`] - per-dataset, per-metric values recorded during training
//! - [`plotting::Axes`] - chart surface filled by the renderers
//! - [`graph::Digraph`] - tree graph with DOT output and Graphviz rendering
//!
//! # Plotting
//!
//! ```
//! use boosters_viz::plotting::{create_tree_digraph, plot_importance, ImportancePlot, TreeDigraph};
//! use boosters_viz::testing::{dump_of, stump};
//!
//! let model = dump_of(vec![stump()], &["x"]);
//!
//! let ax = plot_importance(&model, &ImportancePlot::default()).unwrap();
//! assert_eq!(ax.bars().count(), 1);
//!
//! let graph = create_tree_digraph(&model, &TreeDigraph::default(), Default::default()).unwrap();
//! assert_eq!(graph.nodes().len(), 3);
//! ```
//!
//! Exporting charts needs the `plotting` feature (on by default). Drawing
//! trees as images needs the Graphviz executables.

pub mod compat;
pub mod error;
pub mod explainability;
pub mod graph;
pub mod model;
pub mod plotting;
pub mod testing;

// =============================================================================
// Convenience Re-exports
// =============================================================================

pub use error::{PlotError, Result};
pub use model::{Booster, EvalResults, EvalSource, ModelDump, TreeModel};

pub use explainability::{Bins, FeatureRef, ImportanceType};
pub use plotting::{
    create_tree_digraph, plot_importance, plot_metric, plot_split_value_histogram, plot_tree,
};
