//! End-to-end rendering scenarios on small hand-made inputs.

use approx::assert_relative_eq;

use boosters_viz::explainability::{Bins, FeatureRef, ImportanceType, SplitValueHistogram};
use boosters_viz::graph::Digraph;
use boosters_viz::model::{EvalResults, ModelDump, TreeModel};
use boosters_viz::plotting::{
    create_tree_digraph, plot_importance, plot_metric, plot_split_value_histogram_on, Axes,
    ImportancePlot, MetricPlot, SplitHistogramPlot, TreeDigraph,
};
use boosters_viz::testing::{dump_of, stump};
use boosters_viz::{PlotError, Result};

/// A model whose importance and histograms are fixed up front.
struct Fixed {
    dump: ModelDump,
    names: Vec<String>,
    importance: Vec<f64>,
    histogram: SplitValueHistogram,
}

impl Fixed {
    fn with_importance(pairs: &[(&str, f64)]) -> Self {
        Self {
            dump: ModelDump::default(),
            names: pairs.iter().map(|p| p.0.to_string()).collect(),
            importance: pairs.iter().map(|p| p.1).collect(),
            histogram: SplitValueHistogram {
                counts: vec![0],
                edges: vec![0.0, 1.0],
            },
        }
    }
}

impl TreeModel for Fixed {
    fn model_dump(&self) -> &ModelDump {
        &self.dump
    }

    fn feature_names(&self) -> Vec<String> {
        self.names.clone()
    }

    fn feature_importance(&self, _importance_type: ImportanceType) -> Vec<f64> {
        self.importance.clone()
    }

    fn split_value_histogram(&self, _feature: &FeatureRef, _bins: &Bins) -> Result<SplitValueHistogram> {
        Ok(self.histogram.clone())
    }
}

fn ytick_names(ax: &Axes) -> Vec<String> {
    ax.yticks
        .as_ref()
        .map(|ticks| ticks.iter().map(|t| t.1.clone()).collect())
        .unwrap_or_default()
}

#[test]
fn importance_drops_zero_and_sorts_ascending() {
    let model = Fixed::with_importance(&[("A", 5.0), ("B", 0.0), ("C", 10.0)]);
    let ax = plot_importance(&model, &ImportancePlot::default()).unwrap();

    assert_eq!(ytick_names(&ax), ["A", "C"]);
    let values: Vec<_> = ax.bars().map(|b| b.value).collect();
    assert_eq!(values, [5.0, 10.0]);
    let positions: Vec<_> = ax.bars().map(|b| b.position).collect();
    assert_eq!(positions, [0.0, 1.0]);
    assert_eq!(ax.xlim, Some((0.0, 10.0 * 1.1)));
    assert_eq!(ax.ylim, Some((-1.0, 2.0)));
}

#[test]
fn importance_of_unfitted_model_is_an_error() {
    let model = Fixed::with_importance(&[]);
    assert!(matches!(
        plot_importance(&model, &ImportancePlot::default()),
        Err(PlotError::EmptyImportance)
    ));
}

#[test]
fn stump_digraph() {
    let model = dump_of(vec![stump()], &[]);
    let graph: Digraph = create_tree_digraph(&model, &TreeDigraph::default(), Default::default()).unwrap();

    let names: Vec<_> = graph.nodes().iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, ["split0", "leaf0", "leaf1"]);
    let edges: Vec<_> = graph
        .edges()
        .iter()
        .map(|e| (e.tail.as_str(), e.head.as_str(), e.label.as_deref()))
        .collect();
    assert_eq!(
        edges,
        [("split0", "leaf0", Some("<=")), ("split0", "leaf1", Some(">"))]
    );

    let dot = graph.to_dot();
    assert!(dot.contains("\tsplit0 [label=\"split_feature_index: 0\\nthreshold: 1.5\"]\n"));
    assert!(dot.contains("\tleaf1 [label=\"leaf_index: 1\\nleaf_value: 1\"]\n"));
    assert!(dot.contains("\tsplit0 -> leaf1 [label=\">\"]\n"));
}

#[test]
fn single_metric_trajectory() {
    let evals = EvalResults::from_json(r#"{"train": {"l2": [0.5, 0.3, 0.2]}}"#).unwrap();
    let ax = plot_metric(&evals, &MetricPlot::default()).unwrap();

    let lines: Vec<_> = ax.lines().collect();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].points.len(), 3);
    assert_eq!(ax.legend_labels(), ["train"]);
    assert_eq!(ax.ylabel.as_deref(), Some("l2"));

    let (lo, hi) = ax.ylim.unwrap();
    assert_relative_eq!(lo, 0.2 - 0.3 * 0.2, epsilon = 1e-12);
    assert_relative_eq!(hi, 0.5 + 0.3 * 0.2, epsilon = 1e-12);
    assert_eq!(ax.xlim, Some((0.0, 3.0)));
}

#[test]
fn all_zero_histogram_draws_nothing() {
    let model = Fixed::with_importance(&[("A", 1.0)]);
    let mut ax = Axes::new();
    let result = plot_split_value_histogram_on(
        &mut ax,
        &model,
        &FeatureRef::Index(0),
        &SplitHistogramPlot::default(),
    );

    assert!(matches!(result, Err(PlotError::FeatureNotUsed(ref f)) if f == "0"));
    assert!(ax.artists().is_empty());
    assert_eq!(ax, Axes::new());
}
