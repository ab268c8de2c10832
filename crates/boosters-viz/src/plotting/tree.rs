//! Tree to graph conversion and tree rasterization.
//!
//! [`add_tree`] walks one tree depth first: a node is added, then its left
//! subtree, then its right subtree, then the edge from its parent. Split
//! nodes are named `split<split_index>` and leaves `leaf<leaf_index>`.
//! Label lines are joined with the Graphviz `\n` escape.

use std::fmt;
use std::str::FromStr;

use bon::Builder;

use super::{check_figsize, format_scalar, Axes};
use crate::error::{PlotError, Result};
use crate::graph::{require_graphviz, Digraph, GraphOptions, LegacyAttrArgs, LegacyGraphArgs};
use crate::model::{DecisionType, DumpNode, LeafNode, SplitNode, TreeModel};

const LINE_BREAK: &str = r"\n";

/// Optional node annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShowInfo {
    SplitGain,
    InternalValue,
    InternalCount,
    LeafCount,
}

impl ShowInfo {
    pub fn as_str(self) -> &'static str {
        match self {
            ShowInfo::SplitGain => "split_gain",
            ShowInfo::InternalValue => "internal_value",
            ShowInfo::InternalCount => "internal_count",
            ShowInfo::LeafCount => "leaf_count",
        }
    }
}

impl fmt::Display for ShowInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShowInfo {
    type Err = PlotError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "split_gain" => Ok(ShowInfo::SplitGain),
            "internal_value" => Ok(ShowInfo::InternalValue),
            "internal_count" => Ok(ShowInfo::InternalCount),
            "leaf_count" => Ok(ShowInfo::LeafCount),
            other => Err(PlotError::InvalidParameter {
                name: "show_info",
                reason: format!(
                    "unknown value {:?}, expected split_gain, internal_value, internal_count or leaf_count",
                    other
                ),
            }),
        }
    }
}

/// Options for [`create_tree_digraph`].
#[derive(Debug, Clone, Default, Builder)]
pub struct TreeDigraph {
    /// Tree to convert. Default: 0.
    #[builder(default)]
    pub tree_index: usize,
    /// Annotations added to node labels, in label order.
    #[builder(default)]
    pub show_info: Vec<ShowInfo>,
    /// Decimals shown for thresholds, gains and values.
    pub precision: Option<usize>,
    /// Passed to the [`Digraph`] constructor.
    #[builder(default)]
    pub graph: GraphOptions,
}

/// Options for [`plot_tree`].
#[derive(Debug, Clone, Default, Builder)]
#[builder(derive(Clone, Debug), finish_fn(vis = "", name = __build_internal))]
pub struct TreePlot {
    #[builder(default)]
    pub tree_index: usize,
    /// Figure size in pixels, used when a new [`Axes`] is created.
    pub figsize: Option<(u32, u32)>,
    #[builder(default)]
    pub show_info: Vec<ShowInfo>,
    pub precision: Option<usize>,
    #[builder(default)]
    pub graph: GraphOptions,
}

impl<S: tree_plot_builder::IsComplete> TreePlotBuilder<S> {
    /// Build and validate the options.
    pub fn build(self) -> Result<TreePlot> {
        let opts = self.__build_internal();
        check_figsize(opts.figsize)?;
        Ok(opts)
    }
}

impl TreePlot {
    fn digraph(&self) -> TreeDigraph {
        TreeDigraph {
            tree_index: self.tree_index,
            show_info: self.show_info.clone(),
            precision: self.precision,
            graph: self.graph.clone(),
        }
    }
}

struct Walk<'a> {
    show_info: &'a [ShowInfo],
    feature_names: Option<&'a [String]>,
    precision: Option<usize>,
}

/// Add the nodes and edges of the tree rooted at `root` to `graph`.
///
/// On error the graph is left as it was.
pub fn add_tree(
    graph: &mut Digraph,
    root: &DumpNode,
    show_info: &[ShowInfo],
    feature_names: Option<&[String]>,
    precision: Option<usize>,
) -> Result<()> {
    let walk = Walk {
        show_info,
        feature_names,
        precision,
    };
    let (n_nodes, n_edges) = (graph.nodes().len(), graph.edges().len());
    let result = walk.add(graph, root, None);
    if result.is_err() {
        graph.truncate(n_nodes, n_edges);
    }
    result
}

impl Walk<'_> {
    fn add(&self, graph: &mut Digraph, node: &DumpNode, parent: Option<(&str, &str)>) -> Result<()> {
        let name = match node {
            DumpNode::Split(split) => {
                let name = format!("split{}", split.split_index);
                graph.node(name.as_str(), self.split_label(&name, split)?);
                let (left, right) = branch_labels(&split.decision_type)?;
                self.add(graph, &split.left_child, Some((name.as_str(), left)))?;
                self.add(graph, &split.right_child, Some((name.as_str(), right)))?;
                name
            }
            DumpNode::Leaf(leaf) => {
                let name = format!("leaf{}", leaf.leaf_index);
                graph.node(name.as_str(), self.leaf_label(&name, leaf)?);
                name
            }
        };
        if let Some((parent, decision)) = parent {
            graph.edge(parent, name, Some(decision));
        }
        Ok(())
    }

    fn split_label(&self, name: &str, split: &SplitNode) -> Result<String> {
        let feature = split.split_feature;
        let mut lines = vec![match self.feature_names {
            Some(names) => {
                let feature_name = names.get(feature).ok_or_else(|| {
                    PlotError::MalformedTree(format!(
                        "{} splits on feature {} but the model names {} features",
                        name,
                        feature,
                        names.len()
                    ))
                })?;
                // Literal backslashes must not combine with the line break escape.
                format!("split_feature_name: {}", feature_name.replace('\\', r"\\"))
            }
            None => format!("split_feature_index: {}", feature),
        }];
        lines.push(format!(
            "threshold: {}",
            format_scalar(&split.threshold, self.precision)
        ));

        let missing = |field: &'static str| PlotError::MissingField {
            node: name.to_string(),
            field,
        };
        for &info in self.show_info {
            let value = match info {
                ShowInfo::SplitGain => split
                    .split_gain
                    .as_ref()
                    .map(|v| format_scalar(v, self.precision))
                    .ok_or_else(|| missing("split_gain"))?,
                ShowInfo::InternalValue => split
                    .internal_value
                    .as_ref()
                    .map(|v| format_scalar(v, self.precision))
                    .ok_or_else(|| missing("internal_value"))?,
                ShowInfo::InternalCount => split
                    .internal_count
                    .map(|c| c.to_string())
                    .ok_or_else(|| missing("internal_count"))?,
                ShowInfo::LeafCount => continue,
            };
            lines.push(format!("{}: {}", info, value));
        }
        Ok(lines.join(LINE_BREAK))
    }

    fn leaf_label(&self, name: &str, leaf: &LeafNode) -> Result<String> {
        let mut lines = vec![
            format!("leaf_index: {}", leaf.leaf_index),
            format!("leaf_value: {}", format_scalar(&leaf.leaf_value, self.precision)),
        ];
        if self.show_info.contains(&ShowInfo::LeafCount) {
            let count = leaf.leaf_count.ok_or_else(|| PlotError::MissingField {
                node: name.to_string(),
                field: "leaf_count",
            })?;
            lines.push(format!("leaf_count: {}", count));
        }
        Ok(lines.join(LINE_BREAK))
    }
}

/// Edge labels towards the left and right child.
fn branch_labels(decision: &DecisionType) -> Result<(&'static str, &'static str)> {
    match decision {
        DecisionType::LessOrEqual => Ok(("<=", ">")),
        DecisionType::Equal => Ok(("is", "isn't")),
        DecisionType::Other(op) => Err(PlotError::MalformedTree(format!(
            "invalid decision type {:?}",
            op
        ))),
    }
}

/// Build the graph of one tree of `model`.
///
/// `legacy` carries the deprecated individually named graph parameters;
/// each one set is folded into `opts.graph` unless already set there.
pub fn create_tree_digraph<M: TreeModel + ?Sized>(
    model: &M,
    opts: &TreeDigraph,
    legacy: LegacyGraphArgs,
) -> Result<Digraph> {
    let mut graph_opts = opts.graph.clone();
    legacy.fold_into(&mut graph_opts);

    let dump = model.model_dump();
    let info = dump
        .tree_info
        .get(opts.tree_index)
        .ok_or(PlotError::TreeIndexOutOfRange {
            index: opts.tree_index,
            num_trees: dump.tree_info.len(),
        })?;

    let mut graph = Digraph::new(graph_opts);
    add_tree(
        &mut graph,
        &info.tree_structure,
        &opts.show_info,
        dump.feature_names.as_deref(),
        opts.precision,
    )?;
    log::debug!(
        "tree {} converted to {} nodes and {} edges",
        opts.tree_index,
        graph.nodes().len(),
        graph.edges().len()
    );
    Ok(graph)
}

/// Rasterize one tree with Graphviz and show it on a new [`Axes`].
pub fn plot_tree<M: TreeModel + ?Sized>(
    model: &M,
    opts: &TreePlot,
    legacy: LegacyAttrArgs,
) -> Result<Axes> {
    require_graphviz("plot trees")?;
    check_figsize(opts.figsize)?;
    let mut ax = Axes::with_size(opts.figsize);
    plot_tree_on(&mut ax, model, opts, legacy)?;
    Ok(ax)
}

/// Rasterize one tree with Graphviz and show it on `ax` with the axis
/// hidden.
pub fn plot_tree_on<M: TreeModel + ?Sized>(
    ax: &mut Axes,
    model: &M,
    opts: &TreePlot,
    legacy: LegacyAttrArgs,
) -> Result<()> {
    require_graphviz("plot trees")?;
    let graph = create_tree_digraph(model, &opts.digraph(), legacy.into())?;
    let png = graph.pipe("png")?;
    let img = image::load_from_memory_with_format(&png, image::ImageFormat::Png)?.to_rgba8();
    ax.imshow(img);
    ax.axis_off();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::graphviz_available;
    use crate::testing::{annotated, dump_of, leaf, split, stump, with_decision};

    fn edge_labels(graph: &Digraph) -> Vec<(String, String, String)> {
        graph
            .edges()
            .iter()
            .map(|e| {
                (
                    e.tail.clone(),
                    e.head.clone(),
                    e.label.clone().unwrap_or_default(),
                )
            })
            .collect()
    }

    #[test]
    fn stump_graph() {
        let dump = dump_of(vec![stump()], &[]);
        let graph = create_tree_digraph(&dump, &TreeDigraph::default(), Default::default()).unwrap();

        let names: Vec<_> = graph.nodes().iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["split0", "leaf0", "leaf1"]);
        assert_eq!(
            graph.nodes()[0].label,
            r"split_feature_index: 0\nthreshold: 1.5"
        );
        assert_eq!(graph.nodes()[1].label, r"leaf_index: 0\nleaf_value: -1");
        assert_eq!(
            edge_labels(&graph),
            [
                ("split0".to_string(), "leaf0".to_string(), "<=".to_string()),
                ("split0".to_string(), "leaf1".to_string(), ">".to_string()),
            ]
        );
    }

    #[test]
    fn edges_follow_subtrees() {
        let tree = split(0, 0, 1.0, split(1, 1, 2.0, leaf(0, 0.0), leaf(1, 0.0)), leaf(2, 0.0));
        let dump = dump_of(vec![tree], &["a", "b"]);
        let graph = create_tree_digraph(&dump, &TreeDigraph::default(), Default::default()).unwrap();

        let names: Vec<_> = graph.nodes().iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["split0", "split1", "leaf0", "leaf1", "leaf2"]);
        let edges: Vec<_> = edge_labels(&graph).into_iter().map(|e| (e.0, e.1)).collect();
        assert_eq!(
            edges,
            [
                ("split1".to_string(), "leaf0".to_string()),
                ("split1".to_string(), "leaf1".to_string()),
                ("split0".to_string(), "split1".to_string()),
                ("split0".to_string(), "leaf2".to_string()),
            ]
        );
        assert!(graph.nodes()[0].label.starts_with("split_feature_name: a"));
    }

    #[test]
    fn categorical_labels() {
        let tree = with_decision(split(0, 0, "1||3", leaf(0, 0.0), leaf(1, 0.0)), "==");
        let dump = dump_of(vec![tree], &[]);
        let graph = create_tree_digraph(&dump, &TreeDigraph::default(), Default::default()).unwrap();
        let labels: Vec<_> = edge_labels(&graph).into_iter().map(|e| e.2).collect();
        assert_eq!(labels, ["is", "isn't"]);
        assert!(graph.nodes()[0].label.ends_with("threshold: 1||3"));
    }

    #[test]
    fn backslash_in_feature_name_keeps_line_break() {
        let dump = dump_of(vec![stump()], &[r"dir\"]);
        let graph = create_tree_digraph(&dump, &TreeDigraph::default(), Default::default()).unwrap();
        assert_eq!(
            graph.nodes()[0].label,
            r"split_feature_name: dir\\\nthreshold: 1.5"
        );
    }

    #[test]
    fn annotations_in_requested_order() {
        let tree = annotated(
            split(
                0,
                0,
                0.123456,
                annotated(leaf(0, 0.5), 0.0, 0.0, 40),
                annotated(leaf(1, -0.25), 0.0, 0.0, 60),
            ),
            12.3456,
            0.1,
            100,
        );
        let dump = dump_of(vec![tree], &[]);
        let opts = TreeDigraph::builder()
            .show_info(vec![
                ShowInfo::InternalCount,
                ShowInfo::SplitGain,
                ShowInfo::InternalValue,
                ShowInfo::LeafCount,
            ])
            .precision(2)
            .build();
        let graph = create_tree_digraph(&dump, &opts, Default::default()).unwrap();

        assert_eq!(
            graph.nodes()[0].label,
            r"split_feature_index: 0\nthreshold: 0.12\ninternal_count: 100\nsplit_gain: 12.35\ninternal_value: 0.10"
        );
        assert_eq!(
            graph.nodes()[2].label,
            r"leaf_index: 1\nleaf_value: -0.25\nleaf_count: 60"
        );
    }

    #[test]
    fn malformed_trees_leave_no_partial_graph() {
        let bad = with_decision(split(0, 0, 1.0, leaf(0, 0.0), leaf(1, 0.0)), "<");
        let dump = dump_of(vec![bad.clone()], &[]);
        assert!(matches!(
            create_tree_digraph(&dump, &TreeDigraph::default(), Default::default()),
            Err(PlotError::MalformedTree(_))
        ));

        let mut graph = Digraph::default();
        graph.node("keep", "kept");
        assert!(add_tree(&mut graph, &bad, &[], None, None).is_err());
        assert_eq!(graph.nodes().len(), 1);
        assert!(graph.edges().is_empty());
    }

    #[test]
    fn missing_annotation_is_reported() {
        let dump = dump_of(vec![stump()], &[]);
        let opts = TreeDigraph::builder().show_info(vec![ShowInfo::SplitGain]).build();
        let err = create_tree_digraph(&dump, &opts, Default::default()).unwrap_err();
        assert!(matches!(
            err,
            PlotError::MissingField { ref node, field: "split_gain" } if node == "split0"
        ));
    }

    #[test]
    fn tree_index_out_of_range() {
        let dump = dump_of(vec![stump()], &[]);
        let opts = TreeDigraph::builder().tree_index(1).build();
        assert!(matches!(
            create_tree_digraph(&dump, &opts, Default::default()),
            Err(PlotError::TreeIndexOutOfRange { index: 1, num_trees: 1 })
        ));
    }

    #[test]
    fn legacy_args_fill_graph_options() {
        let dump = dump_of(vec![stump()], &[]);
        let opts = TreeDigraph::builder()
            .graph(GraphOptions {
                name: Some("kept".to_string()),
                ..Default::default()
            })
            .build();
        let legacy = LegacyGraphArgs {
            old_name: Some("dropped".to_string()),
            old_comment: Some("first tree".to_string()),
            ..Default::default()
        };
        let graph = create_tree_digraph(&dump, &opts, legacy).unwrap();
        assert_eq!(graph.options().name.as_deref(), Some("kept"));
        assert_eq!(graph.options().comment.as_deref(), Some("first tree"));
    }

    #[test]
    fn show_info_parsing() {
        assert_eq!("leaf_count".parse::<ShowInfo>().unwrap(), ShowInfo::LeafCount);
        assert_eq!(ShowInfo::SplitGain.to_string(), "split_gain");
        assert!("depth".parse::<ShowInfo>().is_err());
    }

    #[test]
    fn plot_tree_needs_graphviz() {
        let dump = dump_of(vec![stump()], &[]);
        let result = plot_tree(&dump, &TreePlot::default(), Default::default());
        if graphviz_available() {
            let ax = result.unwrap();
            assert_eq!(ax.images().count(), 1);
            assert!(!ax.axis_visible);
        } else {
            assert!(matches!(
                result,
                Err(PlotError::BackendUnavailable { backend: "graphviz", .. })
            ));
        }
    }
}
