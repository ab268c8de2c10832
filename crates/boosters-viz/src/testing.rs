//! Builders for hand-made tree dumps used in tests and doc examples.

use crate::model::{DecisionType, DumpNode, LeafNode, ModelDump, Scalar, SplitNode, TreeInfo};

/// Leaf with the given index and value.
pub fn leaf(leaf_index: u32, value: impl Into<Scalar>) -> DumpNode {
    DumpNode::Leaf(LeafNode {
        leaf_index,
        leaf_value: value.into(),
        leaf_weight: None,
        leaf_count: None,
    })
}

/// Numerical `<=` split with no annotations.
pub fn split(
    split_index: u32,
    split_feature: usize,
    threshold: impl Into<Scalar>,
    left: DumpNode,
    right: DumpNode,
) -> DumpNode {
    DumpNode::Split(SplitNode {
        split_index,
        split_feature,
        split_gain: None,
        threshold: threshold.into(),
        decision_type: DecisionType::LessOrEqual,
        default_left: None,
        missing_type: None,
        internal_value: None,
        internal_weight: None,
        internal_count: None,
        left_child: Box::new(left),
        right_child: Box::new(right),
    })
}

/// Replace the decision type of a split node.
pub fn with_decision(mut node: DumpNode, decision: &str) -> DumpNode {
    if let DumpNode::Split(s) = &mut node {
        s.decision_type = DecisionType::from(decision.to_string());
    }
    node
}

/// Set the split gain of a split node.
pub fn with_gain(mut node: DumpNode, gain: f64) -> DumpNode {
    if let DumpNode::Split(s) = &mut node {
        s.split_gain = Some(gain.into());
    }
    node
}

/// Fill every optional annotation: gain, internal value and count on splits,
/// count on leaves.
pub fn annotated(mut node: DumpNode, gain: f64, value: f64, count: u64) -> DumpNode {
    match &mut node {
        DumpNode::Split(s) => {
            s.split_gain = Some(gain.into());
            s.internal_value = Some(value.into());
            s.internal_count = Some(count);
        }
        DumpNode::Leaf(l) => l.leaf_count = Some(count),
    }
    node
}

/// Wrap trees into a dump. An empty `names` slice leaves the dump unnamed.
pub fn dump_of(trees: Vec<DumpNode>, names: &[&str]) -> ModelDump {
    let feature_names = (!names.is_empty()).then(|| names.iter().map(|s| s.to_string()).collect());
    ModelDump {
        name: "tree".to_string(),
        num_class: 1,
        num_tree_per_iteration: 1,
        max_feature_idx: (!names.is_empty()).then(|| names.len() - 1),
        feature_names,
        tree_info: trees
            .into_iter()
            .enumerate()
            .map(|(tree_index, tree_structure)| TreeInfo {
                tree_index,
                num_leaves: tree_structure.n_leaves(),
                num_cat: 0,
                shrinkage: 1.0,
                tree_structure,
            })
            .collect(),
        ..Default::default()
    }
}

/// `split0(f0 <= 1.5) -> leaf0(-1), leaf1(1)`.
pub fn stump() -> DumpNode {
    split(0, 0, 1.5, leaf(0, -1i64), leaf(1, 1i64))
}
