//! Conversion from array-encoded LightGBM trees to the nested model dump.

use crate::model::{DecisionType, DumpNode, LeafNode, ModelDump, Scalar, SplitNode, TreeInfo};

use super::text::{DecisionBits, LgbModel, LgbTree};

/// Error type for LightGBM model conversion.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("tree {0} has no leaves")]
    EmptyTree(usize),
    #[error("tree {tree}: invalid child index {child} at node {node}")]
    InvalidChildIndex { tree: usize, node: usize, child: i32 },
    #[error("tree {tree}: node {node} is reachable more than once")]
    CyclicTree { tree: usize, node: usize },
    #[error("tree {tree}: invalid categorical threshold at node {node}")]
    InvalidCategorical { tree: usize, node: usize },
    #[error("tree {tree}: negative split feature at node {node}")]
    InvalidFeature { tree: usize, node: usize },
}

impl LgbModel {
    /// Build the nested dump, the same layout LightGBM's `dump_model()`
    /// returns.
    pub fn to_dump(&self) -> Result<ModelDump, ConversionError> {
        let tree_info = self
            .trees
            .iter()
            .enumerate()
            .map(|(idx, tree)| {
                Ok(TreeInfo {
                    tree_index: idx,
                    num_leaves: tree.num_leaves,
                    num_cat: tree.num_cat,
                    shrinkage: tree.shrinkage,
                    tree_structure: convert_tree(tree, idx)?,
                })
            })
            .collect::<Result<Vec<_>, ConversionError>>()?;

        let header = &self.header;
        Ok(ModelDump {
            name: "tree".to_string(),
            version: header.version.clone(),
            num_class: header.num_class,
            num_tree_per_iteration: header.num_tree_per_iteration,
            label_index: header.label_index,
            max_feature_idx: Some(header.max_feature_idx),
            objective: header.objective.clone(),
            feature_names: (!header.feature_names.is_empty()).then(|| header.feature_names.clone()),
            tree_info,
        })
    }
}

fn convert_tree(tree: &LgbTree, tree_idx: usize) -> Result<DumpNode, ConversionError> {
    if tree.num_leaves == 0 {
        return Err(ConversionError::EmptyTree(tree_idx));
    }
    if tree.num_leaves == 1 {
        return Ok(DumpNode::Leaf(LeafNode {
            leaf_index: 0,
            leaf_value: tree.leaf_value.first().copied().unwrap_or(0.0).into(),
            leaf_weight: None,
            leaf_count: None,
        }));
    }

    let mut builder = DumpBuilder {
        tree,
        tree_idx,
        visited: vec![false; tree.num_splits()],
    };
    builder.node(0, 0)
}

struct DumpBuilder<'a> {
    tree: &'a LgbTree,
    tree_idx: usize,
    visited: Vec<bool>,
}

impl DumpBuilder<'_> {
    /// Convert the child reference `child` found at internal node `parent`.
    fn node(&mut self, child: i32, parent: usize) -> Result<DumpNode, ConversionError> {
        let tree = self.tree;
        let invalid = || ConversionError::InvalidChildIndex {
            tree: self.tree_idx,
            node: parent,
            child,
        };

        if child < 0 {
            let leaf = (!child) as usize;
            if leaf >= tree.num_leaves {
                return Err(invalid());
            }
            return Ok(DumpNode::Leaf(LeafNode {
                leaf_index: leaf as u32,
                leaf_value: tree.leaf_value[leaf].into(),
                leaf_weight: Some(tree.leaf_weight[leaf].into()),
                leaf_count: Some(tree.leaf_count[leaf].max(0) as u64),
            }));
        }

        let idx = child as usize;
        if idx >= tree.num_splits() {
            return Err(invalid());
        }
        if std::mem::replace(&mut self.visited[idx], true) {
            return Err(ConversionError::CyclicTree {
                tree: self.tree_idx,
                node: idx,
            });
        }

        let bits = DecisionBits::from_i8(tree.decision_type[idx]);
        let (threshold, decision_type) = if bits.is_categorical {
            (Scalar::Text(self.categories(idx)?), DecisionType::Equal)
        } else {
            (tree.threshold[idx].into(), DecisionType::LessOrEqual)
        };
        let split_feature = usize::try_from(tree.split_feature[idx]).map_err(|_| {
            ConversionError::InvalidFeature {
                tree: self.tree_idx,
                node: idx,
            }
        })?;

        let left_child = Box::new(self.node(tree.left_child[idx], idx)?);
        let right_child = Box::new(self.node(tree.right_child[idx], idx)?);

        Ok(DumpNode::Split(SplitNode {
            split_index: idx as u32,
            split_feature,
            split_gain: Some(tree.split_gain[idx].into()),
            threshold,
            decision_type,
            default_left: Some(bits.default_left),
            missing_type: Some(bits.missing_type.as_str().to_string()),
            internal_value: Some(tree.internal_value[idx].into()),
            internal_weight: Some(tree.internal_weight[idx].into()),
            internal_count: Some(tree.internal_count[idx].max(0) as u64),
            left_child,
            right_child,
        }))
    }

    /// Categories routed left at a categorical split, joined as `a||b||c`.
    fn categories(&self, idx: usize) -> Result<String, ConversionError> {
        let tree = self.tree;
        let invalid = || ConversionError::InvalidCategorical {
            tree: self.tree_idx,
            node: idx,
        };

        // The threshold of a categorical split indexes `cat_boundaries`.
        let raw = tree.threshold[idx];
        if !(raw >= 0.0 && raw.fract() == 0.0 && raw < usize::MAX as f64) {
            return Err(invalid());
        }
        let cat_idx = raw as usize;
        let next = cat_idx.checked_add(1).ok_or_else(invalid)?;
        let (start, end) = match (tree.cat_boundaries.get(cat_idx), tree.cat_boundaries.get(next)) {
            (Some(&s), Some(&e)) if 0 <= s && s <= e => (s as usize, e as usize),
            _ => return Err(invalid()),
        };
        let words = tree.cat_threshold.get(start..end).ok_or_else(invalid)?;

        let cats: Vec<String> = words
            .iter()
            .enumerate()
            .flat_map(|(w, &word)| {
                (0..32u32)
                    .filter(move |bit| word >> bit & 1 == 1)
                    .map(move |bit| (w as u32 * 32 + bit).to_string())
            })
            .collect();
        Ok(cats.join("||"))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn stump() -> LgbTree {
        LgbTree {
            num_leaves: 2,
            split_feature: vec![1],
            split_gain: vec![2.5],
            threshold: vec![0.5],
            decision_type: vec![2],
            left_child: vec![-1],
            right_child: vec![-2],
            leaf_value: vec![-1.0, 1.0],
            leaf_weight: vec![3.0, 4.0],
            leaf_count: vec![3, 4],
            internal_value: vec![0.0],
            internal_weight: vec![7.0],
            internal_count: vec![7],
            shrinkage: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn converts_numeric_stump() {
        let node = convert_tree(&stump(), 0).unwrap();
        let DumpNode::Split(split) = node else {
            panic!("expected split");
        };
        assert_eq!(split.split_feature, 1);
        assert_eq!(split.decision_type, DecisionType::LessOrEqual);
        assert_eq!(split.threshold.as_f64(), Some(0.5));
        assert_eq!(split.default_left, Some(true));
        assert_eq!(split.internal_count, Some(7));

        let DumpNode::Leaf(right) = *split.right_child else {
            panic!("expected leaf");
        };
        assert_eq!(right.leaf_index, 1);
        assert_eq!(right.leaf_count, Some(4));
    }

    #[test]
    fn converts_categorical_threshold() {
        let mut tree = stump();
        tree.decision_type = vec![1];
        tree.threshold = vec![0.0];
        tree.num_cat = 1;
        tree.cat_boundaries = vec![0, 2];
        tree.cat_threshold = vec![0b1010, 0b1];

        let DumpNode::Split(split) = convert_tree(&tree, 0).unwrap() else {
            panic!("expected split");
        };
        assert_eq!(split.decision_type, DecisionType::Equal);
        assert_eq!(split.threshold, Scalar::Text("1||3||32".to_string()));
    }

    #[test]
    fn rejects_bad_categorical_index() {
        for threshold in [-1.0, 0.5, 1e300, f64::NAN, 5.0] {
            let mut tree = stump();
            tree.decision_type = vec![1];
            tree.threshold = vec![threshold];
            tree.num_cat = 1;
            tree.cat_boundaries = vec![0, 1];
            tree.cat_threshold = vec![0b1];

            assert!(
                matches!(
                    convert_tree(&tree, 2),
                    Err(ConversionError::InvalidCategorical { tree: 2, node: 0 })
                ),
                "threshold {} accepted",
                threshold
            );
        }
    }

    #[test]
    fn rejects_out_of_range_child() {
        let mut tree = stump();
        tree.right_child = vec![-5];
        let err = convert_tree(&tree, 3).unwrap_err();
        assert!(matches!(
            err,
            ConversionError::InvalidChildIndex { tree: 3, node: 0, child: -5 }
        ));
    }

    #[test]
    fn rejects_cycles() {
        let mut tree = stump();
        tree.num_leaves = 3;
        tree.split_feature = vec![0, 0];
        tree.split_gain = vec![1.0, 1.0];
        tree.threshold = vec![0.5, 0.5];
        tree.decision_type = vec![0, 0];
        tree.left_child = vec![1, 0];
        tree.right_child = vec![-1, -2];
        tree.internal_value = vec![0.0, 0.0];
        tree.internal_weight = vec![0.0, 0.0];
        tree.internal_count = vec![0, 0];
        tree.leaf_value = vec![0.0; 3];
        tree.leaf_weight = vec![0.0; 3];
        tree.leaf_count = vec![0; 3];

        let err = convert_tree(&tree, 0).unwrap_err();
        assert!(matches!(err, ConversionError::CyclicTree { node: 0, .. }));
    }
}
