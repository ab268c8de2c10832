//! Nested JSON model dump.
//!
//! Mirrors the layout LightGBM produces from `dump_model()`: a header with
//! feature names and a `tree_info` list whose entries carry the recursive
//! `tree_structure`. Internal nodes are recognised by `split_index`, leaves
//! by its absence.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Number;

// =============================================================================
// Scalar
// =============================================================================

/// A numeric annotation as written in the dump, or text for categorical
/// thresholds (`"0||3||7"`).
///
/// Numbers keep their written form so that an integer leaf value renders as
/// `-1` and a float as `1.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(Number),
    Text(String),
}

impl Scalar {
    /// Numeric value, `None` for text.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => n.as_f64(),
            Scalar::Text(_) => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Scalar::Text(_))
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        // Non-finite values have no JSON number form.
        match Number::from_f64(value) {
            Some(n) => Scalar::Number(n),
            None => Scalar::Text(value.to_string()),
        }
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Number(value.into())
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

// =============================================================================
// DecisionType
// =============================================================================

/// Comparison used at an internal node.
///
/// Anything other than `<=` and `==` is kept as [`DecisionType::Other`] so a
/// malformed dump still deserializes; the tree walker rejects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DecisionType {
    /// Numerical split, left if `value <= threshold`.
    LessOrEqual,
    /// Categorical split, left if the category is in the threshold set.
    Equal,
    Other(String),
}

impl DecisionType {
    pub fn as_str(&self) -> &str {
        match self {
            DecisionType::LessOrEqual => "<=",
            DecisionType::Equal => "==",
            DecisionType::Other(s) => s,
        }
    }
}

impl From<String> for DecisionType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "<=" => DecisionType::LessOrEqual,
            "==" => DecisionType::Equal,
            _ => DecisionType::Other(s),
        }
    }
}

impl From<DecisionType> for String {
    fn from(dt: DecisionType) -> Self {
        dt.as_str().to_string()
    }
}

// =============================================================================
// Nodes
// =============================================================================

/// One node of a dumped tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DumpNode {
    Split(SplitNode),
    Leaf(LeafNode),
}

/// Every field either node kind may carry. Children are read straight into
/// [`DumpNode`], so nesting is streamed instead of buffered per level.
#[derive(Deserialize)]
struct RawNode {
    split_index: Option<u32>,
    split_feature: Option<usize>,
    split_gain: Option<Scalar>,
    threshold: Option<Scalar>,
    decision_type: Option<DecisionType>,
    default_left: Option<bool>,
    missing_type: Option<String>,
    internal_value: Option<Scalar>,
    internal_weight: Option<Scalar>,
    internal_count: Option<u64>,
    left_child: Option<Box<DumpNode>>,
    right_child: Option<Box<DumpNode>>,
    leaf_index: Option<u32>,
    leaf_value: Option<Scalar>,
    leaf_weight: Option<Scalar>,
    leaf_count: Option<u64>,
}

impl RawNode {
    fn into_node(self) -> Result<DumpNode, String> {
        fn required<T>(value: Option<T>, node: &str, field: &str) -> Result<T, String> {
            value.ok_or_else(|| format!("{} node is missing `{}`", node, field))
        }

        match self.split_index {
            Some(split_index) => Ok(DumpNode::Split(SplitNode {
                split_index,
                split_feature: required(self.split_feature, "split", "split_feature")?,
                split_gain: self.split_gain,
                threshold: required(self.threshold, "split", "threshold")?,
                decision_type: required(self.decision_type, "split", "decision_type")?,
                default_left: self.default_left,
                missing_type: self.missing_type,
                internal_value: self.internal_value,
                internal_weight: self.internal_weight,
                internal_count: self.internal_count,
                left_child: required(self.left_child, "split", "left_child")?,
                right_child: required(self.right_child, "split", "right_child")?,
            })),
            None => Ok(DumpNode::Leaf(LeafNode {
                leaf_index: self.leaf_index.unwrap_or(0),
                leaf_value: required(self.leaf_value, "leaf", "leaf_value")?,
                leaf_weight: self.leaf_weight,
                leaf_count: self.leaf_count,
            })),
        }
    }
}

impl<'de> Deserialize<'de> for DumpNode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawNode::deserialize(deserializer)?
            .into_node()
            .map_err(serde::de::Error::custom)
    }
}

/// Internal node with exactly two children.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitNode {
    pub split_index: u32,
    pub split_feature: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split_gain: Option<Scalar>,
    pub threshold: Scalar,
    pub decision_type: DecisionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_left: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_value: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_weight: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_count: Option<u64>,
    pub left_child: Box<DumpNode>,
    pub right_child: Box<DumpNode>,
}

/// Terminal node.
///
/// Single-leaf trees are dumped without `leaf_index`; it defaults to 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeafNode {
    pub leaf_index: u32,
    pub leaf_value: Scalar,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leaf_weight: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leaf_count: Option<u64>,
}

impl DumpNode {
    pub fn is_leaf(&self) -> bool {
        matches!(self, DumpNode::Leaf(_))
    }

    /// Number of internal nodes in this subtree.
    pub fn n_splits(&self) -> usize {
        match self {
            DumpNode::Split(s) => 1 + s.left_child.n_splits() + s.right_child.n_splits(),
            DumpNode::Leaf(_) => 0,
        }
    }

    /// Number of leaves in this subtree.
    pub fn n_leaves(&self) -> usize {
        match self {
            DumpNode::Split(s) => s.left_child.n_leaves() + s.right_child.n_leaves(),
            DumpNode::Leaf(_) => 1,
        }
    }

    /// Visit every internal node in pre-order.
    pub fn for_each_split<'a>(&'a self, f: &mut impl FnMut(&'a SplitNode)) {
        if let DumpNode::Split(s) = self {
            f(s);
            s.left_child.for_each_split(f);
            s.right_child.for_each_split(f);
        }
    }
}

// =============================================================================
// Model
// =============================================================================

/// One tree of the ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeInfo {
    #[serde(default)]
    pub tree_index: usize,
    #[serde(default)]
    pub num_leaves: usize,
    #[serde(default)]
    pub num_cat: usize,
    #[serde(default = "default_shrinkage")]
    pub shrinkage: f64,
    pub tree_structure: DumpNode,
}

fn default_shrinkage() -> f64 {
    1.0
}

/// Full model dump.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelDump {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default = "default_one")]
    pub num_class: usize,
    #[serde(default = "default_one")]
    pub num_tree_per_iteration: usize,
    #[serde(default)]
    pub label_index: i32,
    /// Largest feature index, `None` when the dump omits it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_feature_idx: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objective: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
    #[serde(default)]
    pub tree_info: Vec<TreeInfo>,
}

fn default_name() -> String {
    "tree".to_string()
}

fn default_one() -> usize {
    1
}

impl ModelDump {
    /// Parse a dump from JSON text.
    ///
    /// Tree depth is not capped; deep nesting grows the stack on demand.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut de = serde_json::Deserializer::from_str(json);
        de.disable_recursion_limit();
        let dump = Self::deserialize(serde_stacker::Deserializer::new(&mut de))?;
        de.end()?;
        Ok(dump)
    }

    /// Load a dump from a JSON file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content).map_err(std::io::Error::from)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn num_trees(&self) -> usize {
        self.tree_info.len()
    }

    /// Number of input features.
    ///
    /// Taken from `max_feature_idx`, then the feature name list, then the
    /// largest split feature seen in the trees.
    pub fn num_features(&self) -> usize {
        if let Some(max) = self.max_feature_idx {
            return max + 1;
        }
        if let Some(names) = &self.feature_names {
            return names.len();
        }
        let mut n = 0;
        for info in &self.tree_info {
            info.tree_structure
                .for_each_split(&mut |s| n = n.max(s.split_feature + 1));
        }
        n
    }
}

// =============================================================================
// Tests
// =============================================================================
