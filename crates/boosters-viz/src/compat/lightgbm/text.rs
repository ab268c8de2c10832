//! LightGBM text model format parser.
//!
//! Reads the `key=value` layout written by `save_model()`: a header block,
//! one block per `Tree=<i>`, then `end of trees` followed by footer sections
//! that are not needed for plotting and are skipped.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

// =============================================================================
// Error types
// =============================================================================

/// Error type for LightGBM model parsing.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("invalid value for {field}: {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },
    #[error("array size mismatch for {field}: expected {expected}, got {actual}")]
    ArraySizeMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
}

// =============================================================================
// Decision type bitfield
// =============================================================================

/// Missing value handling recorded on a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingType {
    #[default]
    None,
    Zero,
    NaN,
}

impl MissingType {
    /// Name used in JSON dumps.
    pub fn as_str(self) -> &'static str {
        match self {
            MissingType::None => "None",
            MissingType::Zero => "Zero",
            MissingType::NaN => "NaN",
        }
    }
}

/// Parsed `decision_type` bitfield.
///
/// - Bit 0: categorical split
/// - Bit 1: missing values go left
/// - Bits 2-3: missing type (0=None, 1=Zero, 2=NaN)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecisionBits {
    pub is_categorical: bool,
    pub default_left: bool,
    pub missing_type: MissingType,
}

impl DecisionBits {
    pub fn from_i8(value: i8) -> Self {
        let v = value as u8;
        let missing_type = match (v >> 2) & 3 {
            1 => MissingType::Zero,
            2 => MissingType::NaN,
            _ => MissingType::None,
        };
        DecisionBits {
            is_categorical: v & 1 != 0,
            default_left: v & 2 != 0,
            missing_type,
        }
    }
}

// =============================================================================
// Parsed structures
// =============================================================================

/// One tree in array form. Internal nodes are `0..num_leaves-1`; a negative
/// child reference `c` points at leaf `!c`.
#[derive(Debug, Clone, Default)]
pub struct LgbTree {
    pub num_leaves: usize,
    pub num_cat: usize,
    pub split_feature: Vec<i32>,
    pub split_gain: Vec<f64>,
    pub threshold: Vec<f64>,
    pub decision_type: Vec<i8>,
    pub left_child: Vec<i32>,
    pub right_child: Vec<i32>,
    pub leaf_value: Vec<f64>,
    pub leaf_weight: Vec<f64>,
    pub leaf_count: Vec<i64>,
    pub internal_value: Vec<f64>,
    pub internal_weight: Vec<f64>,
    pub internal_count: Vec<i64>,
    pub cat_boundaries: Vec<i32>,
    pub cat_threshold: Vec<u32>,
    pub shrinkage: f64,
}

impl LgbTree {
    pub fn num_splits(&self) -> usize {
        self.num_leaves.saturating_sub(1)
    }
}

/// Model-level metadata.
#[derive(Debug, Clone, Default)]
pub struct LgbHeader {
    pub version: String,
    pub num_class: usize,
    pub num_tree_per_iteration: usize,
    pub label_index: i32,
    pub max_feature_idx: usize,
    /// Objective string as written, e.g. `binary sigmoid:1`.
    pub objective: Option<String>,
    pub feature_names: Vec<String>,
    pub feature_infos: Vec<String>,
}

/// A parsed LightGBM model.
#[derive(Debug, Clone)]
pub struct LgbModel {
    pub header: LgbHeader,
    pub trees: Vec<LgbTree>,
}

impl LgbModel {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ParseError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_string(&content)
    }

    pub fn from_string(content: &str) -> Result<Self, ParseError> {
        let mut lines = content.lines().peekable();

        let header = parse_header(&mut lines)?;

        let mut trees = Vec::new();
        while let Some(line) = lines.next() {
            if line.starts_with("Tree=") {
                trees.push(parse_tree(&mut lines)?);
            } else if line == "end of trees" {
                break;
            }
        }

        Ok(LgbModel { header, trees })
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn num_features(&self) -> usize {
        self.header.max_feature_idx + 1
    }
}

// =============================================================================
// Parsing helpers
// =============================================================================

type Lines<'a> = std::iter::Peekable<std::str::Lines<'a>>;

/// Collect `key=value` lines until `stop` matches the next line.
fn read_block(lines: &mut Lines<'_>, stop: impl Fn(&str) -> bool) -> HashMap<String, String> {
    let mut kv = HashMap::new();
    while let Some(&line) = lines.peek() {
        if stop(line) {
            break;
        }
        if let Some((k, v)) = line.split_once('=') {
            kv.insert(k.to_string(), v.to_string());
        }
        lines.next();
    }
    kv
}

fn parse_header(lines: &mut Lines<'_>) -> Result<LgbHeader, ParseError> {
    // Leading model type line ("tree") carries no '='.
    if lines.peek().is_some_and(|l| !l.contains('=')) {
        lines.next();
    }
    let kv = read_block(lines, |l| l.is_empty() || l.starts_with("Tree="));

    let num_class: usize = parse_field(&kv, "num_class")?.ok_or(ParseError::MissingField("num_class"))?;
    let max_feature_idx =
        parse_field(&kv, "max_feature_idx")?.ok_or(ParseError::MissingField("max_feature_idx"))?;

    Ok(LgbHeader {
        version: kv.get("version").cloned().unwrap_or_default(),
        num_class,
        num_tree_per_iteration: parse_field(&kv, "num_tree_per_iteration")?.unwrap_or(num_class.max(1)),
        label_index: parse_field(&kv, "label_index")?.unwrap_or(0),
        max_feature_idx,
        objective: kv.get("objective").cloned(),
        feature_names: split_words(kv.get("feature_names")),
        feature_infos: split_words(kv.get("feature_infos")),
    })
}

fn parse_tree(lines: &mut Lines<'_>) -> Result<LgbTree, ParseError> {
    let kv = read_block(lines, |l| {
        l.is_empty() || l.starts_with("Tree=") || l == "end of trees"
    });

    let num_leaves: usize =
        parse_field(&kv, "num_leaves")?.ok_or(ParseError::MissingField("num_leaves"))?;
    let mut tree = LgbTree {
        num_leaves,
        num_cat: parse_field(&kv, "num_cat")?.unwrap_or(0),
        shrinkage: parse_field(&kv, "shrinkage")?.unwrap_or(1.0),
        ..Default::default()
    };

    if num_leaves <= 1 {
        tree.leaf_value = parse_array(&kv, "leaf_value")?.unwrap_or_else(|| vec![0.0]);
        return Ok(tree);
    }

    let n_splits = tree.num_splits();

    tree.split_feature = required_array(&kv, "split_feature", n_splits)?;
    tree.threshold = required_array(&kv, "threshold", n_splits)?;
    tree.left_child = required_array(&kv, "left_child", n_splits)?;
    tree.right_child = required_array(&kv, "right_child", n_splits)?;
    tree.leaf_value = required_array(&kv, "leaf_value", num_leaves)?;

    tree.split_gain = optional_array(&kv, "split_gain", n_splits, 0.0)?;
    tree.decision_type = optional_array(&kv, "decision_type", n_splits, 0)?;
    tree.internal_value = optional_array(&kv, "internal_value", n_splits, 0.0)?;
    tree.internal_weight = optional_array(&kv, "internal_weight", n_splits, 0.0)?;
    tree.internal_count = optional_array(&kv, "internal_count", n_splits, 0)?;
    tree.leaf_weight = optional_array(&kv, "leaf_weight", num_leaves, 0.0)?;
    tree.leaf_count = optional_array(&kv, "leaf_count", num_leaves, 0)?;

    if tree.num_cat > 0 {
        tree.cat_boundaries = required_array(&kv, "cat_boundaries", tree.num_cat + 1)?;
        tree.cat_threshold = parse_array(&kv, "cat_threshold")?.unwrap_or_default();
    }

    Ok(tree)
}

fn split_words(value: Option<&String>) -> Vec<String> {
    value
        .map(|v| v.split(' ').filter(|s| !s.is_empty()).map(str::to_string).collect())
        .unwrap_or_default()
}

fn parse_field<T: FromStr>(
    kv: &HashMap<String, String>,
    field: &'static str,
) -> Result<Option<T>, ParseError> {
    kv.get(field)
        .map(|v| {
            v.trim().parse().map_err(|_| ParseError::InvalidValue {
                field,
                message: format!("cannot parse {:?}", v),
            })
        })
        .transpose()
}

fn parse_array<T: FromStr>(
    kv: &HashMap<String, String>,
    field: &'static str,
) -> Result<Option<Vec<T>>, ParseError> {
    let Some(raw) = kv.get(field) else {
        return Ok(None);
    };
    raw.split_whitespace()
        .map(|v| {
            v.parse().map_err(|_| ParseError::InvalidValue {
                field,
                message: format!("invalid element {:?}", v),
            })
        })
        .collect::<Result<Vec<T>, _>>()
        .map(Some)
}

fn required_array<T: FromStr>(
    kv: &HashMap<String, String>,
    field: &'static str,
    expected: usize,
) -> Result<Vec<T>, ParseError> {
    let arr = parse_array(kv, field)?.ok_or(ParseError::MissingField(field))?;
    validate_array_size(field, &arr, expected)?;
    Ok(arr)
}

fn optional_array<T: FromStr + Clone>(
    kv: &HashMap<String, String>,
    field: &'static str,
    expected: usize,
    fill: T,
) -> Result<Vec<T>, ParseError> {
    match parse_array(kv, field)? {
        Some(arr) => {
            validate_array_size(field, &arr, expected)?;
            Ok(arr)
        }
        None => Ok(vec![fill; expected]),
    }
}

fn validate_array_size<T>(field: &'static str, arr: &[T], expected: usize) -> Result<(), ParseError> {
    if arr.len() != expected {
        return Err(ParseError::ArraySizeMismatch {
            field,
            expected,
            actual: arr.len(),
        });
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
