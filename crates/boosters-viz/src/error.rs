//! Error type shared by the renderers.

/// Errors raised while extracting data from a model or rendering it.
#[derive(Debug, thiserror::Error)]
pub enum PlotError {
    // === Validation ===
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("model carries no evaluation results")]
    MissingEvalResults,

    // === Empty results ===
    #[error("model's feature importance is empty")]
    EmptyImportance,
    #[error("cannot plot split value histogram, because feature {0} was not used in splitting")]
    FeatureNotUsed(String),
    #[error("eval results cannot be empty")]
    EmptyEvalResults,
    #[error("no metric {metric} in eval results for dataset {dataset}")]
    MetricNotFound { metric: String, dataset: String },
    #[error("no dataset {0} in eval results")]
    UnknownDataset(String),
    #[error("no feature named {0} in model")]
    UnknownFeature(String),
    #[error("tree_index {index} is out of range (model has {num_trees} trees)")]
    TreeIndexOutOfRange { index: usize, num_trees: usize },

    // === Malformed tree description ===
    #[error("malformed tree model: {0}")]
    MalformedTree(String),
    #[error("{node} has no {field} field")]
    MissingField { node: String, field: &'static str },

    // === Backends ===
    #[error("{backend} is not available, it is required to {purpose}")]
    BackendUnavailable {
        backend: &'static str,
        purpose: &'static str,
    },
    #[error("graphviz {engine} exited with {status}: {stderr}")]
    Graphviz {
        engine: String,
        status: String,
        stderr: String,
    },
    #[error("render error: {0}")]
    Render(String),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PlotError>;
