//! Feature importance bar chart.

use bon::Builder;

use super::{
    check_figsize, check_limits, check_positive, format_value, non_empty, Axes, HAlign, Rgb, VAlign,
};
use crate::error::{PlotError, Result};
use crate::explainability::{FeatureImportance, ImportanceType};
use crate::model::TreeModel;

/// Options for [`plot_importance`].
///
/// ```
/// use boosters_viz::explainability::ImportanceType;
/// use boosters_viz::plotting::ImportancePlot;
///
/// let opts = ImportancePlot::builder()
///     .importance_type(ImportanceType::Gain)
///     .max_num_features(10)
///     .precision(2)
///     .build()
///     .unwrap();
/// assert!(opts.ignore_zero);
/// ```
#[derive(Debug, Clone, Builder)]
#[builder(derive(Clone, Debug), finish_fn(vis = "", name = __build_internal))]
pub struct ImportancePlot {
    /// Bar thickness. Default: 0.2.
    #[builder(default = 0.2)]
    pub height: f64,

    /// Default: `(0, 1.1 * max)`.
    pub xlim: Option<(f64, f64)>,
    /// Default: `(-1, number of bars)`.
    pub ylim: Option<(f64, f64)>,

    /// Empty hides the title.
    #[builder(into, default = String::from("Feature importance"))]
    pub title: String,
    #[builder(into, default = String::from("Feature importance"))]
    pub xlabel: String,
    #[builder(into, default = String::from("Features"))]
    pub ylabel: String,

    #[builder(default)]
    pub importance_type: ImportanceType,

    /// Keep only this many of the most important features. `0` keeps all.
    pub max_num_features: Option<usize>,

    /// Drop features with zero importance. Default: true.
    #[builder(default = true)]
    pub ignore_zero: bool,

    /// Figure size in pixels, used when a new [`Axes`] is created.
    pub figsize: Option<(u32, u32)>,

    #[builder(default = true)]
    pub grid: bool,

    /// Decimals shown for gain values.
    pub precision: Option<usize>,

    /// Bar color. Default: next palette color.
    pub color: Option<Rgb>,
}

impl<S: importance_plot_builder::IsComplete> ImportancePlotBuilder<S> {
    /// Build and validate the options.
    pub fn build(self) -> Result<ImportancePlot> {
        let opts = self.__build_internal();
        opts.validate()?;
        Ok(opts)
    }
}

impl ImportancePlot {
    fn validate(&self) -> Result<()> {
        check_positive("height", self.height)?;
        check_limits("xlim", self.xlim)?;
        check_limits("ylim", self.ylim)?;
        check_figsize(self.figsize)
    }
}

impl Default for ImportancePlot {
    fn default() -> Self {
        Self::builder().build().expect("default options are valid")
    }
}

/// The `(name, value)` pairs drawn, bottom bar first.
///
/// Sorted ascending by value (ties keep feature order), zero values dropped
/// when `ignore_zero`, then the last `max_num_features` kept.
pub fn importance_bars(
    importance: &FeatureImportance,
    ignore_zero: bool,
    max_num_features: Option<usize>,
) -> Result<Vec<(&str, f64)>> {
    if importance.is_empty() {
        return Err(PlotError::EmptyImportance);
    }
    let mut pairs = importance.sorted_ascending();
    if ignore_zero {
        pairs.retain(|&(_, v)| v > 0.0);
    }
    if let Some(n) = max_num_features.filter(|&n| n > 0) {
        let skip = pairs.len().saturating_sub(n);
        pairs.drain(..skip);
    }
    if pairs.is_empty() {
        return Err(PlotError::EmptyImportance);
    }
    Ok(pairs)
}

/// Plot feature importance on a new [`Axes`].
pub fn plot_importance<M: TreeModel + ?Sized>(model: &M, opts: &ImportancePlot) -> Result<Axes> {
    opts.validate()?;
    let mut ax = Axes::with_size(opts.figsize);
    plot_importance_on(&mut ax, model, opts)?;
    Ok(ax)
}

/// Plot feature importance onto `ax`. Nothing is drawn on error.
pub fn plot_importance_on<M: TreeModel + ?Sized>(
    ax: &mut Axes,
    model: &M,
    opts: &ImportancePlot,
) -> Result<()> {
    opts.validate()?;
    let importance = FeatureImportance::from_model(model, opts.importance_type);
    let pairs = importance_bars(&importance, opts.ignore_zero, opts.max_num_features)?;

    ax.barh(
        pairs.iter().enumerate().map(|(i, &(_, v))| (i as f64, v)),
        opts.height,
        opts.color,
    );
    for (i, &(_, v)) in pairs.iter().enumerate() {
        let label = match importance.importance_type() {
            ImportanceType::Gain => format_value(v, opts.precision),
            ImportanceType::Split => format!("{}", v),
        };
        ax.text(v + 1.0, i as f64, label, HAlign::Left, VAlign::Center);
    }
    ax.yticks = Some(
        pairs
            .iter()
            .enumerate()
            .map(|(i, &(name, _))| (i as f64, name.to_string()))
            .collect(),
    );

    let max = pairs.iter().map(|&(_, v)| v).fold(f64::NEG_INFINITY, f64::max);
    ax.xlim = Some(opts.xlim.unwrap_or((0.0, max * 1.1)));
    ax.ylim = Some(opts.ylim.unwrap_or((-1.0, pairs.len() as f64)));

    ax.title = non_empty(&opts.title);
    ax.xlabel = non_empty(&opts.xlabel);
    ax.ylabel = non_empty(&opts.ylabel);
    ax.grid = opts.grid;
    Ok(())
}
