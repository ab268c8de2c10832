//! Metric trajectory chart.

use bon::Builder;

use super::{check_figsize, check_limits, non_empty, Axes};
use crate::error::{PlotError, Result};
use crate::model::{require_eval_results, EvalResults, EvalSource};

/// Y axis label choice.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AxisLabel {
    /// Use the plotted metric's name.
    #[default]
    Auto,
    Text(String),
    Hidden,
}

impl From<&str> for AxisLabel {
    fn from(s: &str) -> Self {
        AxisLabel::Text(s.to_string())
    }
}

impl From<String> for AxisLabel {
    fn from(s: String) -> Self {
        AxisLabel::Text(s)
    }
}

/// Options for [`plot_metric`].
///
/// ```
/// use boosters_viz::plotting::{AxisLabel, MetricPlot};
///
/// let opts = MetricPlot::builder()
///     .metric("l2")
///     .dataset_names(vec!["valid".to_string()])
///     .ylabel(AxisLabel::Hidden)
///     .build()
///     .unwrap();
/// assert_eq!(opts.title, "Metric during training");
/// ```
#[derive(Debug, Clone, Builder)]
#[builder(derive(Clone, Debug), finish_fn(vis = "", name = __build_internal))]
pub struct MetricPlot {
    /// Metric to plot. When unset, one of the first dataset's metrics is
    /// picked.
    #[builder(into)]
    pub metric: Option<String>,

    /// Datasets to plot, in order. When unset, every recorded dataset.
    pub dataset_names: Option<Vec<String>>,

    /// Default: `(0, number of iterations)`.
    pub xlim: Option<(f64, f64)>,
    /// Default: value range padded by 20% on both sides.
    pub ylim: Option<(f64, f64)>,

    #[builder(into, default = String::from("Metric during training"))]
    pub title: String,
    #[builder(into, default = String::from("Iterations"))]
    pub xlabel: String,
    #[builder(into, default)]
    pub ylabel: AxisLabel,

    pub figsize: Option<(u32, u32)>,

    #[builder(default = true)]
    pub grid: bool,
}

impl<S: metric_plot_builder::IsComplete> MetricPlotBuilder<S> {
    /// Build and validate the options.
    pub fn build(self) -> Result<MetricPlot> {
        let opts = self.__build_internal();
        opts.validate()?;
        Ok(opts)
    }
}

impl MetricPlot {
    fn validate(&self) -> Result<()> {
        if self.dataset_names.as_ref().is_some_and(|names| names.is_empty()) {
            return Err(PlotError::InvalidParameter {
                name: "dataset_names",
                reason: "should be a non-empty list of dataset names".to_string(),
            });
        }
        check_limits("xlim", self.xlim)?;
        check_limits("ylim", self.ylim)?;
        check_figsize(self.figsize)
    }
}

impl Default for MetricPlot {
    fn default() -> Self {
        Self::builder().build().expect("default options are valid")
    }
}

/// The series a metric plot draws.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSelection<'a> {
    pub metric: &'a str,
    /// `(dataset, values)` in plotting order.
    pub series: Vec<(&'a str, &'a [f64])>,
    /// True when no metric was requested and the first dataset recorded
    /// several, so the choice was arbitrary.
    pub ambiguous: bool,
}

/// Resolve which metric and datasets to plot.
///
/// Without a requested metric, the metric recorded last for the first
/// dataset is used; if that dataset recorded several, a warning is logged
/// and the selection is marked ambiguous. Every plotted dataset must record
/// the chosen metric.
pub fn select_metric<'a>(
    evals: &'a EvalResults,
    metric: Option<&str>,
    dataset_names: Option<&'a [String]>,
) -> Result<MetricSelection<'a>> {
    if evals.is_empty() {
        return Err(PlotError::EmptyEvalResults);
    }

    let mut datasets = Vec::new();
    match dataset_names {
        None => datasets.extend(evals.dataset_names().filter_map(|n| Some((n, evals.get(n)?)))),
        Some([]) => {
            return Err(PlotError::InvalidParameter {
                name: "dataset_names",
                reason: "should be a non-empty list of dataset names".to_string(),
            });
        }
        Some(names) => {
            for name in names {
                let history = evals
                    .get(name)
                    .ok_or_else(|| PlotError::UnknownDataset(name.clone()))?;
                datasets.push((name.as_str(), history));
            }
        }
    }

    let (first_name, first) = datasets[0];
    let (metric, ambiguous) = match metric {
        Some(m) => {
            let name = first
                .names()
                .find(|n| *n == m)
                .ok_or_else(|| PlotError::MetricNotFound {
                    metric: m.to_string(),
                    dataset: first_name.to_string(),
                })?;
            (name, false)
        }
        None => {
            let (name, _) = first.last().ok_or(PlotError::EmptyEvalResults)?;
            let ambiguous = first.len() > 1;
            if ambiguous {
                log::warn!("more than one metric available, picking one to plot: {}", name);
            }
            (name, ambiguous)
        }
    };

    let mut series = Vec::with_capacity(datasets.len());
    for (name, history) in datasets {
        let values = history.get(metric).ok_or_else(|| PlotError::MetricNotFound {
            metric: metric.to_string(),
            dataset: name.to_string(),
        })?;
        series.push((name, values));
    }

    Ok(MetricSelection {
        metric,
        series,
        ambiguous,
    })
}

/// Plot one metric during training on a new [`Axes`].
pub fn plot_metric<S: EvalSource + ?Sized>(source: &S, opts: &MetricPlot) -> Result<Axes> {
    opts.validate()?;
    let mut ax = Axes::with_size(opts.figsize);
    plot_metric_on(&mut ax, source, opts)?;
    Ok(ax)
}

/// Plot one metric during training onto `ax`.
pub fn plot_metric_on<S: EvalSource + ?Sized>(
    ax: &mut Axes,
    source: &S,
    opts: &MetricPlot,
) -> Result<()> {
    opts.validate()?;
    let evals = require_eval_results(source)?;
    let selection = select_metric(evals, opts.metric.as_deref(), opts.dataset_names.as_deref())?;

    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for &(name, values) in &selection.series {
        let points = values.iter().enumerate().map(|(i, &v)| (i as f64, v)).collect();
        ax.plot(points, Some(name));
        for &v in values {
            lo = lo.min(v);
            hi = hi.max(v);
        }
    }
    let num_iteration = selection.series[0].1.len();

    ax.xlim = Some(opts.xlim.unwrap_or((0.0, num_iteration as f64)));
    ax.ylim = Some(match opts.ylim {
        Some(ylim) => ylim,
        None if lo <= hi => {
            let range = hi - lo;
            (lo - range * 0.2, hi + range * 0.2)
        }
        None => (0.0, 1.0),
    });
    ax.legend = true;

    ax.title = non_empty(&opts.title);
    ax.xlabel = non_empty(&opts.xlabel);
    ax.ylabel = match &opts.ylabel {
        AxisLabel::Auto => Some(selection.metric.to_string()),
        AxisLabel::Text(text) => non_empty(text),
        AxisLabel::Hidden => None,
    };
    ax.grid = opts.grid;
    Ok(())
}
