//! Split value histogram chart.

use bon::Builder;

use super::{check_figsize, check_limits, check_positive, non_empty, Axes, Rgb};
use crate::error::{PlotError, Result};
use crate::explainability::{Bins, FeatureRef};
use crate::model::TreeModel;

/// Options for [`plot_split_value_histogram`].
///
/// The title may contain `@feature@`, replaced by the feature as given, and
/// `@index/name@`, replaced by `index` or `name`.
#[derive(Debug, Clone, Builder)]
#[builder(derive(Clone, Debug), finish_fn(vis = "", name = __build_internal))]
pub struct SplitHistogramPlot {
    #[builder(default)]
    pub bins: Bins,

    /// Bar width as a fraction of the bin width. Default: 0.8.
    #[builder(default = 0.8)]
    pub width_coef: f64,

    /// Default: bin range padded by 20% on both sides.
    pub xlim: Option<(f64, f64)>,
    /// Default: `(0, 1.1 * max count)`.
    pub ylim: Option<(f64, f64)>,

    #[builder(into, default = String::from("Split value histogram for feature with @index/name@ @feature@"))]
    pub title: String,
    #[builder(into, default = String::from("Feature split value"))]
    pub xlabel: String,
    #[builder(into, default = String::from("Count"))]
    pub ylabel: String,

    pub figsize: Option<(u32, u32)>,

    #[builder(default = true)]
    pub grid: bool,

    /// Bar color. Default: next palette color.
    pub color: Option<Rgb>,
}

impl<S: split_histogram_plot_builder::IsComplete> SplitHistogramPlotBuilder<S> {
    /// Build and validate the options.
    pub fn build(self) -> Result<SplitHistogramPlot> {
        let opts = self.__build_internal();
        opts.validate()?;
        Ok(opts)
    }
}

impl SplitHistogramPlot {
    fn validate(&self) -> Result<()> {
        check_positive("width_coef", self.width_coef)?;
        check_limits("xlim", self.xlim)?;
        check_limits("ylim", self.ylim)?;
        check_figsize(self.figsize)
    }

    /// Title with its placeholders filled in for `feature`.
    pub fn title_for(&self, feature: &FeatureRef) -> String {
        self.title
            .replace("@feature@", &feature.to_string())
            .replace("@index/name@", feature.kind())
    }
}

impl Default for SplitHistogramPlot {
    fn default() -> Self {
        Self::builder().build().expect("default options are valid")
    }
}

/// Plot the split value histogram of `feature` on a new [`Axes`].
pub fn plot_split_value_histogram<M: TreeModel + ?Sized>(
    model: &M,
    feature: &FeatureRef,
    opts: &SplitHistogramPlot,
) -> Result<Axes> {
    opts.validate()?;
    let mut ax = Axes::with_size(opts.figsize);
    plot_split_value_histogram_on(&mut ax, model, feature, opts)?;
    Ok(ax)
}

/// Plot the split value histogram of `feature` onto `ax`.
///
/// Fails with [`PlotError::FeatureNotUsed`] and draws nothing when no split
/// uses the feature.
pub fn plot_split_value_histogram_on<M: TreeModel + ?Sized>(
    ax: &mut Axes,
    model: &M,
    feature: &FeatureRef,
    opts: &SplitHistogramPlot,
) -> Result<()> {
    opts.validate()?;
    let hist = model.split_value_histogram(feature, &opts.bins)?;
    if hist.is_all_zero() {
        return Err(PlotError::FeatureNotUsed(feature.to_string()));
    }

    let width = opts.width_coef * hist.bin_width();
    let counts = hist.counts.iter().map(|&c| c as f64);
    ax.bar(hist.midpoints().into_iter().zip(counts), width, opts.color);

    let (first, last) = (hist.edges[0], hist.edges[hist.edges.len() - 1]);
    let range = last - first;
    ax.xlim = Some(opts.xlim.unwrap_or((first - range * 0.2, last + range * 0.2)));
    let max = hist.counts.iter().copied().max().unwrap_or(0) as f64;
    ax.ylim = Some(opts.ylim.unwrap_or((0.0, max * 1.1)));
    ax.integer_yticks = true;

    ax.title = non_empty(&opts.title_for(feature));
    ax.xlabel = non_empty(&opts.xlabel);
    ax.ylabel = non_empty(&opts.ylabel);
    ax.grid = opts.grid;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{dump_of, leaf, split};
    use approx::assert_relative_eq;

    fn model() -> crate::model::ModelDump {
        let t0 = split(0, 0, 1.0, split(1, 0, 3.0, leaf(0, 0.0), leaf(1, 0.0)), leaf(2, 0.0));
        let t1 = split(0, 0, 3.0, leaf(0, 0.0), leaf(1, 0.0));
        dump_of(vec![t0, t1], &["age", "income"])
    }

    #[test]
    fn bars_at_midpoints() {
        let opts = SplitHistogramPlot::builder()
            .bins(Bins::Count(2))
            .color(Rgb(0, 128, 0))
            .build()
            .unwrap();
        let ax = plot_split_value_histogram(&model(), &FeatureRef::Index(0), &opts).unwrap();

        let bars: Vec<_> = ax.bars().collect();
        assert_eq!(bars.len(), 2);
        assert!(bars.iter().all(|b| b.color == Rgb(0, 128, 0)));
        assert_relative_eq!(bars[0].position, 1.5);
        assert_relative_eq!(bars[1].position, 2.5);
        assert_eq!(bars[0].value, 1.0);
        assert_eq!(bars[1].value, 2.0);
        assert_relative_eq!(bars[0].thickness, 0.8);

        let (lo, hi) = ax.xlim.unwrap();
        assert_relative_eq!(lo, 0.6);
        assert_relative_eq!(hi, 3.4);
        let (_, top) = ax.ylim.unwrap();
        assert_relative_eq!(top, 2.2);
        assert!(ax.integer_yticks);
    }

    #[test]
    fn title_placeholders() {
        let opts = SplitHistogramPlot::default();
        assert_eq!(
            opts.title_for(&FeatureRef::Name("age".into())),
            "Split value histogram for feature with name age"
        );
        assert_eq!(
            opts.title_for(&FeatureRef::Index(3)),
            "Split value histogram for feature with index 3"
        );
    }

    #[test]
    fn unused_feature_draws_nothing() {
        let mut ax = Axes::new();
        let err = plot_split_value_histogram_on(
            &mut ax,
            &model(),
            &FeatureRef::Name("income".into()),
            &SplitHistogramPlot::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PlotError::FeatureNotUsed(ref f) if f == "income"));
        assert!(ax.artists().is_empty());
        assert!(ax.title.is_none());
    }

    #[test]
    fn width_coef_must_be_positive() {
        assert!(matches!(
            SplitHistogramPlot::builder().width_coef(-1.0).build(),
            Err(PlotError::InvalidParameter { name: "width_coef", .. })
        ));
    }
}
