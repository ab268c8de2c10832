//! Diagnostic plots of a trained tree ensemble.
//!
//! | Function | Draws |
//! |---|---|
//! | [`plot_importance`] | horizontal bars of per-feature importance |
//! | [`plot_split_value_histogram`] | histogram of a feature's split thresholds |
//! | [`plot_metric`] | one evaluation metric across iterations, per dataset |
//! | [`create_tree_digraph`] | one tree as a [`Digraph`](crate::graph::Digraph) |
//! | [`plot_tree`] | one tree rasterized by Graphviz onto an [`Axes`] |
//!
//! Every chart renderer has an `_on` variant that draws onto an existing
//! [`Axes`] instead of creating one. Options are built with `bon` builders
//! whose `build()` validates them.

mod axes;
mod importance;
mod metric;
mod render;
mod split_hist;
mod tree;

pub use axes::{
    Annotation, Artist, Axes, Bar, BarDirection, HAlign, Line, Rgb, VAlign, DEFAULT_SIZE, PALETTE,
};
pub use importance::{importance_bars, plot_importance, plot_importance_on, ImportancePlot};
pub use metric::{plot_metric, plot_metric_on, select_metric, AxisLabel, MetricPlot, MetricSelection};
pub use render::plotting_available;
pub use split_hist::{
    plot_split_value_histogram, plot_split_value_histogram_on, SplitHistogramPlot,
};
pub use tree::{add_tree, create_tree_digraph, plot_tree, plot_tree_on, ShowInfo, TreeDigraph, TreePlot};

use crate::error::{PlotError, Result};
use crate::model::Scalar;

/// Render a dump annotation.
///
/// Numbers get exactly `precision` decimals when a precision is given. Text
/// passes through, and without a precision numbers keep their written form.
pub fn format_scalar(value: &Scalar, precision: Option<usize>) -> String {
    match (value, precision) {
        (Scalar::Number(n), Some(p)) => match n.as_f64() {
            Some(v) => format!("{:.*}", p, v),
            None => n.to_string(),
        },
        _ => value.to_string(),
    }
}

/// Render a computed value with the same rule as [`format_scalar`].
pub fn format_value(value: f64, precision: Option<usize>) -> String {
    match precision {
        Some(p) => format!("{:.*}", p, value),
        None => format!("{:?}", value),
    }
}

pub(crate) fn check_limits(name: &'static str, limits: Option<(f64, f64)>) -> Result<()> {
    match limits {
        Some((lo, hi)) if !lo.is_finite() || !hi.is_finite() || lo == hi => {
            Err(PlotError::InvalidParameter {
                name,
                reason: format!("must be 2 distinct finite values, got ({}, {})", lo, hi),
            })
        }
        _ => Ok(()),
    }
}

pub(crate) fn check_figsize(figsize: Option<(u32, u32)>) -> Result<()> {
    match figsize {
        Some((w, h)) if w == 0 || h == 0 => Err(PlotError::InvalidParameter {
            name: "figsize",
            reason: format!("must be positive, got ({}, {})", w, h),
        }),
        _ => Ok(()),
    }
}

pub(crate) fn check_positive(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PlotError::InvalidParameter {
            name,
            reason: format!("must be positive, got {}", value),
        })
    }
}

/// Empty strings mean "no label".
pub(crate) fn non_empty(label: &str) -> Option<String> {
    (!label.is_empty()).then(|| label.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Scalar::from(1.5), None, "1.5")]
    #[case(Scalar::from(1.0), None, "1.0")]
    #[case(Scalar::from(-1i64), None, "-1")]
    #[case(Scalar::from(1.23456), Some(2), "1.23")]
    #[case(Scalar::from(-1i64), Some(3), "-1.000")]
    #[case(Scalar::from("1||3"), Some(2), "1||3")]
    fn scalar_formatting(#[case] value: Scalar, #[case] precision: Option<usize>, #[case] expected: &str) {
        assert_eq!(format_scalar(&value, precision), expected);
    }

    #[test]
    fn value_formatting() {
        assert_eq!(format_value(12.5, None), "12.5");
        assert_eq!(format_value(10.0, None), "10.0");
        assert_eq!(format_value(2.0 / 3.0, Some(3)), "0.667");
    }

    #[test]
    fn limit_validation() {
        assert!(check_limits("xlim", None).is_ok());
        assert!(check_limits("xlim", Some((0.0, 1.0))).is_ok());
        assert!(check_limits("xlim", Some((1.0, 1.0))).is_err());
        assert!(matches!(
            check_limits("ylim", Some((0.0, f64::NAN))),
            Err(PlotError::InvalidParameter { name: "ylim", .. })
        ));
        assert!(check_figsize(Some((0, 10))).is_err());
    }
}
