//! Command line front end for the diagnostic plots.
//!
//! Usage: boosters-viz <COMMAND> --model <MODEL> [OPTIONS]
//!
//! Charts are written as SVG, rasterized trees as PNG and tree graphs as DOT
//! source. Set `RUST_LOG=debug` for backend details.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use boosters_viz::explainability::{Bins, FeatureRef, ImportanceType};
use boosters_viz::model::{Booster, EvalResults};
use boosters_viz::plotting::{
    create_tree_digraph, plot_importance, plot_metric, plot_split_value_histogram, plot_tree,
    plotting_available, Axes, ImportancePlot, MetricPlot, ShowInfo, SplitHistogramPlot, TreeDigraph, TreePlot,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Bar chart of feature importance
    Importance {
        #[command(flatten)]
        common: Common,

        /// split or gain
        #[arg(long, default_value = "split")]
        importance_type: ImportanceType,

        /// Show only the most important features
        #[arg(long)]
        max_num_features: Option<usize>,

        /// Keep features with zero importance
        #[arg(long)]
        keep_zero: bool,

        /// Decimals shown for gain values
        #[arg(long)]
        precision: Option<usize>,
    },
    /// Histogram of the split thresholds of one feature
    SplitHist {
        #[command(flatten)]
        common: Common,

        /// Feature index or name
        #[arg(long)]
        feature: String,

        /// Number of equal-width bins (default: one per unique value)
        #[arg(long)]
        bins: Option<usize>,
    },
    /// Metric values recorded during training
    Metric {
        #[command(flatten)]
        common: Common,

        /// JSON evaluation record: {"dataset": {"metric": [values...]}}
        #[arg(long)]
        evals: PathBuf,

        #[arg(long)]
        metric: Option<String>,

        /// Dataset to plot, repeatable (default: all)
        #[arg(long = "dataset")]
        datasets: Vec<String>,
    },
    /// DOT source of one tree
    Digraph {
        #[command(flatten)]
        common: Common,

        #[command(flatten)]
        tree: TreeArgs,
    },
    /// One tree rasterized by Graphviz, as PNG
    Tree {
        #[command(flatten)]
        common: Common,

        #[command(flatten)]
        tree: TreeArgs,
    },
}

#[derive(Args, Debug)]
struct Common {
    /// LightGBM text model or JSON model dump
    #[arg(short, long)]
    model: PathBuf,

    /// Output file (DOT source goes to stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Figure width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Figure height in pixels
    #[arg(long)]
    height: Option<u32>,
}

impl Common {
    fn figsize(&self) -> Option<(u32, u32)> {
        match (self.width, self.height) {
            (None, None) => None,
            (w, h) => Some((w.unwrap_or(640), h.unwrap_or(480))),
        }
    }

    fn load(&self) -> Result<Booster> {
        Booster::from_file(&self.model)
            .with_context(|| format!("Failed to load model: {}", self.model.display()))
    }

    fn output_or(&self, default: &str) -> PathBuf {
        self.output.clone().unwrap_or_else(|| PathBuf::from(default))
    }
}

#[derive(Args, Debug)]
struct TreeArgs {
    #[arg(long, default_value_t = 0)]
    tree_index: usize,

    /// split_gain, internal_value, internal_count or leaf_count; repeatable
    #[arg(long)]
    show_info: Vec<ShowInfo>,

    #[arg(long)]
    precision: Option<usize>,
}

fn save_chart(ax: &Axes, path: &Path) -> Result<()> {
    if !plotting_available() {
        anyhow::bail!("Chart export is not compiled in, rebuild with the `plotting` feature");
    }
    ax.save_svg(path)
        .with_context(|| format!("Failed to write chart: {}", path.display()))?;
    log::info!("wrote {}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Importance {
            common,
            importance_type,
            max_num_features,
            keep_zero,
            precision,
        } => {
            let booster = common.load()?;
            let opts = ImportancePlot::builder()
                .importance_type(importance_type)
                .maybe_max_num_features(max_num_features)
                .ignore_zero(!keep_zero)
                .maybe_precision(precision)
                .maybe_figsize(common.figsize())
                .build()?;
            let ax = plot_importance(&booster, &opts)?;
            save_chart(&ax, &common.output_or("importance.svg"))?;
        }
        Command::SplitHist {
            common,
            feature,
            bins,
        } => {
            let booster = common.load()?;
            let opts = SplitHistogramPlot::builder()
                .bins(bins.map(Bins::Count).unwrap_or_default())
                .maybe_figsize(common.figsize())
                .build()?;
            let ax = plot_split_value_histogram(&booster, &FeatureRef::parse(&feature), &opts)?;
            save_chart(&ax, &common.output_or("split_hist.svg"))?;
        }
        Command::Metric {
            common,
            evals,
            metric,
            datasets,
        } => {
            let json = fs::read_to_string(&evals)
                .with_context(|| format!("Failed to read eval record: {}", evals.display()))?;
            let record = EvalResults::from_json(&json).context("Failed to parse eval record")?;
            let booster = common.load()?.with_eval_results(record);
            let opts = MetricPlot::builder()
                .maybe_metric(metric)
                .maybe_dataset_names((!datasets.is_empty()).then_some(datasets))
                .maybe_figsize(common.figsize())
                .build()?;
            let ax = plot_metric(&booster, &opts)?;
            save_chart(&ax, &common.output_or("metric.svg"))?;
        }
        Command::Digraph { common, tree } => {
            let booster = common.load()?;
            let opts = TreeDigraph::builder()
                .tree_index(tree.tree_index)
                .show_info(tree.show_info)
                .maybe_precision(tree.precision)
                .build();
            let graph = create_tree_digraph(&booster, &opts, Default::default())?;
            match &common.output {
                Some(path) => {
                    fs::write(path, graph.to_dot())
                        .with_context(|| format!("Failed to write graph: {}", path.display()))?;
                    log::info!("wrote {}", path.display());
                }
                None => print!("{}", graph),
            }
        }
        Command::Tree { common, tree } => {
            let booster = common.load()?;
            let opts = TreePlot::builder()
                .tree_index(tree.tree_index)
                .show_info(tree.show_info)
                .maybe_precision(tree.precision)
                .maybe_figsize(common.figsize())
                .build()?;
            let ax = plot_tree(&booster, &opts, Default::default())?;
            let path = common.output_or("tree.png");
            ax.save_png(&path)
                .with_context(|| format!("Failed to write image: {}", path.display()))?;
            log::info!("wrote {}", path.display());
        }
    }

    Ok(())
}
