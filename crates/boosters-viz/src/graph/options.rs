//! Graph construction options and their deprecated aliases.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

/// Attributes applied to the whole graph, or to every node/edge.
pub type Attrs = BTreeMap<String, String>;

/// Options accepted by the [`Digraph`](super::Digraph) constructor.
///
/// Every field is optional; unset fields fall back to Graphviz defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphOptions {
    pub name: Option<String>,
    pub comment: Option<String>,
    /// File stem used when the graph is written with [`Digraph::render`](super::Digraph::render).
    pub filename: Option<String>,
    pub directory: Option<String>,
    /// Output format for [`Digraph::render`](super::Digraph::render), e.g. `png`, `svg`.
    pub format: Option<String>,
    /// Layout engine executable, `dot` by default.
    pub engine: Option<String>,
    pub encoding: Option<String>,
    pub graph_attr: Option<Attrs>,
    pub node_attr: Option<Attrs>,
    pub edge_attr: Option<Attrs>,
    /// Raw DOT statements inserted before the nodes.
    pub body: Option<Vec<String>>,
    pub strict: Option<bool>,
}

impl GraphOptions {
    pub fn engine(&self) -> &str {
        self.engine.as_deref().unwrap_or("dot")
    }

    pub fn format(&self) -> &str {
        self.format.as_deref().unwrap_or("pdf")
    }
}

/// Deprecated, individually named graph parameters.
///
/// Kept so callers of the older API keep working. Each alias that is set logs
/// a deprecation warning once per process and is folded into
/// [`GraphOptions`] unless the option is already set there.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LegacyGraphArgs {
    pub old_name: Option<String>,
    pub old_comment: Option<String>,
    pub old_filename: Option<String>,
    pub old_directory: Option<String>,
    pub old_format: Option<String>,
    pub old_engine: Option<String>,
    pub old_encoding: Option<String>,
    pub old_graph_attr: Option<Attrs>,
    pub old_node_attr: Option<Attrs>,
    pub old_edge_attr: Option<Attrs>,
    pub old_body: Option<Vec<String>>,
    pub old_strict: bool,
}

/// Deprecated attribute parameters of the raster tree plot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LegacyAttrArgs {
    pub old_graph_attr: Option<Attrs>,
    pub old_node_attr: Option<Attrs>,
    pub old_edge_attr: Option<Attrs>,
}

impl From<LegacyAttrArgs> for LegacyGraphArgs {
    fn from(args: LegacyAttrArgs) -> Self {
        LegacyGraphArgs {
            old_graph_attr: args.old_graph_attr,
            old_node_attr: args.old_node_attr,
            old_edge_attr: args.old_edge_attr,
            ..Default::default()
        }
    }
}

/// Deprecated parameters already warned about.
struct Warned(Mutex<BTreeSet<&'static str>>);

impl Warned {
    const fn new() -> Self {
        Self(Mutex::new(BTreeSet::new()))
    }

    /// True the first time `param` is seen.
    fn first_use(&self, param: &'static str) -> bool {
        match self.0.lock() {
            Ok(mut warned) => warned.insert(param),
            Err(poisoned) => poisoned.into_inner().insert(param),
        }
    }
}

static WARNED: Warned = Warned::new();

fn warn_deprecated(param: &'static str) {
    if WARNED.first_use(param) {
        log::warn!(
            "{} parameter is deprecated and will be removed in a future version. \
             Please use GraphOptions to pass {} parameter.",
            param,
            &param[4..]
        );
    }
}

fn fold<T>(param: &'static str, old: Option<T>, target: &mut Option<T>) {
    if let Some(value) = old {
        warn_deprecated(param);
        if target.is_none() {
            *target = Some(value);
        }
    }
}

impl LegacyGraphArgs {
    /// True if no alias is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Fold every set alias into `options`.
    pub fn fold_into(self, options: &mut GraphOptions) {
        fold("old_name", self.old_name, &mut options.name);
        fold("old_comment", self.old_comment, &mut options.comment);
        fold("old_filename", self.old_filename, &mut options.filename);
        fold("old_directory", self.old_directory, &mut options.directory);
        fold("old_format", self.old_format, &mut options.format);
        fold("old_engine", self.old_engine, &mut options.engine);
        fold("old_encoding", self.old_encoding, &mut options.encoding);
        fold("old_graph_attr", self.old_graph_attr, &mut options.graph_attr);
        fold("old_node_attr", self.old_node_attr, &mut options.node_attr);
        fold("old_edge_attr", self.old_edge_attr, &mut options.edge_attr);
        fold("old_body", self.old_body, &mut options.body);
        fold("old_strict", self.old_strict.then_some(true), &mut options.strict);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_fill_unset_options() {
        let mut options = GraphOptions {
            name: Some("kept".to_string()),
            ..Default::default()
        };
        LegacyGraphArgs {
            old_name: Some("ignored".to_string()),
            old_comment: Some("tree 0".to_string()),
            old_strict: true,
            ..Default::default()
        }
        .fold_into(&mut options);

        assert_eq!(options.name.as_deref(), Some("kept"));
        assert_eq!(options.comment.as_deref(), Some("tree 0"));
        assert_eq!(options.strict, Some(true));
    }

    #[test]
    fn attr_aliases_convert() {
        let attrs: Attrs = [("rankdir".to_string(), "LR".to_string())].into();
        let legacy: LegacyGraphArgs = LegacyAttrArgs {
            old_graph_attr: Some(attrs.clone()),
            ..Default::default()
        }
        .into();
        assert!(!legacy.is_empty());

        let mut options = GraphOptions::default();
        legacy.fold_into(&mut options);
        assert_eq!(options.graph_attr, Some(attrs));
        assert!(options.node_attr.is_none());
    }

    #[test]
    fn each_parameter_warns_once() {
        let warned = Warned::new();
        assert!(warned.first_use("old_name"));
        assert!(!warned.first_use("old_name"));
        assert!(warned.first_use("old_body"));
        assert!(!warned.first_use("old_body"));
        assert!(!warned.first_use("old_name"));
    }

    #[test]
    fn defaults() {
        let options = GraphOptions::default();
        assert_eq!(options.engine(), "dot");
        assert_eq!(options.format(), "pdf");
        assert!(LegacyGraphArgs::default().is_empty());
    }
}
