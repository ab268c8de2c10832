//! Directed graph object with DOT output.
//!
//! [`Digraph`] collects named nodes and labeled edges, writes them as DOT
//! source, and hands the source to Graphviz for layout when an encoded
//! image is requested.
//!
//! # Example
//!
//! ```
//! use boosters_viz::graph::{Digraph, GraphOptions};
//!
//! let mut graph = Digraph::new(GraphOptions::default());
//! graph.node("split0", "split_feature_index: 0");
//! graph.node("leaf0", "leaf_index: 0");
//! graph.edge("split0", "leaf0", Some("<="));
//! assert!(graph.to_dot().contains(r#"split0 -> leaf0 [label="<="]"#));
//! ```

mod backend;
mod options;

use std::fmt::{self, Write as _};
use std::path::PathBuf;

pub use backend::{graphviz_available, require_graphviz, ENGINES, GRAPHVIZ_BIN_ENV};
pub use options::{Attrs, GraphOptions, LegacyAttrArgs, LegacyGraphArgs};

use crate::error::{PlotError, Result};

/// A named node with its label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub name: String,
    pub label: String,
}

/// A directed edge `tail -> head`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub tail: String,
    pub head: String,
    pub label: Option<String>,
}

/// Directed graph built node by node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Digraph {
    options: GraphOptions,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl Digraph {
    pub fn new(options: GraphOptions) -> Self {
        Self {
            options,
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn options(&self) -> &GraphOptions {
        &self.options
    }

    pub fn node(&mut self, name: impl Into<String>, label: impl Into<String>) {
        self.nodes.push(Node {
            name: name.into(),
            label: label.into(),
        });
    }

    pub fn edge(&mut self, tail: impl Into<String>, head: impl Into<String>, label: Option<&str>) {
        self.edges.push(Edge {
            tail: tail.into(),
            head: head.into(),
            label: label.map(str::to_string),
        });
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn find_node(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// Drop nodes and edges added after the graph had `nodes` nodes and
    /// `edges` edges.
    pub(crate) fn truncate(&mut self, nodes: usize, edges: usize) {
        self.nodes.truncate(nodes);
        self.edges.truncate(edges);
    }

    /// DOT source of the graph.
    pub fn to_dot(&self) -> String {
        let opts = &self.options;
        let mut out = String::new();

        if let Some(comment) = &opts.comment {
            for line in comment.lines() {
                let _ = writeln!(out, "// {}", line);
            }
        }
        if opts.strict == Some(true) {
            out.push_str("strict ");
        }
        out.push_str("digraph ");
        if let Some(name) = &opts.name {
            out.push_str(&quote_id(name));
            out.push(' ');
        }
        out.push_str("{\n");

        for (kind, attrs) in [
            ("graph", &opts.graph_attr),
            ("node", &opts.node_attr),
            ("edge", &opts.edge_attr),
        ] {
            if let Some(attrs) = attrs.as_ref().filter(|a| !a.is_empty()) {
                let _ = writeln!(out, "\t{} [{}]", kind, format_attrs(attrs.iter()));
            }
        }
        for stmt in opts.body.iter().flatten() {
            let _ = writeln!(out, "\t{}", stmt);
        }
        for node in &self.nodes {
            let _ = writeln!(
                out,
                "\t{} [label={}]",
                quote_id(&node.name),
                quote_id(&node.label)
            );
        }
        for edge in &self.edges {
            let _ = write!(out, "\t{} -> {}", quote_id(&edge.tail), quote_id(&edge.head));
            if let Some(label) = &edge.label {
                let _ = write!(out, " [label={}]", quote_id(label));
            }
            out.push('\n');
        }
        out.push_str("}\n");
        out
    }

    /// Lay out the graph with its engine and return the `format` encoding.
    pub fn pipe(&self, format: &str) -> Result<Vec<u8>> {
        self.check_encoding()?;
        backend::pipe(self.options.engine(), format, &self.to_dot())
    }

    /// Write the DOT source to `<directory>/<filename>` and the rendered
    /// output next to it with the format as extra extension. Returns the
    /// rendered file's path.
    pub fn render(&self) -> Result<PathBuf> {
        let opts = &self.options;
        let stem = opts
            .filename
            .clone()
            .or_else(|| opts.name.as_ref().map(|n| format!("{}.gv", n)))
            .unwrap_or_else(|| "Digraph.gv".to_string());
        let dir = PathBuf::from(opts.directory.as_deref().unwrap_or("."));
        let source_path = dir.join(&stem);
        let format = opts.format();

        let bytes = self.pipe(format)?;
        std::fs::create_dir_all(&dir)?;
        std::fs::write(&source_path, self.to_dot())?;
        let out_path = dir.join(format!("{}.{}", stem, format));
        std::fs::write(&out_path, bytes)?;
        Ok(out_path)
    }

    fn check_encoding(&self) -> Result<()> {
        match self.options.encoding.as_deref() {
            None => Ok(()),
            Some(enc) if enc.eq_ignore_ascii_case("utf-8") || enc.eq_ignore_ascii_case("utf8") => {
                Ok(())
            }
            Some(enc) => Err(PlotError::InvalidParameter {
                name: "encoding",
                reason: format!("only UTF-8 output is supported, got {:?}", enc),
            }),
        }
    }
}

impl fmt::Display for Digraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_dot())
    }
}

fn format_attrs<'a>(attrs: impl Iterator<Item = (&'a String, &'a String)>) -> String {
    attrs
        .map(|(k, v)| format!("{}={}", quote_id(k), quote_id(v)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Quote a DOT identifier unless it is a plain ID.
///
/// Backslashes pass through so label escapes such as `\n` keep their
/// Graphviz meaning. A dangling backslash before a quote or at the end is
/// doubled so it cannot escape the quote that follows.
fn quote_id(id: &str) -> String {
    let plain = id
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !is_keyword(id);
    if plain {
        return id.to_string();
    }

    let mut out = String::with_capacity(id.len() + 2);
    out.push('"');
    let mut backslashes = 0;
    for c in id.chars() {
        if c == '"' {
            if backslashes % 2 == 1 {
                out.push('\\');
            }
            out.push('\\');
        }
        out.push(c);
        backslashes = if c == '\\' { backslashes + 1 } else { 0 };
    }
    if backslashes % 2 == 1 {
        out.push('\\');
    }
    out.push('"');
    out
}

fn is_keyword(id: &str) -> bool {
    ["node", "edge", "graph", "digraph", "subgraph", "strict"]
        .iter()
        .any(|k| k.eq_ignore_ascii_case(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_output_layout() {
        let mut graph = Digraph::new(GraphOptions {
            name: Some("tree".to_string()),
            comment: Some("tree 0".to_string()),
            graph_attr: Some([("rankdir".to_string(), "LR".to_string())].into()),
            body: Some(vec!["labelloc=t".to_string()]),
            ..Default::default()
        });
        graph.node("split0", r"split_feature_index: 0\nthreshold: 1.5");
        graph.node("leaf0", "leaf");
        graph.edge("split0", "leaf0", Some("<="));
        graph.edge("split0", "leaf0", None);

        let expected = "// tree 0\n\
                        digraph tree {\n\
                        \tgraph [rankdir=LR]\n\
                        \tlabelloc=t\n\
                        \tsplit0 [label=\"split_feature_index: 0\\nthreshold: 1.5\"]\n\
                        \tleaf0 [label=leaf]\n\
                        \tsplit0 -> leaf0 [label=\"<=\"]\n\
                        \tsplit0 -> leaf0\n\
                        }\n";
        assert_eq!(graph.to_dot(), expected);
    }

    #[test]
    fn strict_and_quoting() {
        let mut graph = Digraph::new(GraphOptions {
            strict: Some(true),
            ..Default::default()
        });
        graph.node("node", "say \"hi\"");
        graph.edge("node", "1abc", Some("isn't"));
        let dot = graph.to_dot();
        assert!(dot.starts_with("strict digraph {\n"));
        assert!(dot.contains("\t\"node\" [label=\"say \\\"hi\\\"\"]\n"));
        assert!(dot.contains("\t\"node\" -> \"1abc\" [label=\"isn't\"]\n"));
    }

    #[test]
    fn trailing_backslash_cannot_escape_the_closing_quote() {
        assert_eq!(quote_id(r"C:\dir\"), r#""C:\dir\\""#);
        assert_eq!(quote_id(r#"a\"b"#), r#""a\\\"b""#);
        assert_eq!(quote_id(r"a\nb"), r#""a\nb""#);
        assert_eq!(quote_id(r"a\\"), r#""a\\""#);

        let graph = Digraph::new(GraphOptions {
            name: Some(r"out\".to_string()),
            ..Default::default()
        });
        assert!(graph.to_dot().starts_with("digraph \"out\\\\\" {\n"));
    }

    fn render_options(dir: &std::path::Path, format: &str) -> GraphOptions {
        GraphOptions {
            filename: Some("tree.gv".to_string()),
            directory: Some(dir.to_string_lossy().into_owned()),
            format: Some(format.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn render_rejects_bad_format_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let graph = Digraph::new(render_options(dir.path(), "png; ls"));
        assert!(matches!(
            graph.render(),
            Err(PlotError::InvalidParameter { name: "format", .. })
        ));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn render_writes_source_and_output() {
        let dir = tempfile::tempdir().unwrap();
        let mut graph = Digraph::new(render_options(dir.path(), "svg"));
        graph.node("split0", "x");
        graph.node("leaf0", "y");
        graph.edge("split0", "leaf0", Some("<="));

        match graph.render() {
            Ok(path) => {
                assert_eq!(path, dir.path().join("tree.gv.svg"));
                assert!(path.exists());
                let source = std::fs::read_to_string(dir.path().join("tree.gv")).unwrap();
                assert_eq!(source, graph.to_dot());
            }
            Err(e) => {
                assert!(!graphviz_available());
                assert!(matches!(e, PlotError::BackendUnavailable { backend: "graphviz", .. }));
                assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
            }
        }
    }

    #[test]
    fn non_utf8_encoding_is_rejected_before_rendering() {
        let graph = Digraph::new(GraphOptions {
            encoding: Some("latin1".to_string()),
            ..Default::default()
        });
        assert!(matches!(
            graph.pipe("png"),
            Err(PlotError::InvalidParameter { name: "encoding", .. })
        ));
    }
}
