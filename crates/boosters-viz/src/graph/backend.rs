//! Graphviz executables as the graph rendering backend.
//!
//! Availability is probed once per process by running `dot -V`. The
//! executables are looked up on `PATH`, or in the directory named by
//! [`GRAPHVIZ_BIN_ENV`] when it is set.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::OnceLock;

use crate::error::{PlotError, Result};

/// Environment variable naming the directory that holds the Graphviz
/// executables.
pub const GRAPHVIZ_BIN_ENV: &str = "BOOSTERS_VIZ_GRAPHVIZ_BIN";

/// Layout engines Graphviz ships.
pub const ENGINES: &[&str] = &[
    "dot", "neato", "twopi", "circo", "fdp", "sfdp", "patchwork", "osage",
];

fn engine_path(engine: &str) -> PathBuf {
    match std::env::var_os(GRAPHVIZ_BIN_ENV) {
        Some(dir) => PathBuf::from(dir).join(engine),
        None => PathBuf::from(engine),
    }
}

/// Whether the Graphviz executables can be run.
pub fn graphviz_available() -> bool {
    static AVAILABLE: OnceLock<bool> = OnceLock::new();
    *AVAILABLE.get_or_init(|| {
        let ok = Command::new(engine_path("dot"))
            .arg("-V")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false);
        log::debug!("graphviz available: {}", ok);
        ok
    })
}

/// Fail with [`PlotError::BackendUnavailable`] unless Graphviz can be run.
pub fn require_graphviz(purpose: &'static str) -> Result<()> {
    if graphviz_available() {
        Ok(())
    } else {
        Err(PlotError::BackendUnavailable {
            backend: "graphviz",
            purpose,
        })
    }
}

pub(crate) fn validate_engine(engine: &str) -> Result<()> {
    if ENGINES.contains(&engine) {
        Ok(())
    } else {
        Err(PlotError::InvalidParameter {
            name: "engine",
            reason: format!("unknown layout engine {:?}, expected one of {:?}", engine, ENGINES),
        })
    }
}

pub(crate) fn validate_format(format: &str) -> Result<()> {
    let ok = !format.is_empty()
        && format
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, ':' | '_' | '.'));
    if ok {
        Ok(())
    } else {
        Err(PlotError::InvalidParameter {
            name: "format",
            reason: format!("invalid output format {:?}", format),
        })
    }
}

/// Run `engine -T<format>` over `source` and return the encoded output.
pub fn pipe(engine: &str, format: &str, source: &str) -> Result<Vec<u8>> {
    validate_engine(engine)?;
    validate_format(format)?;
    require_graphviz("render graphs")?;

    log::debug!("piping {} bytes of DOT through {} -T{}", source.len(), engine, format);
    let mut child = Command::new(engine_path(engine))
        .arg(format!("-T{}", format))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    // Graphviz reads the whole graph before writing anything. It stops
    // reading early on a syntax error; its exit status and stderr tell why.
    if let Some(mut stdin) = child.stdin.take() {
        match stdin.write_all(source.as_bytes()) {
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                log::debug!("{} closed its input early", engine);
            }
            other => other?,
        }
    }
    let output = child.wait_with_output()?;

    if !output.status.success() {
        return Err(PlotError::Graphviz {
            engine: engine.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output.stdout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_names_are_restricted() {
        assert!(validate_engine("dot").is_ok());
        assert!(validate_engine("neato").is_ok());
        assert!(matches!(
            validate_engine("rm"),
            Err(PlotError::InvalidParameter { name: "engine", .. })
        ));
    }

    #[test]
    fn invalid_source_reports_graphviz_error() {
        let mut source = String::from("digraph {\n\t-> ;\n");
        source.push_str(&"\ta -> b\n".repeat(200_000));
        source.push_str("}\n");

        let result = pipe("dot", "svg", &source);
        if graphviz_available() {
            assert!(
                matches!(result, Err(PlotError::Graphviz { ref engine, .. }) if engine == "dot"),
                "unexpected result: {:?}",
                result.map(|b| b.len())
            );
        } else {
            assert!(matches!(
                result,
                Err(PlotError::BackendUnavailable { backend: "graphviz", .. })
            ));
        }
    }

    #[test]
    fn format_names_are_restricted() {
        assert!(validate_format("png").is_ok());
        assert!(validate_format("svg:cairo").is_ok());
        assert!(validate_format("").is_err());
        assert!(validate_format("png; ls").is_err());
    }
}
