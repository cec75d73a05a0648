use std::io::Write;

use anyhow::{bail, Result};
use graphwalk_core::{traverse, FilterClause, Graph, PathResult, Pattern};
use tracing::{debug, warn};

use crate::command::NodeRef;
use crate::settings::{OutputFormat, Settings};

/// Run a TRAVERSE command and write the accepted paths to `out`.
///
/// A missing start node is reported on `out` and is not an error.
pub fn run(
    graph: &Graph,
    settings: &Settings,
    start: &NodeRef,
    pattern: &Pattern,
    filter: &FilterClause,
    out: &mut dyn Write,
) -> Result<()> {
    if pattern.len() > settings.max_hops {
        bail!(
            "pattern has {} hops, max_hops is {}",
            pattern.len(),
            settings.max_hops
        );
    }

    let Some(start_node) = graph.node(&start.node_type, start.id) else {
        writeln!(out, "Start node {} not found.", start)?;
        return Ok(());
    };

    let result = traverse(graph, start_node, pattern, filter, settings.path_limit())?;
    if result.truncated {
        warn!(
            max_paths = settings.max_paths,
            "traversal stopped at max_paths, results are incomplete"
        );
    }
    debug!(
        start = %start,
        hops = pattern.len(),
        paths = result.paths.len(),
        branches = result.branches_visited,
        "traverse"
    );

    write_results(&result.paths, settings.output, out)
}

pub fn write_results(paths: &[PathResult], format: OutputFormat, out: &mut dyn Write) -> Result<()> {
    match format {
        OutputFormat::Pretty => {
            writeln!(out, "Results:")?;
            for path in paths {
                writeln!(out, "{}", serde_json::to_string_pretty(path)?)?;
            }
        }
        OutputFormat::Compact => {
            for path in paths {
                writeln!(out, "{}", serde_json::to_string(path)?)?;
            }
        }
    }
    Ok(())
}
