//! Line-based graph file loader.
//!
//! ```text
//! # comment
//! node <id> <x> <y>
//! edge <id0> <id1>          symmetric, Euclidean cost
//! arc  <id0> <id1> <cost>   one-way, explicit cost
//! ```
//!
//! Lines that do not parse, including non-finite coordinates or costs, are
//! skipped and counted.  Edges that name an
//! unregistered node are configuration errors and abort the load.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{info, warn};
use waynav_types::{NavError, NodeId};

use crate::astar::AStar;

/// A graph built from a file, plus how many lines were ignored.
#[derive(Debug, Clone)]
pub struct GraphLoad {
    pub graph: AStar,
    pub skipped: usize,
}

enum Line {
    Node(NodeId, f64, f64),
    Edge(NodeId, NodeId),
    Arc(NodeId, NodeId, f64),
}

/// `inf` and `NaN` parse as `f64` but are never valid coordinates or costs.
fn finite(token: &str) -> Option<f64> {
    token.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_line(line: &str) -> Option<Line> {
    let mut tokens = line.split_whitespace();
    let kind = tokens.next()?;
    let parsed = match kind {
        "node" => Line::Node(
            tokens.next()?.parse().ok()?,
            finite(tokens.next()?)?,
            finite(tokens.next()?)?,
        ),
        "edge" => Line::Edge(tokens.next()?.parse().ok()?, tokens.next()?.parse().ok()?),
        "arc" => Line::Arc(
            tokens.next()?.parse().ok()?,
            tokens.next()?.parse().ok()?,
            finite(tokens.next()?)?,
        ),
        _ => return None,
    };
    // Trailing garbage makes the whole line malformed.
    tokens.next().is_none().then_some(parsed)
}

/// Build a graph from any buffered reader.
pub fn parse_graph<R: BufRead>(reader: R) -> Result<GraphLoad, NavError> {
    let mut graph = AStar::new();
    let mut skipped = 0;

    for (number, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| NavError::GraphFile(e.to_string()))?;
        let content = line.split('#').next().unwrap_or_default().trim();
        if content.is_empty() {
            continue;
        }
        match parse_line(content) {
            Some(Line::Node(id, x, y)) => graph.add_node(id, x, y),
            Some(Line::Edge(a, b)) => graph.add_edge(a, b)?,
            Some(Line::Arc(a, b, cost)) => graph.add_directed_edge(a, b, cost)?,
            None => {
                warn!(line = number + 1, content, "skipping malformed graph line");
                skipped += 1;
            }
        }
    }

    info!(nodes = graph.len(), skipped, "graph loaded");
    Ok(GraphLoad { graph, skipped })
}

/// Build a graph from the file at `path`.
pub fn load_graph(path: impl AsRef<Path>) -> Result<GraphLoad, NavError> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| NavError::GraphFile(format!("{}: {e}", path.display())))?;
    parse_graph(BufReader::new(file))
}
