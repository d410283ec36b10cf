//! Edge-list ingestion.
//!
//! Input is whitespace-separated text with one edge per row: `src dst [weight]`.
//! Lines starting with `#` (and anything after a `#`) are ignored, as are blank lines.
//!
//! Ids are shifted down by the smallest id observed (the *base*) so that internal indices
//! start at 0; the base is returned so callers can report original ids.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::debug;

use crate::graph::{CsrMatrix, GraphType};
use crate::{Error, Result};

/// Parsed, validated and rebased edges, before any matrix is built.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeList {
    /// `(src, dst, weight)` with ids already rebased.
    pub edges: Vec<(usize, usize, f64)>,
    /// Smallest id in the input.
    pub base: usize,
    /// `max rebased id + 1`.
    pub node_count: usize,
    /// `false` when the input had two columns (unit weights were synthesized).
    pub weighted: bool,
}

/// Result of reading a graph: the adjacency matrix plus the metadata needed to
/// interpret it.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedGraph {
    pub adjacency: CsrMatrix,
    pub base: usize,
    pub graph_type: GraphType,
    pub weighted: bool,
}

impl LoadedGraph {
    pub fn node_count(&self) -> usize {
        self.adjacency.rows()
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(at) => &line[..at],
        None => line,
    }
}

fn parse_number(field: &str, line_no: usize) -> Result<f64> {
    let x: f64 = field.parse().map_err(|_| {
        Error::Format(format!("line {line_no}: {field:?} is not a number"))
    })?;
    if !x.is_finite() {
        return Err(Error::Format(format!(
            "line {line_no}: {field:?} is not finite"
        )));
    }
    Ok(x)
}

/// Truncate a non-negative id to an index; ids that do not fit a `usize` are a range error.
fn to_index(id: f64) -> Result<usize> {
    // `usize::MAX as f64` rounds up to 2^64.
    if id < usize::MAX as f64 {
        Ok(id as usize)
    } else {
        Err(Error::Range(format!("node id {id} is too large")))
    }
}

impl EdgeList {
    /// Parse and validate an edge list.
    ///
    /// Fails with [`Error::Format`] on rows that are not 2 or 3 numeric columns (or whose width
    /// differs from the first row), and with [`Error::Range`] on a negative base or a negative
    /// weight.
    pub fn parse<R: BufRead>(reader: R) -> Result<Self> {
        let mut raw: Vec<(f64, f64, f64)> = Vec::new();
        let mut width: Option<usize> = None;

        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = i + 1;
            let fields: Vec<&str> = strip_comment(&line).split_whitespace().collect();
            if fields.is_empty() {
                continue;
            }
            if !(2..=3).contains(&fields.len()) {
                return Err(Error::Format(format!(
                    "line {line_no}: expected 2 or 3 columns, found {}",
                    fields.len()
                )));
            }
            match width {
                None => width = Some(fields.len()),
                Some(w) if w != fields.len() => {
                    return Err(Error::Format(format!(
                        "line {line_no}: expected {w} columns like the first row, found {}",
                        fields.len()
                    )));
                }
                Some(_) => {}
            }
            let src = parse_number(fields[0], line_no)?;
            let dst = parse_number(fields[1], line_no)?;
            let w = match fields.get(2) {
                Some(f) => parse_number(f, line_no)?,
                None => 1.0,
            };
            raw.push((src, dst, w));
        }

        if raw.is_empty() {
            return Err(Error::Format("edge list has no rows".to_string()));
        }

        let base = raw
            .iter()
            .flat_map(|&(s, d, _)| [s, d])
            .fold(f64::INFINITY, f64::min);
        if base < 0.0 {
            return Err(Error::Range(format!(
                "node ids must be non-negative (negative base {base})"
            )));
        }
        if let Some(&(s, d, w)) = raw.iter().find(|&&(_, _, w)| w < 0.0) {
            return Err(Error::Range(format!(
                "negative edge weight {w} on edge {s} -> {d}"
            )));
        }

        let base_id = to_index(base)?;
        let edges: Vec<(usize, usize, f64)> = raw
            .into_iter()
            .map(|(s, d, w)| Ok::<_, Error>((to_index(s - base)?, to_index(d - base)?, w)))
            .collect::<Result<_>>()?;
        let node_count = edges
            .iter()
            .map(|&(s, d, _)| s.max(d))
            .max()
            .unwrap_or(0)
            .checked_add(1)
            .filter(|&n| base_id.checked_add(n).is_some())
            .ok_or_else(|| Error::Range("node ids exceed the addressable range".to_string()))?;

        Ok(Self {
            edges,
            base: base_id,
            node_count,
            weighted: width == Some(3),
        })
    }

    /// Build the adjacency matrix for `graph_type`.
    ///
    /// - directed: `A[src][dst]` accumulates weights (or collapses to 1 when unweighted).
    /// - undirected: each edge is first oriented so `src <= dst`, merged, then mirrored.
    ///   Mirroring adds the transpose off the diagonal only (`A + A^T - diag(A)`), so a
    ///   self-loop keeps its weight rather than doubling.
    /// - bipartite: [`Error::Unimplemented`].
    pub fn into_adjacency(self, graph_type: GraphType) -> Result<LoadedGraph> {
        let n = self.node_count;
        let adjacency = match graph_type {
            GraphType::Directed => CsrMatrix::from_triplets(n, n, self.edges, self.weighted)?,
            GraphType::Undirected => {
                let oriented = self
                    .edges
                    .into_iter()
                    .map(|(s, d, w)| if s <= d { (s, d, w) } else { (d, s, w) });
                CsrMatrix::from_triplets(n, n, oriented, self.weighted)?
                    .symmetrize(self.weighted)?
            }
            GraphType::Bipartite => {
                return Err(Error::Unimplemented("bipartite graphs are not supported"));
            }
        };
        Ok(LoadedGraph {
            adjacency,
            base: self.base,
            graph_type,
            weighted: self.weighted,
        })
    }
}

/// Parse an edge list from any buffered reader and build its adjacency matrix.
pub fn parse_edge_list<R: BufRead>(reader: R, graph_type: GraphType) -> Result<LoadedGraph> {
    if graph_type == GraphType::Bipartite {
        return Err(Error::Unimplemented("bipartite graphs are not supported"));
    }
    let edges = EdgeList::parse(reader)?;
    let rows = edges.edges.len();
    let graph = edges.into_adjacency(graph_type)?;
    debug!(
        rows,
        n = graph.node_count(),
        nnz = graph.adjacency.nnz(),
        base = graph.base,
        weighted = graph.weighted,
        %graph_type,
        "parsed edge list"
    );
    Ok(graph)
}

/// Read the edge list at `path`. See [`parse_edge_list`].
pub fn read_graph(path: impl AsRef<Path>, graph_type: GraphType) -> Result<LoadedGraph> {
    let file = File::open(path.as_ref())?;
    parse_edge_list(BufReader::new(file), graph_type)
}

/// Read seed ids, one non-negative integer per line.
pub fn read_seeds(path: impl AsRef<Path>) -> Result<Vec<usize>> {
    let file = File::open(path.as_ref())?;
    let mut seeds = Vec::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        let field = strip_comment(&line).trim();
        if field.is_empty() {
            continue;
        }
        let seed = field.parse::<usize>().map_err(|_| {
            Error::Format(format!("line {}: {field:?} is not a seed id", i + 1))
        })?;
        seeds.push(seed);
    }
    Ok(seeds)
}
