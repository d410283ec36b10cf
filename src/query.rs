//! Entry point for callers that hold a file path and a query description rather than a
//! prepared [`TransitionModel`].

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::debug;

use crate::graph::GraphType;
use crate::model::TransitionModel;
use crate::output::top_k;
use crate::pagerank::pagerank_run;
use crate::ppr::ppr_run;
use crate::reader::read_graph;
use crate::solver::{IterationConfig, IterationRun};
use crate::walk::rwr_run;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum QueryType {
    Rwr,
    Ppr,
    PageRank,
}

impl FromStr for QueryType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rwr" => Ok(Self::Rwr),
            "ppr" => Ok(Self::Ppr),
            "pagerank" => Ok(Self::PageRank),
            other => Err(Error::Config(format!(
                "query type should be rwr, ppr, or pagerank (got {other:?})"
            ))),
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Rwr => "rwr",
            Self::Ppr => "ppr",
            Self::PageRank => "pagerank",
        })
    }
}

/// A query with its seeds (original ids).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Query {
    Rwr { seed: usize },
    Ppr { seeds: Vec<usize> },
    PageRank,
}

impl Query {
    /// Pair a query type with caller-supplied seeds.
    ///
    /// RWR takes exactly one seed and PageRank none; anything else is [`Error::Config`].
    /// PPR seeds are checked later, against the graph.
    pub fn new(query_type: QueryType, seeds: &[usize]) -> Result<Self> {
        match (query_type, seeds) {
            (QueryType::Rwr, &[seed]) => Ok(Self::Rwr { seed }),
            (QueryType::Rwr, _) => Err(Error::Config(format!(
                "rwr takes a single seed (got {})",
                seeds.len()
            ))),
            (QueryType::Ppr, _) => Ok(Self::Ppr {
                seeds: seeds.to_vec(),
            }),
            (QueryType::PageRank, &[]) => Ok(Self::PageRank),
            (QueryType::PageRank, _) => {
                Err(Error::Config("pagerank takes no seeds".to_string()))
            }
        }
    }

    pub fn query_type(&self) -> QueryType {
        match self {
            Self::Rwr { .. } => QueryType::Rwr,
            Self::Ppr { .. } => QueryType::Ppr,
            Self::PageRank => QueryType::PageRank,
        }
    }

    /// Run this query against `model`.
    pub fn run(&self, model: &TransitionModel, config: &IterationConfig) -> Result<IterationRun> {
        match self {
            Self::Rwr { seed } => rwr_run(model, *seed, config),
            Self::Ppr { seeds } => ppr_run(model, seeds, config),
            Self::PageRank => pagerank_run(model, config),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueryRequest {
    pub query: Query,
    pub graph_type: GraphType,
    pub input_path: PathBuf,
    pub config: IterationConfig,
}

/// Scores labelled with original node ids.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScoreVector {
    pub node_ids: Vec<usize>,
    pub scores: Vec<f64>,
    pub residuals: Vec<f64>,
    pub converged: bool,
}

impl ScoreVector {
    pub fn new(model: &TransitionModel, run: IterationRun) -> Self {
        Self {
            node_ids: model.node_ids(),
            scores: run.scores,
            residuals: run.residuals,
            converged: run.converged,
        }
    }

    /// The `k` highest-scoring `(node_id, score)` pairs.
    pub fn top_k(&self, k: usize) -> Vec<(usize, f64)> {
        top_k(&self.node_ids, &self.scores, k)
    }
}

/// Read the graph, build its transition model and answer `request.query`.
pub fn process_query(request: &QueryRequest) -> Result<ScoreVector> {
    let graph = read_graph(&request.input_path, request.graph_type)?;
    let model = TransitionModel::try_from(graph)?;
    let run = request.query.run(&model, &request.config)?;
    debug!(
        query = %request.query.query_type(),
        path = %request.input_path.display(),
        iterations = run.iterations,
        converged = run.converged,
        "query processed"
    );
    Ok(ScoreVector::new(&model, run))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_type_names() {
        for t in [QueryType::Rwr, QueryType::Ppr, QueryType::PageRank] {
            assert_eq!(t.to_string().parse::<QueryType>().unwrap(), t);
        }
        assert!(matches!(
            "hits".parse::<QueryType>().unwrap_err(),
            Error::Config(_)
        ));
    }

    #[test]
    fn seeds_must_fit_the_query_type() {
        assert_eq!(Query::new(QueryType::Rwr, &[4]).unwrap(), Query::Rwr { seed: 4 });
        assert!(matches!(
            Query::new(QueryType::Rwr, &[1, 2]).unwrap_err(),
            Error::Config(_)
        ));
        assert!(matches!(
            Query::new(QueryType::PageRank, &[1]).unwrap_err(),
            Error::Config(_)
        ));
        let q = Query::new(QueryType::Ppr, &[1, 2]).unwrap();
        assert_eq!(q.query_type(), QueryType::Ppr);
    }
}
