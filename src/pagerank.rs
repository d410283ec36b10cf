//! Global PageRank: restart to the uniform distribution over all nodes.

use crate::model::TransitionModel;
use crate::solver::{iterate, IterationConfig, IterationRun};
use crate::{Error, Result};

/// Uniform query vector `1/n`.
///
/// Fails with [`Error::Range`] when `n == 0`.
pub fn build_pagerank_query(n: usize) -> Result<Vec<f64>> {
    if n == 0 {
        return Err(Error::Range("graph has no nodes".to_string()));
    }
    Ok(vec![1.0 / n as f64; n])
}

pub fn pagerank(model: &TransitionModel, config: &IterationConfig) -> Result<Vec<f64>> {
    Ok(pagerank_run(model, config)?.scores)
}

/// PageRank with convergence reporting.
///
/// `iterations` is the number of update steps performed and `residuals` their residuals.
pub fn pagerank_run(model: &TransitionModel, config: &IterationConfig) -> Result<IterationRun> {
    let q = build_pagerank_query(model.node_count())?;
    iterate(model.transition_transpose(), &q, config)
}
