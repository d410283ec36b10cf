//! Immutable transition model shared by all queries against one graph.

use tracing::debug;

use crate::graph::CsrMatrix;
use crate::normalize::{dead_ends, row_normalize};
use crate::reader::LoadedGraph;
use crate::{Error, Result};

/// A graph's adjacency matrix together with the transpose of its row-normalized transition
/// matrix.
///
/// Built once by [`build_transition_model`] and never mutated afterwards, so any number of
/// queries may share it (including from multiple threads).
#[derive(Debug, Clone)]
pub struct TransitionModel {
    adjacency: CsrMatrix,
    transition_t: CsrMatrix,
    base: usize,
    dead_ends: usize,
}

/// Row-normalize `adjacency` and cache the transpose `nA^T`.
///
/// `base` is the id offset reported by the reader (the original id of index 0).
/// Fails with [`Error::Dimension`] if `adjacency` is not square.
pub fn build_transition_model(adjacency: CsrMatrix, base: usize) -> Result<TransitionModel> {
    if !adjacency.is_square() {
        return Err(Error::Dimension {
            expected: adjacency.rows(),
            actual: adjacency.cols(),
        });
    }
    let transition_t = row_normalize(&adjacency).transpose();
    let dead_ends = dead_ends(&adjacency).len();
    debug!(
        n = adjacency.rows(),
        nnz = adjacency.nnz(),
        dead_ends,
        "built transition model"
    );
    Ok(TransitionModel {
        adjacency,
        transition_t,
        base,
        dead_ends,
    })
}

impl TryFrom<LoadedGraph> for TransitionModel {
    type Error = crate::Error;

    fn try_from(graph: LoadedGraph) -> Result<Self> {
        build_transition_model(graph.adjacency, graph.base)
    }
}

impl TransitionModel {
    /// Number of nodes `n`.
    pub fn node_count(&self) -> usize {
        self.adjacency.rows()
    }

    pub fn base(&self) -> usize {
        self.base
    }

    pub fn adjacency(&self) -> &CsrMatrix {
        &self.adjacency
    }

    /// `nA^T`, the operator the solver applies each iteration.
    pub fn transition_transpose(&self) -> &CsrMatrix {
        &self.transition_t
    }

    /// Number of zero out-degree nodes.
    pub fn dead_end_count(&self) -> usize {
        self.dead_ends
    }

    /// Original ids, in index order (`base..base + n`).
    pub fn node_ids(&self) -> Vec<usize> {
        (self.base..self.base + self.node_count()).collect()
    }

    /// Map an original id to its internal index.
    pub fn index_of(&self, id: usize) -> Result<usize> {
        id.checked_sub(self.base)
            .filter(|&i| i < self.node_count())
            .ok_or_else(|| {
                Error::Range(format!(
                    "node id {id} outside [{}, {})",
                    self.base,
                    self.base + self.node_count()
                ))
            })
    }
}
