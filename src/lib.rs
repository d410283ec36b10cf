//! `rwr`: random walk with restart (RWR), personalized PageRank (PPR) and PageRank,
//! computed by power iteration over a row-normalized sparse transition matrix.
//!
//! Pipeline:
//! edge list → [`reader`] → adjacency [`CsrMatrix`] → [`build_transition_model`]
//! (row normalization + transpose, done once) → query vector ([`walk`], [`ppr`],
//! [`pagerank`]) → [`solver::iterate`] → score vector.
//!
//! Public invariants (must not drift):
//! - **Node order**: score vectors are indexed by rebased node id \(0..n-1\); the original id
//!   of index `i` is `base + i` (see [`TransitionModel::node_ids`]).
//! - **Dead ends are not rewritten**: zero out-degree rows stay all-zero after normalization.
//!   Mass lost at dead ends is returned through the query vector only when
//!   `handles_deadend` is set.
//! - **Mass conservation**: with `handles_deadend = true` every iterate sums to 1 (up to
//!   floating-point error) whenever the query vector does.
//! - **Device equivalence**: [`Device::Cpu`] and [`Device::Gpu`] run the same recurrence and
//!   agree within floating-point tolerance.
//! - **Budget exhaustion is not an error**: callers inspect [`IterationRun::converged`].
//!
//! Swappable (allowed to change without breaking the contract):
//! - the accelerated backend (currently a data-parallel `rayon` operator)
//! - sparse storage details (so long as duplicate merging and dimensions hold)

pub mod device;
pub mod graph;
pub mod model;
pub mod normalize;
pub mod output;
pub mod pagerank;
pub mod ppr;
pub mod query;
pub mod reader;
pub mod solver;
pub mod walk;

pub use device::{Device, Operator};
pub use graph::{CsrMatrix, GraphType};
pub use model::{build_transition_model, TransitionModel};
pub use normalize::{dead_ends, out_degrees, row_normalize};
pub use output::{format_score, top_k, write_scores, write_scores_to_path};
pub use pagerank::{build_pagerank_query, pagerank, pagerank_run};
pub use ppr::{build_ppr_query, ppr, ppr_run};
pub use query::{process_query, Query, QueryRequest, QueryType, ScoreVector};
pub use reader::{parse_edge_list, read_graph, read_seeds, EdgeList, LoadedGraph};
pub use solver::{iterate, iterate_with_observer, IterationConfig, IterationRun, Norm};
pub use walk::{build_rwr_query, rwr, rwr_run};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("format error: {0}")]
    Format(String),
    #[error("out of range: {0}")]
    Range(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    Dimension { expected: usize, actual: usize },
    #[error("device unavailable: {0}")]
    Device(String),
    #[error("not implemented: {0}")]
    Unimplemented(&'static str),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
