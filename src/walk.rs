//! Random walk with restart from a single seed.

use crate::model::TransitionModel;
use crate::solver::{iterate, IterationConfig, IterationRun};
use crate::{Error, Result};

/// One-hot query vector for `seed` (an original, non-rebased id).
///
/// Fails with [`Error::Range`] unless `base <= seed < base + n`.
pub fn build_rwr_query(n: usize, base: usize, seed: usize) -> Result<Vec<f64>> {
    let index = seed
        .checked_sub(base)
        .filter(|&i| i < n)
        .ok_or_else(|| {
            Error::Range(format!(
                "seed {seed} outside [{base}, {})",
                base.saturating_add(n)
            ))
        })?;
    let mut q = vec![0.0; n];
    q[index] = 1.0;
    Ok(q)
}

pub fn rwr(model: &TransitionModel, seed: usize, config: &IterationConfig) -> Result<Vec<f64>> {
    Ok(rwr_run(model, seed, config)?.scores)
}

/// RWR with the residual trace and convergence flag.
pub fn rwr_run(
    model: &TransitionModel,
    seed: usize,
    config: &IterationConfig,
) -> Result<IterationRun> {
    let q = build_rwr_query(model.node_count(), model.base(), seed)?;
    iterate(model.transition_transpose(), &q, config)
}
