//! Damped power iteration.
//!
//! Given `M = nA^T` (the transposed row-normalized transition matrix) and a query distribution
//! `q`, iterate from `x₀ = q`:
//!
//! - with dead-end handling: `x = (1 − c)·M·x_prev`, then `x += (1 − Σx)·q`. Mass lost at
//!   zero out-degree rows is returned through `q`, so `Σx = 1` whenever `Σq = 1`.
//! - without: `x = (1 − c)·M·x_prev + c·q`.
//!
//! The residual `‖x − x_prev‖` is recorded every iteration; the loop stops as soon as it is
//! `<= epsilon` or after `max_iters` iterations. Running out of iterations is not an error.

use std::fmt;
use std::str::FromStr;

use tracing::{debug, trace, warn};

use crate::device::{operator_for, Device, Operator};
use crate::graph::CsrMatrix;
use crate::{Error, Result};

/// Vector norm used for the residual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Norm {
    #[default]
    L1,
    L2,
    /// Largest absolute component.
    Max,
}

impl Norm {
    /// `‖x − y‖`.
    pub fn distance(self, x: &[f64], y: &[f64]) -> f64 {
        let diffs = x.iter().zip(y).map(|(a, b)| (a - b).abs());
        match self {
            Self::L1 => diffs.sum(),
            Self::L2 => diffs.map(|d| d * d).sum::<f64>().sqrt(),
            Self::Max => diffs.fold(0.0, f64::max),
        }
    }
}

impl FromStr for Norm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "l1" => Ok(Self::L1),
            "2" | "l2" => Ok(Self::L2),
            "inf" | "max" => Ok(Self::Max),
            other => Err(Error::Config(format!(
                "norm should be 1, 2, or inf (got {other:?})"
            ))),
        }
    }
}

impl fmt::Display for Norm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::L1 => "l1",
            Self::L2 => "l2",
            Self::Max => "inf",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IterationConfig {
    /// Restart probability `c`.
    pub restart: f64,
    /// Convergence tolerance on the residual.
    pub epsilon: f64,
    pub max_iters: usize,
    pub handles_deadend: bool,
    pub norm: Norm,
    pub device: Device,
}

impl Default for IterationConfig {
    fn default() -> Self {
        Self {
            restart: 0.15,
            epsilon: 1e-9,
            max_iters: 100,
            handles_deadend: true,
            norm: Norm::L1,
            device: Device::Cpu,
        }
    }
}

impl IterationConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.restart.is_finite() || !(0.0..=1.0).contains(&self.restart) {
            return Err(Error::Config(format!(
                "restart probability must be in [0,1] (got {})",
                self.restart
            )));
        }
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(Error::Config(format!(
                "epsilon must be finite and >= 0 (got {})",
                self.epsilon
            )));
        }
        if self.max_iters == 0 {
            return Err(Error::Config("max_iters must be > 0".to_string()));
        }
        Ok(())
    }
}

/// Outcome of a power iteration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IterationRun {
    pub scores: Vec<f64>,
    /// One residual per executed iteration.
    pub residuals: Vec<f64>,
    pub iterations: usize,
    /// `false` when `max_iters` ran out first; `scores` then holds the last iterate.
    pub converged: bool,
}

impl IterationRun {
    pub fn final_residual(&self) -> Option<f64> {
        self.residuals.last().copied()
    }
}

/// Power iteration on `device`. See the module docs for the recurrence.
///
/// Errors: [`Error::Config`] for an invalid config, [`Error::Dimension`] if `transition_t` is
/// not square or does not match `q`, [`Error::Device`] if the device is unavailable.
pub fn iterate(
    transition_t: &CsrMatrix,
    q: &[f64],
    config: &IterationConfig,
) -> Result<IterationRun> {
    iterate_with_observer(transition_t, q, config, |_, _| {})
}

/// [`iterate`], calling `observer(iteration, residual)` once per iteration.
pub fn iterate_with_observer(
    transition_t: &CsrMatrix,
    q: &[f64],
    config: &IterationConfig,
    observer: impl FnMut(usize, f64),
) -> Result<IterationRun> {
    config.validate()?;
    if !transition_t.is_square() {
        return Err(Error::Dimension {
            expected: transition_t.rows(),
            actual: transition_t.cols(),
        });
    }
    if transition_t.rows() != q.len() {
        return Err(Error::Dimension {
            expected: transition_t.rows(),
            actual: q.len(),
        });
    }

    let op = operator_for(config.device, transition_t)?;
    debug!(
        device = %op.device(),
        n = transition_t.rows(),
        nnz = transition_t.nnz(),
        restart = config.restart,
        handles_deadend = config.handles_deadend,
        "power iteration"
    );
    Ok(power_iterate(op.as_ref(), q, config, observer))
}

/// The recurrence itself, generic over the device operator.
///
/// Assumes `config` is valid and `q.len() == op.dim()`.
pub(crate) fn power_iterate<O: Operator + ?Sized>(
    op: &O,
    q: &[f64],
    config: &IterationConfig,
    mut observer: impl FnMut(usize, f64),
) -> IterationRun {
    let c = config.restart;
    let mut prev = q.to_vec();
    let mut x = vec![0.0; op.dim()];
    let mut residuals = Vec::with_capacity(config.max_iters);
    let mut converged = false;

    for i in 0..config.max_iters {
        op.apply(&prev, 1.0 - c, &mut x);
        if config.handles_deadend {
            let s = op.sum(&x);
            op.axpy(1.0 - s, q, &mut x);
        } else {
            op.axpy(c, q, &mut x);
        }

        let residual = op.distance(&x, &prev, config.norm);
        residuals.push(residual);
        observer(i, residual);
        trace!(iteration = i, residual, "power iteration step");

        // `prev` holds the newest iterate from here on.
        std::mem::swap(&mut prev, &mut x);
        if residual <= config.epsilon {
            converged = true;
            break;
        }
    }

    let iterations = residuals.len();
    if converged {
        debug!(iterations, residual = ?residuals.last(), "converged");
    } else {
        warn!(
            iterations,
            residual = ?residuals.last(),
            epsilon = config.epsilon,
            "iteration budget exhausted before convergence"
        );
    }

    IterationRun {
        scores: prev,
        residuals,
        iterations,
        converged,
    }
}
