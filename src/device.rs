//! Execution devices for the power iteration.
//!
//! Each device provides an [`Operator`]: the transposed transition matrix in whatever form
//! the device computes with, plus the handful of vector kernels the recurrence needs. The
//! recurrence itself lives in [`crate::solver`] and is written once against this trait.
//!
//! - [`Device::Cpu`]: serial SpMV straight off the borrowed [`CsrMatrix`].
//! - [`Device::Gpu`]: the accelerated path. The matrix is packed once into a contiguous
//!   row-blocked layout and every kernel runs data-parallel on the `rayon` pool. Available only
//!   with the `parallel` feature; otherwise requesting it fails with [`Error::Device`].

use std::fmt;
use std::str::FromStr;

use crate::graph::CsrMatrix;
use crate::solver::Norm;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Device {
    #[default]
    Cpu,
    Gpu,
}

impl FromStr for Device {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(Self::Cpu),
            "gpu" => Ok(Self::Gpu),
            other => Err(Error::Config(format!(
                "device should be cpu or gpu (got {other:?})"
            ))),
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cpu => "cpu",
            Self::Gpu => "gpu",
        })
    }
}

/// The matrix operator and vector kernels of one device.
///
/// All slices have length [`Operator::dim`].
pub trait Operator: Send + Sync {
    fn device(&self) -> Device;

    fn dim(&self) -> usize;

    /// `y = alpha * M x`.
    fn apply(&self, x: &[f64], alpha: f64, y: &mut [f64]);

    /// `Σ x`.
    fn sum(&self, x: &[f64]) -> f64;

    /// `y += a * q`.
    fn axpy(&self, a: f64, q: &[f64], y: &mut [f64]);

    /// `‖x − y‖` under `norm`.
    fn distance(&self, x: &[f64], y: &[f64], norm: Norm) -> f64;
}

/// Prepare `matrix` for execution on `device`.
///
/// This is the single host-to-device step; nothing is converted per iteration.
pub fn operator_for(device: Device, matrix: &CsrMatrix) -> Result<Box<dyn Operator + '_>> {
    match device {
        Device::Cpu => Ok(Box::new(CpuOperator::new(matrix))),
        Device::Gpu => accelerated(matrix),
    }
}

#[cfg(feature = "parallel")]
fn accelerated(matrix: &CsrMatrix) -> Result<Box<dyn Operator + '_>> {
    Ok(Box::new(parallel::PackedOperator::upload(matrix)))
}

#[cfg(not(feature = "parallel"))]
fn accelerated(_matrix: &CsrMatrix) -> Result<Box<dyn Operator + '_>> {
    Err(Error::Device(
        "no accelerator in this build (enable the `parallel` feature) - use cpu".to_string(),
    ))
}

/// Serial operator over a borrowed matrix.
pub struct CpuOperator<'a> {
    matrix: &'a CsrMatrix,
}

impl<'a> CpuOperator<'a> {
    pub fn new(matrix: &'a CsrMatrix) -> Self {
        Self { matrix }
    }
}

impl Operator for CpuOperator<'_> {
    fn device(&self) -> Device {
        Device::Cpu
    }

    fn dim(&self) -> usize {
        self.matrix.rows()
    }

    fn apply(&self, x: &[f64], alpha: f64, y: &mut [f64]) {
        self.matrix.spmv(x, y);
        for yi in y.iter_mut() {
            *yi *= alpha;
        }
    }

    fn sum(&self, x: &[f64]) -> f64 {
        x.iter().sum()
    }

    fn axpy(&self, a: f64, q: &[f64], y: &mut [f64]) {
        for (yi, &qi) in y.iter_mut().zip(q) {
            *yi += a * qi;
        }
    }

    fn distance(&self, x: &[f64], y: &[f64], norm: Norm) -> f64 {
        norm.distance(x, y)
    }
}

#[cfg(feature = "parallel")]
mod parallel {
    use rayon::prelude::*;

    use super::{Device, Operator};
    use crate::graph::CsrMatrix;
    use crate::solver::Norm;

    /// Rows per rayon task; below this the split overhead dominates.
    const MIN_ROWS_PER_TASK: usize = 1024;

    /// Owned, packed copy of the matrix: `(col, value)` pairs stored contiguously per row.
    pub(super) struct PackedOperator {
        row_ptr: Vec<usize>,
        entries: Vec<(usize, f64)>,
    }

    impl PackedOperator {
        pub(super) fn upload(matrix: &CsrMatrix) -> Self {
            let entries = matrix
                .col_idx()
                .iter()
                .copied()
                .zip(matrix.values().iter().copied())
                .collect();
            Self {
                row_ptr: matrix.row_ptr().to_vec(),
                entries,
            }
        }
    }

    impl Operator for PackedOperator {
        fn device(&self) -> Device {
            Device::Gpu
        }

        fn dim(&self) -> usize {
            self.row_ptr.len() - 1
        }

        fn apply(&self, x: &[f64], alpha: f64, y: &mut [f64]) {
            y.par_iter_mut()
                .with_min_len(MIN_ROWS_PER_TASK)
                .enumerate()
                .for_each(|(i, yi)| {
                    let row = &self.entries[self.row_ptr[i]..self.row_ptr[i + 1]];
                    *yi = alpha * row.iter().map(|&(c, v)| v * x[c]).sum::<f64>();
                });
        }

        fn sum(&self, x: &[f64]) -> f64 {
            x.par_iter().with_min_len(MIN_ROWS_PER_TASK).sum()
        }

        fn axpy(&self, a: f64, q: &[f64], y: &mut [f64]) {
            y.par_iter_mut()
                .with_min_len(MIN_ROWS_PER_TASK)
                .zip(q.par_iter())
                .for_each(|(yi, &qi)| *yi += a * qi);
        }

        fn distance(&self, x: &[f64], y: &[f64], norm: Norm) -> f64 {
            let diffs = x
                .par_iter()
                .with_min_len(MIN_ROWS_PER_TASK)
                .zip(y.par_iter())
                .map(|(a, b)| (a - b).abs());
            match norm {
                Norm::L1 => diffs.sum(),
                Norm::L2 => diffs.map(|d| d * d).sum::<f64>().sqrt(),
                Norm::Max => diffs.reduce(|| 0.0, f64::max),
            }
        }
    }
}
