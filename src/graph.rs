//! Sparse adjacency storage.
//!
//! [`CsrMatrix`] is the single matrix type of the crate: the adjacency matrix read from an
//! edge list, its row-normalized transition matrix, and that matrix's transpose all use it.
//!
//! Invariants:
//! - `row_ptr.len() == rows + 1`, `col_idx.len() == values.len() == nnz`.
//! - Column indices are strictly increasing within a row (duplicates are merged on
//!   construction).

use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// How a graph's edges are interpreted when the adjacency matrix is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum GraphType {
    Directed,
    Undirected,
    /// Accepted by the parser but not supported: reading fails with [`Error::Unimplemented`].
    Bipartite,
}

impl FromStr for GraphType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "directed" => Ok(Self::Directed),
            "undirected" => Ok(Self::Undirected),
            "bipartite" => Ok(Self::Bipartite),
            other => Err(Error::Config(format!(
                "graph type should be directed, undirected, or bipartite (got {other:?})"
            ))),
        }
    }
}

impl fmt::Display for GraphType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Directed => "directed",
            Self::Undirected => "undirected",
            Self::Bipartite => "bipartite",
        })
    }
}

/// Compressed sparse row matrix over `f64`.
///
/// Row `i` spans `row_ptr[i]..row_ptr[i + 1]` in `col_idx` / `values`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CsrMatrix {
    rows: usize,
    cols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<f64>,
}

impl CsrMatrix {
    /// An `rows x cols` matrix with no stored entries.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            row_ptr: vec![0; rows + 1],
            col_idx: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Build from `(row, col, value)` triplets.
    ///
    /// Entries sharing a position are merged: summed when `weighted`, otherwise collapsed to a
    /// single entry of value `1.0`.
    pub fn from_triplets(
        rows: usize,
        cols: usize,
        triplets: impl IntoIterator<Item = (usize, usize, f64)>,
        weighted: bool,
    ) -> Result<Self> {
        let mut sorted: Vec<(usize, usize, f64)> = triplets.into_iter().collect();
        for &(r, c, _) in &sorted {
            if r >= rows || c >= cols {
                return Err(Error::Range(format!(
                    "entry ({r}, {c}) outside a {rows}x{cols} matrix"
                )));
            }
        }
        sorted.sort_unstable_by_key(|&(r, c, _)| (r, c));

        let mut row_ptr = vec![0usize; rows + 1];
        let mut col_idx: Vec<usize> = Vec::with_capacity(sorted.len());
        let mut values: Vec<f64> = Vec::with_capacity(sorted.len());
        let mut last: Option<(usize, usize)> = None;

        for (r, c, v) in sorted {
            if last == Some((r, c)) {
                if let Some(slot) = values.last_mut() {
                    if weighted {
                        *slot += v;
                    }
                }
                continue;
            }
            last = Some((r, c));
            row_ptr[r + 1] += 1;
            col_idx.push(c);
            values.push(if weighted { v } else { 1.0 });
        }
        for i in 1..=rows {
            row_ptr[i] += row_ptr[i - 1];
        }

        Ok(Self {
            rows,
            cols,
            row_ptr,
            col_idx,
            values,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    pub fn row_ptr(&self) -> &[usize] {
        &self.row_ptr
    }

    pub fn col_idx(&self) -> &[usize] {
        &self.col_idx
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// `(col, value)` pairs of row `row`.
    pub fn row(&self, row: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let span = self.row_ptr[row]..self.row_ptr[row + 1];
        self.col_idx[span.clone()]
            .iter()
            .copied()
            .zip(self.values[span].iter().copied())
    }

    /// Stored value at `(row, col)`, `0.0` when absent.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        if row >= self.rows {
            return 0.0;
        }
        let span = self.row_ptr[row]..self.row_ptr[row + 1];
        match self.col_idx[span.clone()].binary_search(&col) {
            Ok(k) => self.values[span.start + k],
            Err(_) => 0.0,
        }
    }

    /// Row-wise sums.
    pub fn row_sums(&self) -> Vec<f64> {
        (0..self.rows).map(|i| self.row(i).map(|(_, v)| v).sum()).collect()
    }

    /// Same sparsity pattern, each stored value replaced by `f(row, value)`.
    pub fn map_rows(&self, f: impl Fn(usize, f64) -> f64) -> Self {
        let mut mapped = self.clone();
        for i in 0..self.rows {
            for v in &mut mapped.values[self.row_ptr[i]..self.row_ptr[i + 1]] {
                *v = f(i, *v);
            }
        }
        mapped
    }

    /// `A^T` in CSR form (counting sort, O(nnz + rows + cols)).
    pub fn transpose(&self) -> Self {
        let nnz = self.nnz();
        let mut row_ptr = vec![0usize; self.cols + 1];
        for &c in &self.col_idx {
            row_ptr[c + 1] += 1;
        }
        for i in 1..=self.cols {
            row_ptr[i] += row_ptr[i - 1];
        }

        let mut col_idx = vec![0usize; nnz];
        let mut values = vec![0.0f64; nnz];
        let mut cursor = row_ptr.clone();
        for r in 0..self.rows {
            for (c, v) in self.row(r) {
                let dest = cursor[c];
                col_idx[dest] = r;
                values[dest] = v;
                cursor[c] += 1;
            }
        }

        Self {
            rows: self.cols,
            cols: self.rows,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// `A + A^T` with the diagonal counted once, then merged like [`Self::from_triplets`].
    pub fn symmetrize(&self, weighted: bool) -> Result<Self> {
        let mut triplets = Vec::with_capacity(self.nnz() * 2);
        for r in 0..self.rows {
            for (c, v) in self.row(r) {
                triplets.push((r, c, v));
                if r != c {
                    triplets.push((c, r, v));
                }
            }
        }
        let n = self.rows.max(self.cols);
        Self::from_triplets(n, n, triplets, weighted)
    }

    /// `y = A x`.
    ///
    /// Debug-asserts that `x.len() == cols` and `y.len() == rows`.
    pub fn spmv(&self, x: &[f64], y: &mut [f64]) {
        debug_assert_eq!(x.len(), self.cols, "spmv: x.len() != cols");
        debug_assert_eq!(y.len(), self.rows, "spmv: y.len() != rows");
        for (i, yi) in y.iter_mut().enumerate() {
            *yi = self.row(i).map(|(c, v)| v * x[c]).sum();
        }
    }

    /// Dense row-major copy. Intended for tests and tiny graphs.
    pub fn to_dense(&self) -> Vec<Vec<f64>> {
        let mut dense = vec![vec![0.0; self.cols]; self.rows];
        for (r, row) in dense.iter_mut().enumerate() {
            for (c, v) in self.row(r) {
                row[c] = v;
            }
        }
        dense
    }
}
