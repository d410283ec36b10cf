//! Row normalization: adjacency → row-stochastic transition matrix.
//!
//! `nA[i][j] = A[i][j] / out_degree(i)` where `out_degree(i) = Σ_j A[i][j]`; a zero
//! out-degree is clamped to 1 for the division.
//!
//! Only zero is clamped, not every degree below 1 (`max(d, 1)`). A row with fractional
//! weights such as `[0.25]` is still scaled up to sum to 1.
//!
//! Rows with zero out-degree (dead ends) stay all-zero. They are *not* turned into self-loops;
//! the solver decides what to do with the mass that leaks through them.

use crate::graph::CsrMatrix;

/// Weighted out-degree of every row.
pub fn out_degrees(adjacency: &CsrMatrix) -> Vec<f64> {
    adjacency.row_sums()
}

/// Indices of rows with zero out-degree.
pub fn dead_ends(adjacency: &CsrMatrix) -> Vec<usize> {
    out_degrees(adjacency)
        .iter()
        .enumerate()
        .filter(|(_, &d)| d == 0.0)
        .map(|(i, _)| i)
        .collect()
}

/// Row-normalize `adjacency`.
///
/// Pure and idempotent: a matrix whose non-zero rows already sum to 1 is returned unchanged
/// (up to floating-point rounding).
pub fn row_normalize(adjacency: &CsrMatrix) -> CsrMatrix {
    let inv: Vec<f64> = out_degrees(adjacency)
        .into_iter()
        .map(|d| if d > 0.0 { 1.0 / d } else { 1.0 })
        .collect();
    adjacency.map_rows(|row, v| v * inv[row])
}
