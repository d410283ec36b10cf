//! Score vector output.
//!
//! The on-disk format is one line per node, `node_id score`, with the score written like C's
//! `%e` (`1.234500e-01`).

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::{Error, Result};

/// Format `x` like C's `%e`: six fractional digits and a signed, two-digit exponent.
pub fn format_score(x: f64) -> String {
    if !x.is_finite() {
        return x.to_string();
    }
    let s = format!("{x:.6e}");
    match s.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(d) => ('-', d),
                None => ('+', exp),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => s,
    }
}

/// Write `node_id score` lines.
pub fn write_scores<W: Write>(mut writer: W, node_ids: &[usize], scores: &[f64]) -> Result<()> {
    if node_ids.len() != scores.len() {
        return Err(Error::Dimension {
            expected: node_ids.len(),
            actual: scores.len(),
        });
    }
    for (id, &s) in node_ids.iter().zip(scores) {
        writeln!(writer, "{id} {}", format_score(s))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_scores_to_path(
    path: impl AsRef<Path>,
    node_ids: &[usize],
    scores: &[f64],
) -> Result<()> {
    let file = File::create(path.as_ref())?;
    write_scores(BufWriter::new(file), node_ids, scores)
}

/// The `k` highest `(node_id, score)` pairs, by descending score then ascending id.
///
/// NaN scores sort last.
pub fn top_k(node_ids: &[usize], scores: &[f64], k: usize) -> Vec<(usize, f64)> {
    let mut ranked: Vec<(usize, f64)> = node_ids
        .iter()
        .copied()
        .zip(scores.iter().copied())
        .collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or_else(|| a.1.is_nan().cmp(&b.1.is_nan()))
            .then(a.0.cmp(&b.0))
    });
    ranked.truncate(k);
    ranked
}
