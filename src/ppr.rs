//! Personalized PageRank: restart to a uniform distribution over a seed set.

use crate::model::TransitionModel;
use crate::solver::{iterate, IterationConfig, IterationRun};
use crate::{Error, Result};

/// Query vector with mass `1/k` on each of the `k` distinct seeds (original ids).
///
/// Fails with [`Error::Range`] if `seeds` is empty or any seed is outside
/// `[base, base + n)`. Repeated seeds count once.
pub fn build_ppr_query(n: usize, base: usize, seeds: &[usize]) -> Result<Vec<f64>> {
    if seeds.is_empty() {
        return Err(Error::Range("seed set is empty".to_string()));
    }
    let mut indices = Vec::with_capacity(seeds.len());
    for &seed in seeds {
        let index = seed.checked_sub(base).filter(|&i| i < n).ok_or_else(|| {
            Error::Range(format!(
                "seed {seed} outside [{base}, {})",
                base.saturating_add(n)
            ))
        })?;
        indices.push(index);
    }
    indices.sort_unstable();
    indices.dedup();

    let mass = 1.0 / indices.len() as f64;
    let mut q = vec![0.0; n];
    for i in indices {
        q[i] = mass;
    }
    Ok(q)
}

pub fn ppr(model: &TransitionModel, seeds: &[usize], config: &IterationConfig) -> Result<Vec<f64>> {
    Ok(ppr_run(model, seeds, config)?.scores)
}

/// PPR with the residual trace and convergence flag.
pub fn ppr_run(
    model: &TransitionModel,
    seeds: &[usize],
    config: &IterationConfig,
) -> Result<IterationRun> {
    let q = build_ppr_query(model.node_count(), model.base(), seeds)?;
    iterate(model.transition_transpose(), &q, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphType;
    use crate::reader::parse_edge_list;
    use crate::walk::rwr;
    use proptest::prelude::*;

    fn model(text: &str) -> TransitionModel {
        let g = parse_edge_list(text.as_bytes(), GraphType::Directed).unwrap();
        TransitionModel::try_from(g).unwrap()
    }

    #[test]
    fn empty_seed_set_is_rejected() {
        let err = build_ppr_query(3, 0, &[]).unwrap_err();
        assert!(matches!(err, Error::Range(_)));
        let msg = format!("{err}");
        assert!(msg.contains("empty"));
    }

    #[test]
    fn any_out_of_range_seed_is_rejected() {
        let err = build_ppr_query(3, 1, &[1, 4]).unwrap_err();
        assert!(matches!(err, Error::Range(_)));
        let err = build_ppr_query(3, 1, &[0, 2]).unwrap_err();
        assert!(matches!(err, Error::Range(_)));
    }

    #[test]
    fn repeated_seeds_count_once() {
        let q = build_ppr_query(4, 0, &[1, 3, 1]).unwrap();
        assert_eq!(q, vec![0.0, 0.5, 0.0, 0.5]);
    }

    #[test]
    fn single_seed_matches_rwr() {
        let m = model("0 1\n1 2\n2 0\n2 1\n");
        let cfg = IterationConfig::default();
        assert_eq!(ppr(&m, &[2], &cfg).unwrap(), rwr(&m, 2, &cfg).unwrap());
    }

    #[test]
    fn ppr_is_the_average_of_rwr_scores() {
        // The recurrence is linear in q while Σq = 1, so uniform-seed PPR averages RWR.
        let m = model("0 1\n1 2\n2 0\n2 3\n3 1\n");
        let cfg = IterationConfig { epsilon: 1e-13, max_iters: 500, ..Default::default() };
        let p = ppr(&m, &[0, 3], &cfg).unwrap();
        let a = rwr(&m, 0, &cfg).unwrap();
        let b = rwr(&m, 3, &cfg).unwrap();
        for i in 0..4 {
            assert!((p[i] - 0.5 * (a[i] + b[i])).abs() < 1e-9, "node {i}");
        }
    }

    proptest! {
        #[test]
        fn prop_query_is_a_distribution(
            n in 1usize..20,
            seeds in proptest::collection::vec(0usize..20, 1..10),
        ) {
            let seeds: Vec<usize> = seeds.into_iter().map(|s| s % n).collect();
            let q = build_ppr_query(n, 0, &seeds).unwrap();
            let sum: f64 = q.iter().sum();
            prop_assert!((sum - 1.0).abs() < 1e-12);
            for s in seeds {
                prop_assert!(q[s] > 0.0);
            }
        }
    }
}
