use std::io::Write;

use rwr::{
    build_transition_model, pagerank, parse_edge_list, ppr, process_query, read_graph,
    read_seeds, rwr, rwr_run, write_scores_to_path, CsrMatrix, Error, GraphType,
    IterationConfig, Query, QueryRequest, TransitionModel,
};

fn assert_prob_like(xs: &[f64]) {
    assert!(!xs.is_empty());
    for &x in xs {
        assert!(x.is_finite(), "non-finite score: {x}");
        assert!(x >= 0.0, "negative score: {x}");
    }
    let s: f64 = xs.iter().copied().sum();
    assert!((s - 1.0).abs() <= 1e-6, "sum={s} not ~1");
}

fn model(text: &str, graph_type: GraphType) -> TransitionModel {
    let g = parse_edge_list(text.as_bytes(), graph_type).unwrap();
    TransitionModel::try_from(g).unwrap()
}

fn assert_close(actual: &[f64], expected: &[f64], tol: f64) {
    assert_eq!(actual.len(), expected.len());
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!((a - e).abs() <= tol, "index {i}: {a} vs {e}");
    }
}

#[test]
fn rwr_on_directed_cycle_matches_closed_form() {
    // 0 -> 1 -> 2 -> 3 -> 0, seed 0.
    // r0 = c + (1-c) r3, r_{k+1} = (1-c) r_k  =>  r0 = c / (1 - (1-c)^4).
    let m = model("0 1\n1 2\n2 3\n3 0\n", GraphType::Directed);
    let run = rwr_run(&m, 0, &IterationConfig::default()).unwrap();
    let a = 0.15 / (1.0 - 0.85f64.powi(4));
    let expected = [a, 0.85 * a, 0.85f64.powi(2) * a, 0.85f64.powi(3) * a];
    assert_close(&run.scores, &expected, 1e-6);
    assert_prob_like(&run.scores);
    assert!(run.iterations <= 100);
}

#[test]
fn pagerank_on_mutual_pair_is_uniform() {
    for (text, graph_type) in [
        ("0 1\n", GraphType::Undirected),
        ("0 1\n1 0\n", GraphType::Directed),
    ] {
        let m = model(text, graph_type);
        let scores = pagerank(&m, &IterationConfig::default()).unwrap();
        assert_close(&scores, &[0.5, 0.5], 1e-12);
    }
}

#[test]
fn deadend_handling_restores_leaked_mass() {
    // 0 -> 1 -> 2, node 2 is a dead end.
    let m = model("0 1\n1 2\n", GraphType::Directed);
    // The restart correction contracts by (1-c) per step, so give it room to settle.
    let handled_cfg = IterationConfig {
        max_iters: 1000,
        epsilon: 1e-12,
        ..Default::default()
    };
    let handled = rwr(&m, 0, &handled_cfg).unwrap();
    let leaky_cfg = IterationConfig {
        handles_deadend: false,
        ..Default::default()
    };
    let leaky = rwr(&m, 0, &leaky_cfg).unwrap();

    assert_prob_like(&handled);
    let z = 1.0 + 0.85 + 0.85 * 0.85;
    assert_close(&handled, &[1.0 / z, 0.85 / z, 0.7225 / z], 1e-9);

    assert_close(&leaky, &[0.15, 0.1275, 0.108375], 1e-12);
    let total: f64 = leaky.iter().sum();
    // Each step the dead end drops (1-c)·r2; restarts accumulate that loss by 1/c.
    let lost = 0.85 * leaky[2] / 0.15;
    assert!((1.0 - total - lost).abs() < 1e-12, "gap={} lost={lost}", 1.0 - total);
}

#[test]
fn directed_graphs_with_deadend_handling_sum_to_one() {
    let m = model("1 2 0.5\n2 3 2\n3 1 1\n3 4 1\n5 1 1\n", GraphType::Directed);
    assert_eq!(m.base(), 1);
    assert_prob_like(&pagerank(&m, &IterationConfig::default()).unwrap());
    assert_prob_like(&ppr(&m, &[2, 5], &IterationConfig::default()).unwrap());
}

#[test]
fn seed_validation() {
    let m = model("10 11\n11 12\n", GraphType::Directed);
    let cfg = IterationConfig::default();
    for seed in [0, 9, 13] {
        assert!(matches!(rwr(&m, seed, &cfg).unwrap_err(), Error::Range(_)));
    }
    assert!(matches!(ppr(&m, &[], &cfg).unwrap_err(), Error::Range(_)));
    assert!(rwr(&m, 12, &cfg).is_ok());
}

#[test]
fn model_is_shared_across_queries() {
    let m = model("0 1\n1 2\n2 0\n", GraphType::Undirected);
    let before = m.transition_transpose().clone();
    let cfg = IterationConfig::default();
    let a = ppr(&m, &[0], &cfg).unwrap();
    let _ = ppr(&m, &[1, 2], &cfg).unwrap();
    let b = ppr(&m, &[0], &cfg).unwrap();
    assert_eq!(a, b);
    assert_eq!(*m.transition_transpose(), before);
}

#[test]
fn non_square_adjacency_is_a_dimension_error() {
    let err = build_transition_model(CsrMatrix::zeros(3, 2), 0).unwrap_err();
    assert!(matches!(err, Error::Dimension { .. }));
}

#[cfg(feature = "parallel")]
#[test]
fn accelerated_device_matches_cpu_end_to_end() {
    use rwr::Device;
    let m = model("0 1 1\n0 2 3\n1 2 1\n2 0 0.5\n3 2 1\n", GraphType::Directed);
    for handles_deadend in [true, false] {
        let cpu = IterationConfig {
            handles_deadend,
            ..Default::default()
        };
        let gpu = IterationConfig {
            device: Device::Gpu,
            ..cpu
        };
        let a = rwr(&m, 3, &cpu).unwrap();
        let b = rwr(&m, 3, &gpu).unwrap();
        assert_close(&a, &b, 1e-6);
    }
}

#[cfg(not(feature = "parallel"))]
#[test]
fn accelerated_device_is_unavailable_without_parallel_feature() {
    use rwr::Device;
    let m = model("0 1\n", GraphType::Directed);
    let cfg = IterationConfig {
        device: Device::Gpu,
        ..Default::default()
    };
    assert!(matches!(rwr(&m, 0, &cfg).unwrap_err(), Error::Device(_)));
}

#[test]
fn reads_graph_and_seeds_from_files() {
    let mut graph = tempfile::NamedTempFile::new().unwrap();
    writeln!(graph, "# src dst weight").unwrap();
    writeln!(graph, "1 2 1.0").unwrap();
    writeln!(graph, "2 3 1.0").unwrap();
    writeln!(graph, "3 1 2.0").unwrap();
    graph.flush().unwrap();

    let g = read_graph(graph.path(), GraphType::Directed).unwrap();
    assert_eq!(g.base, 1);
    assert_eq!(g.node_count(), 3);
    assert!(g.weighted);

    let mut seeds = tempfile::NamedTempFile::new().unwrap();
    writeln!(seeds, "1\n\n3").unwrap();
    seeds.flush().unwrap();
    assert_eq!(read_seeds(seeds.path()).unwrap(), vec![1, 3]);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = read_graph(dir.path().join("absent.txt"), GraphType::Directed).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn process_query_reports_original_ids_and_writes_scores() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("graph.txt");
    std::fs::write(&input, "5 6\n6 7\n7 5\n").unwrap();

    let request = QueryRequest {
        query: Query::Rwr { seed: 5 },
        graph_type: GraphType::Directed,
        input_path: input,
        config: IterationConfig::default(),
    };
    let result = process_query(&request).unwrap();
    assert_eq!(result.node_ids, vec![5, 6, 7]);
    assert_prob_like(&result.scores);
    assert_eq!(result.top_k(1)[0].0, 5);

    let out = dir.path().join("scores.txt");
    write_scores_to_path(&out, &result.node_ids, &result.scores).unwrap();
    let text = std::fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("5 "));
    assert!(lines[0].contains("e-01"), "{}", lines[0]);
}

#[test]
fn process_query_rejects_bipartite_graphs() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("graph.txt");
    std::fs::write(&input, "0 1\n").unwrap();
    let request = QueryRequest {
        query: Query::PageRank,
        graph_type: GraphType::Bipartite,
        input_path: input,
        config: IterationConfig::default(),
    };
    assert!(matches!(
        process_query(&request).unwrap_err(),
        Error::Unimplemented(_)
    ));
}
