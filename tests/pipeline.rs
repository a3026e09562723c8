//! End-to-end run over a small keyring dump: ingest, component extraction,
//! centrality ranking and the threaded distance pass.

use serde::Deserialize;
use strongset::{
    betweenness,
    component::{
        reverse_reachable, strongly_connected_components, ComponentSearchConfig,
        LargestComponentSearch,
    },
    compute::{connectivity_pass, ComputeConfig},
    ingest::{read_graph, IngestConfig},
    key::KeyId,
    report,
};

/// A keyring topology: ids plus `[signer, signee]` pairs.
#[derive(Deserialize)]
struct Topology {
    keys: Vec<String>,
    signatures: Vec<(String, String)>,
}

/// A ring of trust A → B → C → A, D signing A from outside, E isolated.
const TOPOLOGY: &str = r#"{
    "keys": [
        "AAAAAAAAAAAAAAAA",
        "BBBBBBBBBBBBBBBB",
        "CCCCCCCCCCCCCCCC",
        "DDDDDDDDDDDDDDDD",
        "EEEEEEEEEEEEEEEE"
    ],
    "signatures": [
        ["AAAAAAAAAAAAAAAA", "BBBBBBBBBBBBBBBB"],
        ["BBBBBBBBBBBBBBBB", "CCCCCCCCCCCCCCCC"],
        ["CCCCCCCCCCCCCCCC", "AAAAAAAAAAAAAAAA"],
        ["DDDDDDDDDDDDDDDD", "AAAAAAAAAAAAAAAA"]
    ]
}"#;

/// Renders the topology in the dump format consumed by ingest.
fn dump(topology: &Topology) -> String {
    let mut out = String::new();
    for key in &topology.keys {
        out.push_str(&format!("p{key}\n"));
        for (signer, signee) in &topology.signatures {
            if signee == key {
                out.push_str(&format!("s{signer}\n"));
            }
        }
    }
    out
}

fn lines(buf: &[u8]) -> Vec<String> {
    String::from_utf8(buf.to_vec())
        .unwrap()
        .lines()
        .map(str::to_owned)
        .collect()
}

#[test]
fn full_pipeline() {
    tracing_subscriber::fmt().with_env_filter("info").try_init().ok();

    let topology: Topology = serde_json::from_str(TOPOLOGY).unwrap();
    let (graph, stats) = read_graph(dump(&topology).as_bytes(), &IngestConfig::default()).unwrap();

    assert_eq!(stats.keys, 5);
    assert_eq!(stats.signatures, 4);
    assert_eq!(stats.unknown_signers, 0);

    // The ring is the strong set; D reaches into it, E doesn't.
    let scc = strongly_connected_components(&graph);
    let (representative, strong_size) = scc.strong_set().unwrap();
    assert_eq!(strong_size, 3);

    let reachable = reverse_reachable(&graph, representative);
    assert_eq!(reachable.len(), 4);
    let e = graph.get(&KeyId::from("EEEEEEEEEEEEEEEE")).unwrap();
    assert!(!reachable.contains(e));

    // Threaded distance pass with shared aggregation.
    let mut records = Vec::new();
    let mut strong = Vec::new();
    let summary = connectivity_pass(
        &graph,
        &scc,
        &reachable,
        &mut records,
        &mut strong,
        &ComputeConfig::default(),
    )
    .unwrap();

    // Means: 1.5 from each ring member, 3.0 from D.
    assert_eq!(summary.reachable, 4);
    assert_eq!(summary.strong_size, 3);
    assert_eq!(summary.global_mean, 1.875);
    assert_eq!(lines(&records).len(), 4);

    let mut summary_out = Vec::new();
    report::write_summary(&mut summary_out, summary.global_mean).unwrap();
    assert_eq!(lines(&summary_out), ["Average mean is    1.8750"]);

    // Strong-set side channel lists the ring and its internal signatures.
    let mut strong_lines = lines(&strong);
    strong_lines.sort();
    assert_eq!(
        strong_lines,
        [
            "pAAAAAAAAAAAAAAAA",
            "pBBBBBBBBBBBBBBBB",
            "pCCCCCCCCCCCCCCCC",
            "sAAAAAAAAAAAAAAAA",
            "sBBBBBBBBBBBBBBBB",
            "sCCCCCCCCCCCCCCCC",
        ]
    );

    // Centrality ranking over the full graph, ascending and grouped.
    let centrality = betweenness::betweenness_centrality(&graph).unwrap();
    let mut ranking = Vec::new();
    report::write_centrality_ranking(&mut ranking, &graph, &centrality).unwrap();
    assert_eq!(
        lines(&ranking),
        [
            "DDDDDDDDDDDDDDDD;0.000000000",
            "EEEEEEEEEEEEEEEE;0.000000000",
            "CCCCCCCCCCCCCCCC;1.000000000",
            "BBBBBBBBBBBBBBBB;2.000000000",
            "AAAAAAAAAAAAAAAA;3.000000000",
        ]
    );
}

#[test]
fn largest_component_feeds_the_centrality_pass() {
    let topology: Topology = serde_json::from_str(TOPOLOGY).unwrap();
    let (graph, _) = read_graph(dump(&topology).as_bytes(), &IngestConfig::default()).unwrap();

    let champion = LargestComponentSearch::new(&graph)
        .run(&ComponentSearchConfig::default())
        .unwrap();
    assert_eq!(champion.len(), 3);
    assert_eq!(
        champion.representative(),
        &KeyId::from("AAAAAAAAAAAAAAAA")
    );

    // The champion's membership can be re-emitted as a dump of its own.
    let mut dump_out = Vec::new();
    report::write_component_dump(&mut dump_out, &graph, champion.members()).unwrap();
    let dump_lines = lines(&dump_out);
    assert_eq!(dump_lines.len(), 3 + 4); // three keys, four signatures onto them

    // Centrality restricted to the component: a ring scores evenly.
    let sub = graph.subgraph(champion.members());
    let centrality = betweenness::betweenness_centrality(&sub).unwrap();
    let mut ranking = Vec::new();
    report::write_centrality_ranking(&mut ranking, &sub, &centrality).unwrap();
    assert_eq!(
        lines(&ranking),
        [
            "AAAAAAAAAAAAAAAA;1.000000000",
            "BBBBBBBBBBBBBBBB;1.000000000",
            "CCCCCCCCCCCCCCCC;1.000000000",
        ]
    );
}

#[test]
fn key_detail_report() {
    let topology: Topology = serde_json::from_str(TOPOLOGY).unwrap();
    let (graph, _) = read_graph(dump(&topology).as_bytes(), &IngestConfig::default()).unwrap();

    let scc = strongly_connected_components(&graph);
    let d = graph.get(&KeyId::from("DDDDDDDDDDDDDDDD")).unwrap();
    let report_d = strongset::distance::distance_report(
        &graph,
        d,
        &scc,
        &strongset::distance::DistanceConfig::default(),
    );

    let mut out = Vec::new();
    report::write_key_detail(&mut out, &graph, &scc, d, &report_d).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(text.contains("KeyID DDDDDDDDDDDDDDDD"));
    assert!(text.contains("This key is not in the strong set."));
    assert!(text.contains("Mean distance to the strong set:  3.00000"));
    assert!(text.contains("Farthest keys (3 hops):"));
    assert!(text.contains("  CCCCCCCCCCCCCCCC"));
}
