//! Betweenness centrality over signature graphs.
//!
//! This is an implementation of Ulrik Brandes's
//! "A Faster Algorithm for Betweenness Centrality"
//! http://snap.stanford.edu/class/cs224w-readings/brandes01centrality.pdf
//! page 10, "Algorithm 1: Betweenness centrality in unweighted graphs",
//! run over directed edges and left unnormalized.

use std::collections::VecDeque;

use tracing::info;

use crate::{
    error::{Error, Result},
    graph::{Graph, GraphIndex},
};

/// Per-round transient state, one slot per vertex.
///
/// Valid only within a single source round; every field is reinitialized by
/// [`reset`](RoundScratch::reset) before the round starts. A value left over
/// from a previous round is a correctness bug, not a performance issue.
struct RoundScratch {
    /// BFS distance from the round's source, `-1` for unvisited.
    distance: Vec<i64>,
    /// Number of distinct shortest paths from the source.
    sigma: Vec<f64>,
    /// Accumulated pair dependency.
    delta: Vec<f64>,
    /// Predecessors on shortest paths from the source, appended and drained
    /// in FIFO order.
    predecessors: Vec<Vec<GraphIndex>>,
}

impl RoundScratch {
    fn new(slots: usize) -> Self {
        Self {
            distance: vec![-1; slots],
            sigma: vec![0.0; slots],
            delta: vec![0.0; slots],
            predecessors: vec![Vec::new(); slots],
        }
    }

    fn reset(&mut self, source: GraphIndex) {
        for distance in &mut self.distance {
            *distance = -1;
        }
        for sigma in &mut self.sigma {
            *sigma = 0.0;
        }
        for delta in &mut self.delta {
            *delta = 0.0;
        }
        for predecessors in &mut self.predecessors {
            predecessors.clear();
        }

        self.distance[source as usize] = 0;
        self.sigma[source as usize] = 1.0;
    }
}

/// Computes the unnormalized betweenness centrality of every vertex.
///
/// One single-source round per vertex, O(V·E) in total. Scores are indexed by
/// [`GraphIndex`]; detached slots stay at zero. The pass is single-threaded:
/// rounds are independent across sources and could be farmed out the way the
/// distance pass is, but the reference behaviour keeps them sequential.
///
/// # Errors
///
/// Returns [`Error::NumericInvariant`] if a dependency accumulation turns
/// NaN or infinite. That can only happen when a recorded shortest-path
/// predecessor sees a path count of zero, i.e. the graph structure itself is
/// corrupt, so the whole computation is abandoned.
///
/// # Examples
///
/// ```
/// use strongset::{betweenness, graph::Graph, key::KeyId};
///
/// // A diamond: a → b → d and a → c → d.
/// let mut graph = Graph::new();
/// let a = graph.insert(KeyId::from("a"));
/// let b = graph.insert(KeyId::from("b"));
/// let c = graph.insert(KeyId::from("c"));
/// let d = graph.insert(KeyId::from("d"));
/// graph.add_edge(a, b);
/// graph.add_edge(a, c);
/// graph.add_edge(b, d);
/// graph.add_edge(c, d);
///
/// let centrality = betweenness::betweenness_centrality(&graph).unwrap();
///
/// assert_eq!(centrality[a as usize], 0.0);
/// assert_eq!(centrality[b as usize], 0.5);
/// assert_eq!(centrality[c as usize], 0.5);
/// assert_eq!(centrality[d as usize], 0.0);
/// ```
pub fn betweenness_centrality(graph: &Graph) -> Result<Vec<f64>> {
    let slots = graph.slot_count();
    let mut centrality = vec![0.0; slots];
    let mut scratch = RoundScratch::new(slots);

    for source in graph.indices_ascending() {
        scratch.reset(source);
        let visit_order = forward_phase(graph, source, &mut scratch);
        backward_phase(graph, source, &mut scratch, visit_order, &mut centrality)?;
    }

    info!(vertices = graph.vertex_count(), "betweenness pass complete");

    Ok(centrality)
}

/// BFS from the source over successor edges, growing the shortest-path DAG.
///
/// For an edge `v → w` on a shortest path from the source (`w` one hop
/// further than `v`), `w` inherits `v`'s path count and records `v` as a
/// predecessor. Returns the vertices in order of visit; the FIFO queue
/// guarantees that order is by non-decreasing distance.
fn forward_phase(graph: &Graph, source: GraphIndex, scratch: &mut RoundScratch) -> Vec<GraphIndex> {
    let mut queue = VecDeque::new();
    let mut visit_order = Vec::new();

    queue.push_back(source);

    while let Some(v) = queue.pop_front() {
        visit_order.push(v);

        // All shortest paths to v are known once v leaves the queue.
        let v_distance = scratch.distance[v as usize];
        let v_sigma = scratch.sigma[v as usize];

        for &w in graph.vertex(v).successors() {
            let wi = w as usize;

            // Seen for the first time?
            if scratch.distance[wi] < 0 {
                scratch.distance[wi] = v_distance + 1;
                queue.push_back(w);
            }

            // On a shortest path to w via v?
            if scratch.distance[wi] == v_distance + 1 {
                scratch.sigma[wi] += v_sigma;
                scratch.predecessors[wi].push(v);
            }
        }
    }

    visit_order
}

/// Drains the visit order as a stack, so vertices are processed in
/// non-increasing distance from the source, and back-propagates dependencies
/// along the shortest-path DAG into the persistent centrality scores.
fn backward_phase(
    graph: &Graph,
    source: GraphIndex,
    scratch: &mut RoundScratch,
    mut visit_order: Vec<GraphIndex>,
    centrality: &mut [f64],
) -> Result<()> {
    while let Some(w) = visit_order.pop() {
        let wi = w as usize;
        let w_sigma = scratch.sigma[wi];
        let w_delta = scratch.delta[wi];

        for v in std::mem::take(&mut scratch.predecessors[wi]) {
            let vi = v as usize;
            let accumulated = scratch.delta[vi] + (scratch.sigma[vi] / w_sigma) * (1.0 + w_delta);

            // Did something go _terribly_, numerically wrong?
            if !accumulated.is_finite() {
                return Err(Error::NumericInvariant {
                    vertex: graph.vertex(w).id().clone(),
                    predecessor: graph.vertex(v).id().clone(),
                    sigma_pred: scratch.sigma[vi],
                    sigma: w_sigma,
                    delta: w_delta,
                });
            }

            scratch.delta[vi] = accumulated;
        }

        if w != source {
            centrality[wi] += scratch.delta[wi];
        }
    }

    Ok(())
}
