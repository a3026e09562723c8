//! Single-source distance statistics against the strong set.

use std::collections::VecDeque;

use crate::{
    component::SccDecomposition,
    graph::{Graph, GraphIndex},
};

/// Default hop bound for the histogram.
pub const DEFAULT_MAX_HOPS: usize = 30;

/// Default distance assigned to vertices the BFS never reaches. Large enough
/// that any real hop count sorts below it.
pub const DEFAULT_UNREACHABLE_DISTANCE: u32 = 1 << 30;

/// Tuning for the distance statistics.
#[derive(Clone, Copy, Debug)]
pub struct DistanceConfig {
    /// Hop bound: the histogram has one bucket per hop count below the bound
    /// plus a final bucket that absorbs everything at or above it.
    pub max_hops: usize,
    /// Sentinel distance for unreached vertices. Unreached members of the
    /// strong set contribute this value to the mean, saturating it rather
    /// than being skipped.
    pub unreachable_distance: u32,
}

impl Default for DistanceConfig {
    fn default() -> Self {
        Self {
            max_hops: DEFAULT_MAX_HOPS,
            unreachable_distance: DEFAULT_UNREACHABLE_DISTANCE,
        }
    }
}

/// Distance statistics for a single source vertex.
#[derive(Clone, Debug, PartialEq)]
pub struct DistanceReport {
    /// Mean distance from the source to the strong set:
    /// the distances to all members summed, divided by set size minus one.
    pub mean: f64,
    /// Strong-set members per hop count; the last bucket holds everything at
    /// or above the hop bound.
    pub histogram: Vec<u32>,
    /// Largest hop count observed, clipped to the hop bound.
    pub hop_high: u32,
    /// Strong-set members tied for the farthest raw distance.
    pub farthest: Vec<GraphIndex>,
}

/// Computes hop distances from `source` to every vertex, over successor
/// edges. Unreached vertices keep the `unreachable` sentinel.
pub fn distances(graph: &Graph, source: GraphIndex, unreachable: u32) -> Vec<u32> {
    let mut distance = vec![unreachable; graph.slot_count()];
    let mut queue = VecDeque::new();

    distance[source as usize] = 0;
    queue.push_back(source);

    while let Some(v) = queue.pop_front() {
        let next = distance[v as usize] + 1;
        for &w in graph.vertex(v).successors() {
            if next < distance[w as usize] {
                distance[w as usize] = next;
                queue.push_back(w);
            }
        }
    }

    distance
}

/// Computes the distance statistics for one source against the strong set.
///
/// The farthest set is rebuilt whenever a strictly larger distance is seen
/// and appended to on ties, so it ends up holding every member tied for the
/// maximum. A strong set smaller than two vertices yields an all-zero report
/// since no distances exist to average.
pub fn distance_report(
    graph: &Graph,
    source: GraphIndex,
    scc: &SccDecomposition,
    config: &DistanceConfig,
) -> DistanceReport {
    let mut histogram = vec![0u32; config.max_hops + 1];
    let mut farthest: Vec<GraphIndex> = Vec::new();
    let mut hop_high_raw = 0u32;
    let mut total = 0.0;

    let strong_size = scc.strong_size();
    if strong_size < 2 {
        return DistanceReport {
            mean: 0.0,
            histogram,
            hop_high: 0,
            farthest,
        };
    }

    let distance = distances(graph, source, config.unreachable_distance);

    for member in graph.indices_ascending() {
        if !scc.in_strong_set(member) {
            continue;
        }
        let d = distance[member as usize];

        total += f64::from(d);
        histogram[(d as usize).min(config.max_hops)] += 1;

        if d > hop_high_raw {
            hop_high_raw = d;
            farthest.clear();
        }
        if d == hop_high_raw {
            farthest.push(member);
        }
    }

    DistanceReport {
        mean: total / (strong_size - 1) as f64,
        histogram,
        hop_high: hop_high_raw.min(config.max_hops as u32),
        farthest,
    }
}
