//! Multi-threaded distance-statistics pass over the reachable vertex set.
//!
//! A fixed pool of worker threads splits the reachable vertices by dense
//! index modulo the worker count; per-vertex cost is roughly uniform, so no
//! work stealing is needed. Each worker computes its partition's distance
//! statistics with no shared mutable state, then merges under one of two
//! locks: one for the running global mean and its record stream, one for the
//! strong-set membership side channel. The computation itself never holds a
//! lock.

use std::{
    io::Write,
    sync::Mutex,
    thread,
};

use tracing::{debug, info};

use crate::{
    component::{ReachableSet, SccDecomposition},
    distance::{self, DistanceConfig},
    error::Result,
    graph::{Graph, GraphIndex},
    report::{self, KeyRecord, RecordSchema},
};

pub const MIN_WORKERS: usize = 1;
pub const MAX_WORKERS: usize = 128;
/// The reference pool size.
pub const DEFAULT_WORKERS: usize = 2;

/// Tuning for the distance pass.
#[derive(Clone, Debug)]
pub struct ComputeConfig {
    /// Worker count, clamped to `MIN_WORKERS..=MAX_WORKERS`.
    pub workers: usize,
    /// Schema for the per-key record stream.
    pub schema: RecordSchema,
    pub distance: DistanceConfig,
}

impl Default for ComputeConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            schema: RecordSchema::Delimited,
            distance: DistanceConfig::default(),
        }
    }
}

/// Aggregate results of a completed distance pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConnectivitySummary {
    /// Number of keys that can reach the strong set.
    pub reachable: usize,
    /// Strong set size.
    pub strong_size: usize,
    /// Mean of all per-key mean distances.
    pub global_mean: f64,
}

/// The mean accumulator and the record stream it feeds share one critical
/// section; the strong-set side channel has its own. Keeping the two locks
/// separate avoids serializing unrelated writes.
struct MeanChannel<M> {
    total: f64,
    out: M,
}

struct WorkerContext<'a, M, S> {
    graph: &'a Graph,
    scc: &'a SccDecomposition,
    reachable: &'a ReachableSet,
    mean: &'a Mutex<MeanChannel<M>>,
    strong: &'a Mutex<S>,
    config: &'a ComputeConfig,
}

/// Runs the distance pass over every reachable vertex.
///
/// Writes one record per reachable key to `records_out` and the strong set's
/// membership in dump format to `strong_out`, then returns the aggregate
/// summary once every worker has finished. Record lines belonging to
/// different keys may interleave in any order.
///
/// A failed worker fails the whole pass; partitions are never silently
/// dropped.
pub fn connectivity_pass<M, S>(
    graph: &Graph,
    scc: &SccDecomposition,
    reachable: &ReachableSet,
    records_out: M,
    strong_out: S,
    config: &ComputeConfig,
) -> Result<ConnectivitySummary>
where
    M: Write + Send,
    S: Write + Send,
{
    let workers = config.workers.clamp(MIN_WORKERS, MAX_WORKERS);
    info!(workers, reachable = reachable.len(), "distance pass starting");

    let mean = Mutex::new(MeanChannel {
        total: 0.0,
        out: records_out,
    });
    let strong = Mutex::new(strong_out);

    let context = WorkerContext {
        graph,
        scc,
        reachable,
        mean: &mean,
        strong: &strong,
        config,
    };

    thread::scope(|scope| {
        let mut handles = Vec::with_capacity(workers);
        for worker in 0..workers {
            let context = &context;
            handles.push(scope.spawn(move || worker_task(context, worker, workers)));
        }

        for handle in handles {
            handle
                .join()
                .unwrap_or_else(|panic| std::panic::resume_unwind(panic))?;
        }

        Ok::<(), crate::error::Error>(())
    })?;

    // The workers are done; the locks are free again.
    let mut mean = mean
        .into_inner()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    mean.out.flush()?;
    let mut strong = strong
        .into_inner()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    strong.flush()?;

    let global_mean = if reachable.is_empty() {
        0.0
    } else {
        mean.total / reachable.len() as f64
    };

    info!(global_mean, "distance pass complete");

    Ok(ConnectivitySummary {
        reachable: reachable.len(),
        strong_size: scc.strong_size(),
        global_mean,
    })
}

/// One worker: walk the partition, compute each key's statistics without any
/// lock held, then take the relevant channel lock just long enough to append.
fn worker_task<M: Write, S: Write>(
    context: &WorkerContext<'_, M, S>,
    worker: usize,
    workers: usize,
) -> Result<()> {
    let mut processed = 0usize;

    for v in context.graph.indices_ascending() {
        if v as usize % workers != worker || !context.reachable.contains(v) {
            continue;
        }
        processed += 1;

        let report =
            distance::distance_report(context.graph, v, context.scc, &context.config.distance);
        let stats = key_stats(context.graph, context.scc, v);

        if stats.in_strong_set {
            let mut out = context
                .strong
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            report::write_strong_member(&mut *out, context.graph, context.scc, v)?;
        }

        let record = KeyRecord {
            id: context.graph.vertex(v).id(),
            mean: report.mean,
            in_degree: stats.in_degree,
            out_degree: stats.out_degree,
            cross_degree: stats.cross_degree,
            in_degree_strong: stats.in_degree_strong,
            out_degree_strong: stats.out_degree_strong,
            cross_degree_strong: stats.cross_degree_strong,
            hop_high: report.hop_high,
            in_strong_set: stats.in_strong_set,
        };

        let mut channel = context
            .mean
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        channel.total += report.mean;
        report::write_record(&mut channel.out, context.config.schema, &record)?;
    }

    debug!(worker, processed, "worker partition drained");

    Ok(())
}

/// Degree statistics for one key.
struct KeyStats {
    in_degree: usize,
    out_degree: usize,
    cross_degree: usize,
    in_degree_strong: usize,
    out_degree_strong: usize,
    cross_degree_strong: usize,
    in_strong_set: bool,
}

fn key_stats(graph: &Graph, scc: &SccDecomposition, v: GraphIndex) -> KeyStats {
    let vertex = graph.vertex(v);

    let mut cross_degree = 0;
    let mut cross_degree_strong = 0;
    for &signer in vertex.predecessors() {
        if vertex.successors().contains(&signer) {
            cross_degree += 1;
            if scc.in_strong_set(signer) {
                cross_degree_strong += 1;
            }
        }
    }

    let in_degree_strong = vertex
        .predecessors()
        .iter()
        .filter(|&&signer| scc.in_strong_set(signer))
        .count();
    let out_degree_strong = vertex
        .successors()
        .iter()
        .filter(|&&signee| scc.in_strong_set(signee))
        .count();

    KeyStats {
        in_degree: vertex.in_degree(),
        out_degree: vertex.out_degree(),
        cross_degree,
        in_degree_strong,
        out_degree_strong,
        cross_degree_strong,
        in_strong_set: scc.in_strong_set(v),
    }
}
