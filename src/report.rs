//! Rendering analysis results as report lines.
//!
//! All functions write plain text lines to a caller-supplied sink; file
//! naming and directory layout are left to the caller.

use std::{
    cmp::Ordering,
    collections::BTreeMap,
    io::{self, Write},
};

use itertools::Itertools;

use crate::{
    component::SccDecomposition,
    distance::DistanceReport,
    graph::{Graph, GraphIndex},
    key::KeyId,
};

/// Output schema for the per-key connectivity records.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordSchema {
    /// Fixed-width id and mean only.
    Legacy,
    /// Semicolon-separated record with the full degree statistics.
    Delimited,
}

/// One key's connectivity record.
#[derive(Clone, Debug)]
pub struct KeyRecord<'a> {
    pub id: &'a KeyId,
    /// Mean distance to the strong set.
    pub mean: f64,
    pub in_degree: usize,
    pub out_degree: usize,
    /// Keys signed both ways.
    pub cross_degree: usize,
    /// Degree counterparts restricted to strong-set members.
    pub in_degree_strong: usize,
    pub out_degree_strong: usize,
    pub cross_degree_strong: usize,
    pub hop_high: u32,
    pub in_strong_set: bool,
}

/// Writes one connectivity record in the configured schema.
pub fn write_record<W: Write>(
    out: &mut W,
    schema: RecordSchema,
    record: &KeyRecord<'_>,
) -> io::Result<()> {
    match schema {
        RecordSchema::Legacy => writeln!(out, "{} {:8.4}", record.id, record.mean),
        RecordSchema::Delimited => writeln!(
            out,
            "{};{:8.5};{};{};{};{};{};{};{};{}",
            record.id,
            record.mean,
            record.in_degree,
            record.out_degree,
            record.cross_degree,
            record.in_degree_strong,
            record.out_degree_strong,
            record.cross_degree_strong,
            record.hop_high,
            u8::from(record.in_strong_set),
        ),
    }
}

/// Centrality score usable as an ordered grouping key.
#[derive(Clone, Copy, Debug)]
struct ScoreKey(f64);

impl PartialEq for ScoreKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for ScoreKey {}

impl PartialOrd for ScoreKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScoreKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Writes the centrality ranking, one `<id>;<score>` line per vertex in
/// ascending score order.
///
/// Vertices sharing the exact same score are grouped into one bucket and
/// emitted together, in ascending id order within the bucket; no ordering is
/// promised between equal scores beyond that.
pub fn write_centrality_ranking<W: Write>(
    out: &mut W,
    graph: &Graph,
    scores: &[f64],
) -> io::Result<()> {
    let mut buckets: BTreeMap<ScoreKey, Vec<&KeyId>> = BTreeMap::new();
    for (id, index) in graph.ids() {
        buckets
            .entry(ScoreKey(scores[index as usize]))
            .or_default()
            .push(id);
    }

    for (score, ids) in &buckets {
        for id in ids {
            writeln!(out, "{};{:.9}", id, score.0)?;
        }
    }

    Ok(())
}

/// Re-emits a component's membership in the keyring dump format: a `p` line
/// per member in ascending id order, followed by an `s` line per signer.
pub fn write_component_dump<W: Write>(
    out: &mut W,
    graph: &Graph,
    members: &[GraphIndex],
) -> io::Result<()> {
    let ordered = members
        .iter()
        .sorted_by_key(|&&member| graph.vertex(member).id());

    for &member in ordered {
        let vertex = graph.vertex(member);
        writeln!(out, "p{}", vertex.id())?;
        for &signer in vertex.predecessors() {
            writeln!(out, "s{}", graph.vertex(signer).id())?;
        }
    }

    Ok(())
}

/// Writes one strong-set member in the dump format, keeping only signers that
/// are themselves in the strong set.
pub fn write_strong_member<W: Write>(
    out: &mut W,
    graph: &Graph,
    scc: &SccDecomposition,
    member: GraphIndex,
) -> io::Result<()> {
    let vertex = graph.vertex(member);
    writeln!(out, "p{}", vertex.id())?;
    for &signer in vertex.predecessors() {
        if scc.in_strong_set(signer) {
            writeln!(out, "s{}", graph.vertex(signer).id())?;
        }
    }

    Ok(())
}

/// Writes the component inventory: an `<id>;<representative>` line per vertex.
pub fn write_scc_membership<W: Write>(
    out: &mut W,
    graph: &Graph,
    scc: &SccDecomposition,
) -> io::Result<()> {
    for (id, index) in graph.ids() {
        let representative = graph.vertex(scc.representative(index)).id();
        writeln!(out, "{};{}", id, representative)?;
    }

    Ok(())
}

/// Writes one `<representative>;<size>` line per component.
pub fn write_scc_sizes<W: Write>(
    out: &mut W,
    graph: &Graph,
    scc: &SccDecomposition,
) -> io::Result<()> {
    for &(representative, size) in scc.components() {
        writeln!(out, "{};{}", graph.vertex(representative).id(), size)?;
    }

    Ok(())
}

/// Writes the per-key detail report: signer lists both ways, strong-set
/// membership, the hop breakout and the farthest keys.
pub fn write_key_detail<W: Write>(
    out: &mut W,
    graph: &Graph,
    scc: &SccDecomposition,
    key: GraphIndex,
    report: &DistanceReport,
) -> io::Result<()> {
    let vertex = graph.vertex(key);

    writeln!(out, "KeyID {}", vertex.id())?;
    writeln!(out)?;

    writeln!(out, "Signatures to this key:")?;
    for &signer in vertex.predecessors() {
        writeln!(out, "  {}", graph.vertex(signer).id())?;
    }
    writeln!(
        out,
        "Total: {} signatures to this id from this set",
        vertex.in_degree()
    )?;
    writeln!(out)?;

    writeln!(out, "Signatures from this key:")?;
    for &signee in vertex.successors() {
        writeln!(out, "  {}", graph.vertex(signee).id())?;
    }
    writeln!(
        out,
        "Total: {} signatures from this id to this set",
        vertex.out_degree()
    )?;
    writeln!(out)?;

    let membership = if scc.in_strong_set(key) { "" } else { "not " };
    writeln!(out, "This key is {}in the strong set.", membership)?;
    writeln!(out, "Mean distance to the strong set: {:8.5}", report.mean)?;
    writeln!(out)?;

    writeln!(out, "Breakout by hop count (only from strong set):")?;
    for (hops, count) in report.histogram.iter().enumerate() {
        if hops as u32 > report.hop_high {
            break;
        }
        writeln!(out, "{:2} hops: {:5}", hops, count)?;
    }

    if !report.farthest.is_empty() {
        writeln!(out)?;
        writeln!(out, "Farthest keys ({} hops):", report.hop_high)?;
        for &far in &report.farthest {
            writeln!(out, "  {}", graph.vertex(far).id())?;
        }
    }

    Ok(())
}

/// Writes the closing aggregate line.
pub fn write_summary<W: Write>(out: &mut W, global_mean: f64) -> io::Result<()> {
    writeln!(out, "Average mean is {:9.4}", global_mean)
}
