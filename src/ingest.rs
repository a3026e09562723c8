//! Reading keyring dump streams into a [`Graph`].
//!
//! The expected input is a sequence of lines:
//!
//! ```text
//! p<keyid>
//! s<keyid>
//! ...
//! ```
//!
//! where a `p` line introduces a public key and the `s` lines that follow it
//! name the keys that signed it. The stream is consumed in two passes: the
//! first collects every `p` key, the second attaches signatures, ignoring
//! those that have no matching `p` line.

use std::io::BufRead;

use tracing::info;

use crate::{
    error::{Error, Result},
    graph::{Graph, GraphIndex},
    key::KeyId,
};

/// Default identifier width, in hex characters.
pub const DEFAULT_ID_LEN: usize = 16;

#[derive(Clone, Copy, Debug)]
pub struct IngestConfig {
    /// Identifier width; lines shorter than `1 + id_len` are ignored, longer
    /// lines are truncated to it.
    pub id_len: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            id_len: DEFAULT_ID_LEN,
        }
    }
}

/// Tallies reported after ingestion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Distinct keys introduced by `p` lines.
    pub keys: usize,
    /// Signatures attached to a known key (self-signatures excluded).
    pub signatures: usize,
    /// Signatures naming a key with no `p` line, dropped.
    pub unknown_signers: usize,
}

/// Reads a dump stream into a graph.
///
/// Lines that start with neither `p` nor `s`, or that are shorter than the
/// configured id width, are skipped. A signature from an id with no matching
/// key is counted in [`IngestStats::unknown_signers`] and dropped. A key's
/// signature of itself never creates an edge.
///
/// # Errors
///
/// Fails with [`Error::Io`] if the stream can't be read and with
/// [`Error::SignatureBeforeKey`] if a signature line appears before the
/// first key line.
///
/// # Examples
///
/// ```
/// use strongset::ingest::{read_graph, IngestConfig};
///
/// let dump = "\
/// p0123456789ABCDEF
/// sFEDCBA9876543210
/// pFEDCBA9876543210
/// ";
///
/// let (graph, stats) = read_graph(dump.as_bytes(), &IngestConfig::default()).unwrap();
///
/// assert_eq!(stats.keys, 2);
/// assert_eq!(stats.signatures, 1);
/// assert_eq!(graph.edge_count(), 1);
/// ```
pub fn read_graph<R: BufRead>(reader: R, config: &IngestConfig) -> Result<(Graph, IngestStats)> {
    // Both passes need the stream; buffer the raw lines once. Ids are opaque
    // bytes, so no text decoding happens here.
    let lines: Vec<Vec<u8>> = reader
        .split(b'\n')
        .collect::<std::io::Result<_>>()?;

    let min_len = 1 + config.id_len;
    let mut graph = Graph::new();
    let mut stats = IngestStats::default();

    // First pass: keys only.
    for line in &lines {
        if line.len() >= min_len && line[0] == b'p' {
            graph.insert(KeyId::new(&line[1..min_len]));
        }
    }
    stats.keys = graph.vertex_count();

    // Second pass: signatures, now that every signer can be resolved.
    let mut current: Option<GraphIndex> = None;
    for (number, line) in lines.iter().enumerate() {
        if line.len() < min_len {
            continue;
        }
        let id = &line[1..min_len];

        match line[0] {
            b'p' => {
                current = Some(graph.insert(KeyId::new(id)));
            }
            b's' => {
                let signee = current.ok_or(Error::SignatureBeforeKey { line: number + 1 })?;
                // Ignore self-sigs.
                if graph.vertex(signee).id().as_bytes() == id {
                    continue;
                }
                match graph.get(&KeyId::new(id)) {
                    Some(signer) => {
                        graph.add_edge(signer, signee);
                        stats.signatures += 1;
                    }
                    None => stats.unknown_signers += 1,
                }
            }
            _ => {}
        }
    }

    info!(
        keys = stats.keys,
        signatures = stats.signatures,
        unknown_signers = stats.unknown_signers,
        "dump ingested"
    );

    Ok((graph, stats))
}
