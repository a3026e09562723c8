//! A module for working with signature graphs.

use std::collections::BTreeMap;

use crate::key::KeyId;

/// Dense index of a vertex within a [`Graph`].
///
/// Indices are assigned in insertion order and stay valid for the lifetime of
/// the graph, which lets the analysis passes keep their per-vertex state in
/// plain vectors instead of keyed maps.
pub type GraphIndex = u32;

/// A key and its signature relations.
#[derive(Clone, Debug)]
pub struct Vertex {
    id: KeyId,
    successors: Vec<GraphIndex>,
    predecessors: Vec<GraphIndex>,
}

impl Vertex {
    /// Returns the vertex identifier.
    pub fn id(&self) -> &KeyId {
        &self.id
    }

    /// Vertices this vertex has an edge to.
    pub fn successors(&self) -> &[GraphIndex] {
        &self.successors
    }

    /// Vertices with an edge to this vertex.
    pub fn predecessors(&self) -> &[GraphIndex] {
        &self.predecessors
    }

    /// Number of outgoing edges.
    pub fn out_degree(&self) -> usize {
        self.successors.len()
    }

    /// Number of incoming edges.
    pub fn in_degree(&self) -> usize {
        self.predecessors.len()
    }
}

/// A directed graph of keys, edges running signer → signee.
///
/// The graph is built once during ingestion and analysed afterwards; there is
/// no update path beyond [`insert`](Graph::insert), [`add_edge`](Graph::add_edge)
/// and the editing utility [`remove`](Graph::remove).
///
/// The use of a `BTreeMap` for the id index keeps iteration in ascending id
/// order between runs, which makes the sorted outputs deterministic.
#[derive(Clone, Debug, Default)]
pub struct Graph {
    /// A mapping of ids to dense vertex indices, ordered by id bytes.
    index: BTreeMap<KeyId, GraphIndex>,
    /// Vertex storage, addressed by [`GraphIndex`].
    vertices: Vec<Vertex>,
}

impl Graph {
    /// Creates an empty graph.
    ///
    /// # Examples
    ///
    /// ```
    /// use strongset::graph::Graph;
    ///
    /// let graph = Graph::new();
    /// assert_eq!(graph.vertex_count(), 0);
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a key, returning its index.
    ///
    /// Insertion is idempotent: a known id returns the existing vertex.
    ///
    /// # Examples
    ///
    /// ```
    /// use strongset::{graph::Graph, key::KeyId};
    ///
    /// let mut graph = Graph::new();
    /// let a = graph.insert(KeyId::from("a"));
    ///
    /// assert_eq!(graph.insert(KeyId::from("a")), a);
    /// assert_eq!(graph.vertex_count(), 1);
    /// ```
    pub fn insert(&mut self, id: KeyId) -> GraphIndex {
        if let Some(&index) = self.index.get(&id) {
            return index;
        }

        let index = self.vertices.len() as GraphIndex;
        self.vertices.push(Vertex {
            id: id.clone(),
            successors: Vec::new(),
            predecessors: Vec::new(),
        });
        self.index.insert(id, index);

        index
    }

    /// Records a signature edge from `signer` onto `signee`.
    ///
    /// Adds `signee` to the signer's successors and `signer` to the signee's
    /// predecessors, each side deduplicated by a linear scan of the existing
    /// list. Edges are only ever added during ingestion, so the scan is not on
    /// a hot path. Self-edges are never created.
    ///
    /// Returns whether either adjacency list grew.
    ///
    /// # Examples
    ///
    /// ```
    /// use strongset::{graph::Graph, key::KeyId};
    ///
    /// let mut graph = Graph::new();
    /// let a = graph.insert(KeyId::from("a"));
    /// let b = graph.insert(KeyId::from("b"));
    ///
    /// assert!(graph.add_edge(a, b));
    /// assert!(!graph.add_edge(a, b));
    /// ```
    pub fn add_edge(&mut self, signer: GraphIndex, signee: GraphIndex) -> bool {
        if signer == signee {
            return false;
        }

        let mut grew = false;

        let successors = &mut self.vertices[signer as usize].successors;
        if !successors.contains(&signee) {
            successors.push(signee);
            grew = true;
        }

        let predecessors = &mut self.vertices[signee as usize].predecessors;
        if !predecessors.contains(&signer) {
            predecessors.push(signer);
            grew = true;
        }

        grew
    }

    /// Looks up a vertex index by id.
    pub fn get(&self, id: &KeyId) -> Option<GraphIndex> {
        self.index.get(id).copied()
    }

    /// Returns the vertex at `index`.
    pub fn vertex(&self, index: GraphIndex) -> &Vertex {
        &self.vertices[index as usize]
    }

    /// Returns the number of keys in the graph.
    pub fn vertex_count(&self) -> usize {
        self.index.len()
    }

    /// Returns whether the graph has no keys.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Returns the number of signature edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.index
            .values()
            .map(|&index| self.vertices[index as usize].successors.len())
            .sum()
    }

    /// Number of dense vertex slots, including slots detached by
    /// [`remove`](Graph::remove). Analysis passes size their per-vertex tables
    /// with this.
    pub fn slot_count(&self) -> usize {
        self.vertices.len()
    }

    /// Iterates over `(id, index)` pairs in ascending id order.
    pub fn ids(&self) -> impl Iterator<Item = (&KeyId, GraphIndex)> {
        self.index.iter().map(|(id, &index)| (id, index))
    }

    /// Iterates over vertex indices in ascending id order.
    pub fn indices_ascending(&self) -> impl Iterator<Item = GraphIndex> + '_ {
        self.index.values().copied()
    }

    /// Excises a vertex: removes it from every other vertex's adjacency lists
    /// and from the id index. The dense slot is detached, not reused.
    ///
    /// This is a graph-editing utility, O(vertices × average degree); none of
    /// the analysis passes call it.
    ///
    /// Returns whether the vertex was present.
    pub fn remove(&mut self, target: GraphIndex) -> bool {
        let id = match self.vertices.get(target as usize) {
            Some(vertex) => vertex.id.clone(),
            None => return false,
        };
        if self.index.remove(&id).is_none() {
            return false;
        }

        for vertex in &mut self.vertices {
            vertex.successors.retain(|&w| w != target);
            vertex.predecessors.retain(|&w| w != target);
        }

        let detached = &mut self.vertices[target as usize];
        detached.successors.clear();
        detached.predecessors.clear();

        true
    }

    /// Builds a new graph restricted to `members`, keeping only the edges
    /// whose endpoints are both members. Ids are preserved; indices are
    /// reassigned.
    pub fn subgraph(&self, members: &[GraphIndex]) -> Graph {
        let mut sub = Graph::new();

        let mut remap: Vec<Option<GraphIndex>> = vec![None; self.vertices.len()];
        for &member in members {
            remap[member as usize] = Some(sub.insert(self.vertices[member as usize].id.clone()));
        }

        for &member in members {
            // Safety: every member was remapped in the previous loop.
            let signer = remap[member as usize].unwrap();
            for &w in &self.vertices[member as usize].successors {
                if let Some(signee) = remap[w as usize] {
                    sub.add_edge(signer, signee);
                }
            }
        }

        sub
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(graph: &Graph) -> Vec<String> {
        graph.ids().map(|(id, _)| id.to_string()).collect()
    }

    #[test]
    fn insert_is_idempotent() {
        let mut graph = Graph::new();

        let a = graph.insert(KeyId::from("a"));
        let b = graph.insert(KeyId::from("b"));

        assert_ne!(a, b);
        assert_eq!(graph.insert(KeyId::from("a")), a);
        assert_eq!(graph.vertex_count(), 2);
    }

    #[test]
    fn add_edge_deduplicates() {
        let mut graph = Graph::new();
        let a = graph.insert(KeyId::from("a"));
        let b = graph.insert(KeyId::from("b"));

        assert!(graph.add_edge(a, b));
        let succ_len = graph.vertex(a).successors().len();
        let pred_len = graph.vertex(b).predecessors().len();

        // A second insertion of the same pair leaves both lists unchanged.
        assert!(!graph.add_edge(a, b));
        assert_eq!(graph.vertex(a).successors().len(), succ_len);
        assert_eq!(graph.vertex(b).predecessors().len(), pred_len);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn add_edge_rejects_self_edge() {
        let mut graph = Graph::new();
        let a = graph.insert(KeyId::from("a"));

        assert!(!graph.add_edge(a, a));
        assert_eq!(graph.vertex(a).out_degree(), 0);
        assert_eq!(graph.vertex(a).in_degree(), 0);
    }

    #[test]
    fn adjacency_runs_signer_to_signee() {
        let mut graph = Graph::new();
        let signer = graph.insert(KeyId::from("signer"));
        let signee = graph.insert(KeyId::from("signee"));

        graph.add_edge(signer, signee);

        assert_eq!(graph.vertex(signer).successors(), &[signee]);
        assert_eq!(graph.vertex(signee).predecessors(), &[signer]);
        assert_eq!(graph.vertex(signer).out_degree(), 1);
        assert_eq!(graph.vertex(signee).in_degree(), 1);
    }

    #[test]
    fn iteration_is_ascending_by_id() {
        let mut graph = Graph::new();
        graph.insert(KeyId::from("c"));
        graph.insert(KeyId::from("a"));
        graph.insert(KeyId::from("b"));

        assert_eq!(ids(&graph), ["a", "b", "c"]);
    }

    #[test]
    fn remove_excises_vertex() {
        let mut graph = Graph::new();
        let a = graph.insert(KeyId::from("a"));
        let b = graph.insert(KeyId::from("b"));
        let c = graph.insert(KeyId::from("c"));
        graph.add_edge(a, b);
        graph.add_edge(b, c);
        graph.add_edge(c, a);

        assert!(graph.remove(b));
        assert!(!graph.remove(b));

        assert_eq!(graph.get(&KeyId::from("b")), None);
        assert_eq!(graph.vertex_count(), 2);
        assert!(graph.vertex(a).successors().is_empty());
        assert_eq!(graph.vertex(c).successors(), &[a]);
        assert!(graph.vertex(c).predecessors().is_empty());
        // The slot stays allocated so indices keep their meaning.
        assert_eq!(graph.slot_count(), 3);
    }

    #[test]
    fn subgraph_restricts_edges_to_members() {
        let mut graph = Graph::new();
        let a = graph.insert(KeyId::from("a"));
        let b = graph.insert(KeyId::from("b"));
        let c = graph.insert(KeyId::from("c"));
        graph.add_edge(a, b);
        graph.add_edge(b, c);
        graph.add_edge(c, a);

        let sub = graph.subgraph(&[a, b]);

        assert_eq!(sub.vertex_count(), 2);
        assert_eq!(sub.edge_count(), 1);

        let sa = sub.get(&KeyId::from("a")).unwrap();
        let sb = sub.get(&KeyId::from("b")).unwrap();
        assert_eq!(sub.vertex(sa).successors(), &[sb]);
        assert!(sub.vertex(sb).successors().is_empty());
    }
}
