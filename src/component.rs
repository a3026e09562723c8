//! Connected-component extraction over signature graphs.
//!
//! Two strategies are provided: a working-set consuming search for the
//! largest forward-connected component ([`LargestComponentSearch`]), and a
//! low-link decomposition into strongly connected components
//! ([`strongly_connected_components`]). The largest strongly connected
//! component is the "strong set" the distance metrics are measured against;
//! [`reverse_reachable`] then answers which keys can reach into it.

use std::collections::{BTreeMap, VecDeque};

use tracing::{debug, info};

use crate::{
    graph::{Graph, GraphIndex},
    key::KeyId,
};

/// Default size at which the largest-component search stops early.
pub const DEFAULT_EARLY_STOP: usize = 100_000;

/// Tuning for [`LargestComponentSearch`].
#[derive(Clone, Copy, Debug)]
pub struct ComponentSearchConfig {
    /// Stop searching once a component of at least this size has been found.
    /// The result is then the best component seen so far, not necessarily the
    /// global maximum.
    pub early_stop: usize,
}

impl Default for ComponentSearchConfig {
    fn default() -> Self {
        Self {
            early_stop: DEFAULT_EARLY_STOP,
        }
    }
}

/// A set of vertices with a representative id.
///
/// For the largest-component search the representative is the root that
/// discovered the component; for a strongly connected component it is the
/// vertex that closed the low-link cycle.
#[derive(Clone, Debug)]
pub struct Component {
    representative: KeyId,
    members: Vec<GraphIndex>,
}

impl Component {
    /// Returns the representative id.
    pub fn representative(&self) -> &KeyId {
        &self.representative
    }

    /// Returns the member vertices.
    pub fn members(&self) -> &[GraphIndex] {
        &self.members
    }

    /// Returns the component size.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns whether the component has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// A one-shot search for the largest component reachable over forward edges.
///
/// The search consumes its own working set, not the graph it was created
/// from: each round picks the smallest remaining id as the root, collects
/// everything reachable from it via successor edges, and drops the visited
/// vertices from the working set. Once run, the search is spent; the base
/// graph stays intact and queryable.
///
/// # Examples
///
/// ```
/// use strongset::{
///     component::{ComponentSearchConfig, LargestComponentSearch},
///     graph::Graph,
///     key::KeyId,
/// };
///
/// let mut graph = Graph::new();
/// let a = graph.insert(KeyId::from("a"));
/// let b = graph.insert(KeyId::from("b"));
/// graph.insert(KeyId::from("c"));
/// graph.add_edge(a, b);
///
/// let champion = LargestComponentSearch::new(&graph)
///     .run(&ComponentSearchConfig::default())
///     .unwrap();
///
/// assert_eq!(champion.len(), 2);
/// assert_eq!(champion.representative(), &KeyId::from("a"));
/// ```
pub struct LargestComponentSearch<'g> {
    graph: &'g Graph,
    /// Vertices not yet consumed, ordered by id so the next root is always
    /// the smallest remaining id.
    remaining: BTreeMap<KeyId, GraphIndex>,
    alive: Vec<bool>,
}

impl<'g> LargestComponentSearch<'g> {
    /// Prepares a search over the graph's full vertex set.
    pub fn new(graph: &'g Graph) -> Self {
        let remaining: BTreeMap<KeyId, GraphIndex> =
            graph.ids().map(|(id, index)| (id.clone(), index)).collect();

        let mut alive = vec![false; graph.slot_count()];
        for &index in remaining.values() {
            alive[index as usize] = true;
        }

        Self {
            graph,
            remaining,
            alive,
        }
    }

    /// Runs the search to exhaustion or until the early-stop size is reached,
    /// consuming the working set. Returns `None` for an empty graph.
    pub fn run(mut self, config: &ComponentSearchConfig) -> Option<Component> {
        let mut champion: Option<Component> = None;

        while !self.remaining.is_empty()
            && champion.as_ref().map_or(0, Component::len) < config.early_stop
        {
            let Some((root_id, root)) = self.remaining.pop_first() else {
                break;
            };
            self.alive[root as usize] = false;

            let members = self.consume_from(root);
            debug!(root = %root_id, size = members.len(), "component consumed");

            if members.len() > champion.as_ref().map_or(0, Component::len) {
                champion = Some(Component {
                    representative: root_id,
                    members,
                });
            }
        }

        if let Some(champion) = &champion {
            info!(
                root = %champion.representative,
                size = champion.len(),
                "largest component found"
            );
        }

        champion
    }

    /// Collects every remaining vertex reachable from `root` over successor
    /// edges, dropping the visited set from the working set.
    fn consume_from(&mut self, root: GraphIndex) -> Vec<GraphIndex> {
        let mut members = Vec::new();
        let mut queue = VecDeque::new();
        queue.push_back(root);

        while let Some(v) = queue.pop_front() {
            members.push(v);
            for &w in self.graph.vertex(v).successors() {
                if self.alive[w as usize] {
                    self.alive[w as usize] = false;
                    self.remaining.remove(self.graph.vertex(w).id());
                    queue.push_back(w);
                }
            }
        }

        members
    }
}

/// The strongly-connected-component structure of a graph.
///
/// Every vertex belongs to exactly one component, identified by its
/// representative's index; the decomposition also remembers the largest
/// component found (the strong set).
#[derive(Clone, Debug)]
pub struct SccDecomposition {
    /// Representative index per dense vertex slot.
    assignment: Vec<GraphIndex>,
    /// `(representative, size)` per component, in completion order.
    components: Vec<(GraphIndex, usize)>,
    /// The largest component, if the graph was non-empty.
    strongest: Option<(GraphIndex, usize)>,
}

impl SccDecomposition {
    /// Returns the representative of the component containing `vertex`.
    pub fn representative(&self, vertex: GraphIndex) -> GraphIndex {
        self.assignment[vertex as usize]
    }

    /// Returns `(representative, size)` for every component.
    pub fn components(&self) -> &[(GraphIndex, usize)] {
        &self.components
    }

    /// Returns the strong set's `(representative, size)`, if any.
    pub fn strong_set(&self) -> Option<(GraphIndex, usize)> {
        self.strongest
    }

    /// Returns the strong set's size, zero for an empty graph.
    pub fn strong_size(&self) -> usize {
        self.strongest.map_or(0, |(_, size)| size)
    }

    /// Returns whether `vertex` belongs to the strong set.
    pub fn in_strong_set(&self, vertex: GraphIndex) -> bool {
        match self.strongest {
            Some((representative, _)) => self.assignment[vertex as usize] == representative,
            None => false,
        }
    }

    /// Iterates over the strong set's members in slot order.
    pub fn strong_members(&self) -> impl Iterator<Item = GraphIndex> + '_ {
        (0..self.assignment.len() as GraphIndex).filter(|&v| self.in_strong_set(v))
    }
}

/// Decomposes the graph into strongly connected components.
///
/// Discovery-time/low-link search over forward edges, with an explicit frame
/// stack so the recursion depth does not track the graph's depth. A vertex
/// whose low-link closes at its own discovery number pops the vertex stack
/// down to itself; the popped set is one component and the closing vertex its
/// representative.
pub fn strongly_connected_components(graph: &Graph) -> SccDecomposition {
    let slots = graph.slot_count();

    let mut dfsnum = vec![0u32; slots];
    let mut lownum = vec![0u32; slots];
    let mut completed = vec![false; slots];
    let mut last_dfsnum = 0u32;

    let mut stack: Vec<GraphIndex> = Vec::new();
    // (vertex, next successor offset) frames for the explicit DFS.
    let mut frames: Vec<(GraphIndex, usize)> = Vec::new();

    let mut assignment: Vec<GraphIndex> = (0..slots as GraphIndex).collect();
    let mut components: Vec<(GraphIndex, usize)> = Vec::new();
    let mut strongest: Option<(GraphIndex, usize)> = None;

    for root in graph.indices_ascending() {
        if dfsnum[root as usize] != 0 {
            continue;
        }

        last_dfsnum += 1;
        dfsnum[root as usize] = last_dfsnum;
        lownum[root as usize] = last_dfsnum;
        stack.push(root);
        frames.push((root, 0));

        while let Some(frame) = frames.last_mut() {
            let v = frame.0;
            let successors = graph.vertex(v).successors();

            if frame.1 < successors.len() {
                let w = successors[frame.1];
                frame.1 += 1;
                let wi = w as usize;

                if completed[wi] {
                    continue;
                }

                if dfsnum[wi] == 0 {
                    last_dfsnum += 1;
                    dfsnum[wi] = last_dfsnum;
                    lownum[wi] = last_dfsnum;
                    stack.push(w);
                    frames.push((w, 0));
                } else if dfsnum[wi] < lownum[v as usize] {
                    lownum[v as usize] = dfsnum[wi];
                }
                continue;
            }

            frames.pop();
            if let Some(parent) = frames.last() {
                let p = parent.0 as usize;
                if lownum[v as usize] < lownum[p] {
                    lownum[p] = lownum[v as usize];
                }
            }

            if lownum[v as usize] == dfsnum[v as usize] {
                let mut size = 0;
                loop {
                    // Safety: v is still on the stack, the loop must terminate.
                    let w = stack.pop().unwrap();
                    completed[w as usize] = true;
                    assignment[w as usize] = v;
                    size += 1;
                    if w == v {
                        break;
                    }
                }
                components.push((v, size));

                if strongest.map_or(0, |(_, max)| max) < size {
                    strongest = Some((v, size));
                }
            }
        }
    }

    if let Some((representative, size)) = strongest {
        info!(
            representative = %graph.vertex(representative).id(),
            size,
            components = components.len(),
            "strong set identified"
        );
    }

    SccDecomposition {
        assignment,
        components,
        strongest,
    }
}

/// The set of vertices with a forward path into a reference vertex.
#[derive(Clone, Debug)]
pub struct ReachableSet {
    mask: Vec<bool>,
    count: usize,
}

impl ReachableSet {
    /// Returns whether `vertex` can reach the reference vertex.
    pub fn contains(&self, vertex: GraphIndex) -> bool {
        self.mask[vertex as usize]
    }

    /// Returns the number of reachable vertices, the reference included.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Collects every vertex that can reach `into` over forward edges, by
/// depth-first search over predecessor edges. `into` itself is a member.
pub fn reverse_reachable(graph: &Graph, into: GraphIndex) -> ReachableSet {
    let mut mask = vec![false; graph.slot_count()];
    let mut count = 0;

    let mut stack = vec![into];
    mask[into as usize] = true;

    while let Some(v) = stack.pop() {
        count += 1;
        for &u in graph.vertex(v).predecessors() {
            if !mask[u as usize] {
                mask[u as usize] = true;
                stack.push(u);
            }
        }
    }

    ReachableSet { mask, count }
}
