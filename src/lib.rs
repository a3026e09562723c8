//! Strongset is a small toolkit for analysing web-of-trust signature graphs:
//! keys are vertices, signatures are directed edges.
//!
//! Two families of metrics are computed over a [`Graph`](graph::Graph) built
//! from a keyring dump. [`betweenness`] scores every key by the number of
//! shortest trust paths running through it, and [`component`] extracts the
//! largest strongly connected component (the "strong set") so that
//! [`distance`] and [`compute`] can measure how far every key sits from it.
//!
//! # Basic usage
//!
//! The graph can be assembled by hand or read from a `p`/`s` keyring dump
//! with [`ingest::read_graph`]. Once constructed, the analysis passes borrow
//! it read-only.
//!
//! ```rust
//! use strongset::{betweenness, component, graph::Graph, key::KeyId};
//!
//! // Three keys signing in a ring: a → b → c → a.
//! let mut graph = Graph::new();
//! let a = graph.insert(KeyId::from("a"));
//! let b = graph.insert(KeyId::from("b"));
//! let c = graph.insert(KeyId::from("c"));
//! graph.insert(KeyId::from("a")); // idempotent
//! graph.add_edge(a, b);
//! graph.add_edge(b, c);
//! graph.add_edge(c, a);
//!
//! // The ring is one strongly connected component of size three.
//! let scc = component::strongly_connected_components(&graph);
//! assert_eq!(scc.strong_set().map(|(_, size)| size), Some(3));
//!
//! // Every key relays the shortest path between the other two.
//! let centrality = betweenness::betweenness_centrality(&graph).unwrap();
//! assert!(centrality.iter().all(|&score| score == 1.0));
//! ```

pub mod betweenness;
pub mod component;
pub mod compute;
pub mod distance;
pub mod error;
pub mod graph;
pub mod ingest;
pub mod key;
pub mod report;
