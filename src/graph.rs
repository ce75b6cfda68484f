// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! An undirected graph of grid nodes and the branches between them, addressed
//! by external entity ids.
//!
//! [`Graph`] holds the id translation and the query algorithms, and delegates
//! storage to a [`GraphEngine`].  The default engine, [`PetgraphEngine`], is
//! backed by `petgraph`.

mod container;
mod creation;
mod petgraph_engine;
mod retrieval;
mod traversal;

#[cfg(test)]
pub(crate) mod test_utils;

pub use container::GraphContainer;
pub use petgraph_engine::PetgraphEngine;

use crate::Id;

/**
The storage behind a [`Graph`].

Implementations hold an undirected multigraph whose nodes carry external ids,
and translate between those ids and their own compact internal indices.
Internal indices may be reused and shifted when nodes are removed; the
implementation must keep its translation up to date when that happens.

Parallel edges must be kept as separate edges.
*/
pub trait GraphEngine: Clone + Default + std::fmt::Debug {
    /// Returns the internal index of the node with the given external id.
    fn try_external_to_internal(&self, external: Id) -> Option<usize>;
    /// Returns the external id of the node at the given internal index.
    fn internal_to_external(&self, internal: usize) -> Option<Id>;
    /// Returns the number of nodes.
    fn node_count(&self) -> usize;
    /// Returns the number of edges, counting parallel edges separately.
    fn edge_count(&self) -> usize;
    /// Adds a node and returns its internal index.
    fn add_node(&mut self, external: Id) -> usize;
    /// Removes a node and its edges.
    fn remove_node(&mut self, internal: usize);
    /// Adds an edge, even if the nodes are already connected.
    fn add_edge(&mut self, a: usize, b: usize);
    /// Removes one edge between the nodes.  Returns false if there was none.
    fn remove_edge(&mut self, a: usize, b: usize) -> bool;
    /// Returns the neighbors of a node, once per edge.
    fn neighbors(&self, internal: usize) -> Vec<usize>;
    /// Returns the end points of every edge.
    fn edges(&self) -> Vec<(usize, usize)>;
    /// Returns every simple path between two different nodes.  Paths may
    /// repeat when nodes are connected by parallel edges.
    fn all_simple_paths(&self, from: usize, to: usize) -> Vec<Vec<usize>>;
}

/// A graph of grid nodes and branches.
///
/// With `active_only`, branches are added only while they are closed on all
/// sides.
#[derive(Clone, Debug, Default)]
pub struct Graph<G: GraphEngine = PetgraphEngine> {
    engine: G,
    active_only: bool,
}
