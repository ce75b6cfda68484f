// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! A [`GraphEngine`] backed by a `petgraph` undirected graph.

use std::collections::HashMap;

use petgraph::graph::{NodeIndex, UnGraph};

use crate::Id;

use super::GraphEngine;

/// Nodes stored in an `UnGraph` instance can be addressed with `NodeIndex`es.
///
/// `NodeIndexMap` stores the corresponding `NodeIndex` for any external id, so
/// that nodes in the `UnGraph` can be retrieved from their ids.
pub(crate) type NodeIndexMap = HashMap<Id, NodeIndex>;

/// The default [`GraphEngine`].
#[derive(Clone, Debug, Default)]
pub struct PetgraphEngine {
    graph: UnGraph<Id, ()>,
    node_indices: NodeIndexMap,
}

impl GraphEngine for PetgraphEngine {
    fn try_external_to_internal(&self, external: Id) -> Option<usize> {
        self.node_indices.get(&external).map(|i| i.index())
    }

    fn internal_to_external(&self, internal: usize) -> Option<Id> {
        self.graph.node_weight(NodeIndex::new(internal)).copied()
    }

    fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    fn add_node(&mut self, external: Id) -> usize {
        let idx = self.graph.add_node(external);
        self.node_indices.insert(external, idx);
        idx.index()
    }

    fn remove_node(&mut self, internal: usize) {
        let idx = NodeIndex::new(internal);
        let Some(external) = self.graph.remove_node(idx) else {
            return;
        };
        self.node_indices.remove(&external);
        // `remove_node` moves the last node into the freed index.
        if let Some(moved) = self.graph.node_weight(idx) {
            self.node_indices.insert(*moved, idx);
        }
    }

    fn add_edge(&mut self, a: usize, b: usize) {
        self.graph.add_edge(NodeIndex::new(a), NodeIndex::new(b), ());
    }

    fn remove_edge(&mut self, a: usize, b: usize) -> bool {
        match self.graph.find_edge(NodeIndex::new(a), NodeIndex::new(b)) {
            Some(edge) => self.graph.remove_edge(edge).is_some(),
            None => false,
        }
    }

    fn neighbors(&self, internal: usize) -> Vec<usize> {
        self.graph
            .neighbors(NodeIndex::new(internal))
            .map(|n| n.index())
            .collect()
    }

    fn edges(&self) -> Vec<(usize, usize)> {
        self.graph
            .raw_edges()
            .iter()
            .map(|e| (e.source().index(), e.target().index()))
            .collect()
    }

    fn all_simple_paths(&self, from: usize, to: usize) -> Vec<Vec<usize>> {
        petgraph::algo::all_simple_paths::<Vec<NodeIndex>, _>(
            &self.graph,
            NodeIndex::new(from),
            NodeIndex::new(to),
            0,
            None,
        )
        .map(|path| path.into_iter().map(|n| n.index()).collect())
        .collect()
    }
}
