// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for retrieving nodes and branches from a [`Graph`].

use crate::{Error, Id};

use super::{Graph, GraphEngine};

/// Node and branch retrieval.
impl<G: GraphEngine> Graph<G> {
    /// Returns true if only closed branches are added to this graph.
    pub fn active_only(&self) -> bool {
        self.active_only
    }

    /// Returns the internal index of a node, if the node exists.
    pub fn try_external_to_internal(&self, node: Id) -> Option<usize> {
        self.engine.try_external_to_internal(node)
    }

    /// Returns the internal index of a node.
    pub fn external_to_internal(&self, node: Id) -> Result<usize, Error> {
        self.engine
            .try_external_to_internal(node)
            .ok_or_else(|| Error::missing_entity(format!("Node {node} does not exist.")))
    }

    pub(crate) fn internal_to_external(&self, internal: usize) -> Result<Id, Error> {
        self.engine
            .internal_to_external(internal)
            .ok_or_else(|| Error::internal(format!("No node at internal index {internal}.")))
    }

    pub(crate) fn internals_to_externals(&self, internals: &[usize]) -> Result<Vec<Id>, Error> {
        internals.iter().map(|i| self.internal_to_external(*i)).collect()
    }

    pub fn has_node(&self, node: Id) -> bool {
        self.engine.try_external_to_internal(node).is_some()
    }

    /// Returns true if the nodes are connected, in either direction.
    pub fn has_branch(&self, from_node: Id, to_node: Id) -> bool {
        match (
            self.engine.try_external_to_internal(from_node),
            self.engine.try_external_to_internal(to_node),
        ) {
            (Some(from), Some(to)) => self.engine.neighbors(from).contains(&to),
            _ => false,
        }
    }

    pub fn nr_nodes(&self) -> usize {
        self.engine.node_count()
    }

    /// Returns the number of branches, counting parallel branches separately.
    pub fn nr_branches(&self) -> usize {
        self.engine.edge_count()
    }

    /// Returns the ids of all nodes, in ascending order.
    pub fn external_ids(&self) -> Vec<Id> {
        let mut ids: Vec<Id> = (0..self.engine.node_count())
            .filter_map(|i| self.engine.internal_to_external(i))
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Returns the end points of every branch.
    pub fn all_branches(&self) -> Vec<(Id, Id)> {
        self.engine
            .edges()
            .into_iter()
            .filter_map(|(a, b)| {
                Some((
                    self.engine.internal_to_external(a)?,
                    self.engine.internal_to_external(b)?,
                ))
            })
            .collect()
    }

    /// Returns the branches touching a node, as `(node, neighbor)` pairs.
    pub fn in_branches(&self, node: Id) -> Result<Vec<(Id, Id)>, Error> {
        let internal = self.external_to_internal(node)?;
        self.engine
            .neighbors(internal)
            .into_iter()
            .map(|n| Ok((node, self.internal_to_external(n)?)))
            .collect()
    }

    /// Returns the distinct neighbors of a node, in ascending id order.
    pub fn neighbors(&self, node: Id) -> Result<Vec<Id>, Error> {
        let internal = self.external_to_internal(node)?;
        self.internals_to_externals(&self.sorted_neighbors(internal))
    }

    /// Returns the distinct neighbors of a node, ordered by external id.
    pub(crate) fn sorted_neighbors(&self, internal: usize) -> Vec<usize> {
        let mut neighbors: Vec<(Id, usize)> = self
            .engine
            .neighbors(internal)
            .into_iter()
            .filter_map(|n| Some((self.engine.internal_to_external(n)?, n)))
            .collect();
        neighbors.sort_unstable();
        neighbors.dedup();
        neighbors.into_iter().map(|(_, n)| n).collect()
    }
}
