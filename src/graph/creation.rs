// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for creating [`Graph`] instances and for adding and removing nodes
//! and branches.

use tracing::trace;

use crate::{Error, HasFromTo, HasThreeTerminals, Id};

use super::{Graph, GraphEngine};

/// `Graph` instantiation and mutation.
impl<G: GraphEngine> Graph<G> {
    /// Creates an empty graph.
    pub fn new(active_only: bool) -> Self {
        Self {
            engine: G::default(),
            active_only,
        }
    }

    /// Creates a graph from the given nodes and branches.
    ///
    /// Nodes are added first, then the two-terminal branches, then the edges
    /// of the three-terminal branches.  With `active_only`, open branches are
    /// skipped.
    ///
    /// Returns an error if a node is duplicated or a branch refers to a
    /// missing node.
    pub fn from_arrays<B, T>(
        nodes: impl IntoIterator<Item = Id>,
        branches: impl IntoIterator<Item = B>,
        branch3s: impl IntoIterator<Item = T>,
        active_only: bool,
    ) -> Result<Self, Error>
    where
        B: HasFromTo,
        T: HasThreeTerminals,
    {
        let mut graph = Self::new(active_only);
        for node in nodes {
            graph.add_node(node)?;
        }
        for branch in branches {
            graph.add_branch_record(&branch)?;
        }
        for branch3 in branch3s {
            graph.add_branch3(&branch3)?;
        }
        Ok(graph)
    }

    /// Returns true if the branch belongs in this graph.
    pub fn is_relevant(&self, branch: &impl HasFromTo) -> bool {
        !self.active_only || branch.is_closed()
    }

    /// Adds a node.  Returns an error if it exists already.
    pub fn add_node(&mut self, node: Id) -> Result<(), Error> {
        if self.has_node(node) {
            return Err(Error::invalid_graph(format!("Node {node} already exists.")));
        }
        self.engine.add_node(node);
        trace!(node, active_only = self.active_only, "added node");
        Ok(())
    }

    /// Deletes a node and all its branches.
    ///
    /// A missing node is an error unless `raise_on_fail` is false.
    pub fn delete_node(&mut self, node: Id, raise_on_fail: bool) -> Result<(), Error> {
        match self.engine.try_external_to_internal(node) {
            Some(internal) => {
                self.engine.remove_node(internal);
                trace!(node, active_only = self.active_only, "deleted node");
                Ok(())
            }
            None if raise_on_fail => Err(Error::missing_entity(format!(
                "Node {node} does not exist."
            ))),
            None => Ok(()),
        }
    }

    /// Adds a branch between two nodes.  Parallel branches are kept.
    pub fn add_branch(&mut self, from_node: Id, to_node: Id) -> Result<(), Error> {
        let from = self.external_to_internal(from_node)?;
        let to = self.external_to_internal(to_node)?;
        self.engine.add_edge(from, to);
        Ok(())
    }

    /// Deletes one branch between two nodes, in either direction.
    ///
    /// A missing branch, or a missing node, is an error unless
    /// `raise_on_fail` is false.
    pub fn delete_branch(&mut self, from_node: Id, to_node: Id, raise_on_fail: bool) -> Result<(), Error> {
        let removed = match (
            self.engine.try_external_to_internal(from_node),
            self.engine.try_external_to_internal(to_node),
        ) {
            (Some(from), Some(to)) => self.engine.remove_edge(from, to),
            _ => false,
        };
        if !removed && raise_on_fail {
            return Err(Error::missing_entity(format!(
                "Branch between nodes {from_node} and {to_node} does not exist."
            )));
        }
        Ok(())
    }

    /// Adds the branch if it belongs in this graph.
    pub fn add_branch_record(&mut self, branch: &impl HasFromTo) -> Result<(), Error> {
        if self.is_relevant(branch) {
            self.add_branch(branch.from_node(), branch.to_node())?;
        }
        Ok(())
    }

    /// Deletes the branch if it belongs in this graph.
    pub fn delete_branch_record(&mut self, branch: &impl HasFromTo, raise_on_fail: bool) -> Result<(), Error> {
        if self.is_relevant(branch) {
            self.delete_branch(branch.from_node(), branch.to_node(), raise_on_fail)?;
        }
        Ok(())
    }

    /// Adds the edges of a three-terminal branch that belong in this graph.
    pub fn add_branch3(&mut self, branch3: &impl HasThreeTerminals) -> Result<(), Error> {
        for branch in branch3.as_branches() {
            self.add_branch_record(&branch)?;
        }
        Ok(())
    }

    /// Deletes the edges of a three-terminal branch that belong in this graph.
    pub fn delete_branch3(&mut self, branch3: &impl HasThreeTerminals, raise_on_fail: bool) -> Result<(), Error> {
        for branch in branch3.as_branches() {
            self.delete_branch_record(&branch, raise_on_fail)?;
        }
        Ok(())
    }
}
