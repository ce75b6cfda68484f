// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The pair of graphs a grid keeps in sync with its stores.

use tracing::trace;

use crate::{Branch3Ends, BranchEnds, Error, HasStatus, Id};

use super::{Graph, GraphEngine, PetgraphEngine};

/// Holds an active graph, with only the closed branches, and a complete graph
/// with every branch, over the same set of nodes.
///
/// Every mutation goes to both graphs in the same call, except for status
/// changes, which only touch the active graph.
#[derive(Clone, Debug)]
pub struct GraphContainer<G: GraphEngine = PetgraphEngine> {
    active_graph: Graph<G>,
    complete_graph: Graph<G>,
}

impl<G: GraphEngine> Default for GraphContainer<G> {
    fn default() -> Self {
        Self {
            active_graph: Graph::new(true),
            complete_graph: Graph::new(false),
        }
    }
}

impl<G: GraphEngine> GraphContainer<G> {
    /// Builds both graphs from the given nodes and branches.
    pub fn from_arrays(
        nodes: &[Id],
        branches: &[BranchEnds],
        branch3s: &[Branch3Ends],
    ) -> Result<Self, Error> {
        Ok(Self {
            active_graph: Graph::from_arrays(
                nodes.iter().copied(),
                branches.iter().copied(),
                branch3s.iter().copied(),
                true,
            )?,
            complete_graph: Graph::from_arrays(
                nodes.iter().copied(),
                branches.iter().copied(),
                branch3s.iter().copied(),
                false,
            )?,
        })
    }

    pub fn active_graph(&self) -> &Graph<G> {
        &self.active_graph
    }

    pub fn complete_graph(&self) -> &Graph<G> {
        &self.complete_graph
    }

    /// Returns the active graph if `active_only`, and the complete graph
    /// otherwise.
    pub fn graph(&self, active_only: bool) -> &Graph<G> {
        if active_only {
            &self.active_graph
        } else {
            &self.complete_graph
        }
    }

    pub fn add_node(&mut self, node: Id) -> Result<(), Error> {
        self.complete_graph.add_node(node)?;
        self.active_graph.add_node(node)
    }

    /// Deletes a node and its branches from both graphs.
    pub fn delete_node(&mut self, node: Id) -> Result<(), Error> {
        self.complete_graph.delete_node(node, true)?;
        self.active_graph.delete_node(node, true)
    }

    pub fn add_branch(&mut self, branch: &BranchEnds) -> Result<(), Error> {
        self.complete_graph.add_branch_record(branch)?;
        self.active_graph.add_branch_record(branch)
    }

    pub fn delete_branch(&mut self, branch: &BranchEnds) -> Result<(), Error> {
        self.complete_graph.delete_branch_record(branch, true)?;
        self.active_graph.delete_branch_record(branch, false)
    }

    pub fn add_branch3(&mut self, branch3: &Branch3Ends) -> Result<(), Error> {
        self.complete_graph.add_branch3(branch3)?;
        self.active_graph.add_branch3(branch3)
    }

    pub fn delete_branch3(&mut self, branch3: &Branch3Ends) -> Result<(), Error> {
        self.complete_graph.delete_branch3(branch3, true)?;
        self.active_graph.delete_branch3(branch3, false)
    }

    /// Puts a branch into the active graph.  `before` is the branch as it was
    /// before its statuses were closed; a branch that was closed already is
    /// left alone.
    pub fn make_active(&mut self, before: &BranchEnds) -> Result<(), Error> {
        if !before.is_closed() {
            self.active_graph
                .add_branch(before.from_node, before.to_node)?;
            trace!(branch = before.id, "branch added to the active graph");
        }
        Ok(())
    }

    /// Takes a branch out of the active graph.  `before` is the branch as it
    /// was before one of its statuses was opened; a branch that was open
    /// already is left alone.
    pub fn make_inactive(&mut self, before: &BranchEnds) -> Result<(), Error> {
        if before.is_closed() {
            self.active_graph
                .delete_branch(before.from_node, before.to_node, true)?;
            trace!(branch = before.id, "branch removed from the active graph");
        }
        Ok(())
    }
}
