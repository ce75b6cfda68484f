// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Orienting branches away from the sources, and assigning nodes and branches
//! to the feeders that supply them.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::entities::branch_ends;
use crate::store::{ColumnStore, Values};
use crate::{EntityKind, Error, GraphEngine, HasStatus, Id, EMPTY_ID};

use super::Grid;

/// Branch orientation.
impl<G: GraphEngine> Grid<G> {
    /**
    Returns the branches that point towards a source instead of away from it.

    Nodes are ranked by their breadth-first distance from the source in the
    active graph, and a closed branch is reversed when its from-node ranks
    below its to-node.  A branch that is open only on its from-side, with its
    to-node inside a source's network and its from-node outside it, is
    reversed too.

    Fails with an `InvalidGraph` error when a source's network holds another
    source, or a cycle through more than two nodes.
    */
    pub fn get_reversed_branches(&self) -> Result<ColumnStore, Error> {
        let branches = self.branches()?;
        let ends = branch_ends(&branches)?;
        let sources = self.store(&EntityKind::Source)?;
        let source_ids = sources.ids()?;
        let source_nodes = sources.i32s("node")?;

        let active = self.graphs.active_graph();
        let cycles: Vec<Vec<Id>> = active
            .find_fundamental_cycles()?
            .into_iter()
            .filter(|cycle| cycle.len() > 3)
            .collect();

        let mut reversed = Vec::new();
        for (i, source_node) in source_nodes.iter().enumerate() {
            let order = active.get_connected(*source_node, &[], true)?;
            let members: HashSet<Id> = order.iter().copied().collect();

            let connected = source_nodes
                .iter()
                .enumerate()
                .any(|(j, node)| j != i && members.contains(node));
            if connected {
                return Err(Error::invalid_graph(format!(
                    "Can't orient branches: source {} is connected to other sources.",
                    source_ids[i]
                )));
            }
            if let Some(cycle) = cycles.iter().find(|c| members.contains(&c[0])) {
                return Err(Error::invalid_graph(format!(
                    "Can't orient branches: source {} feeds the cycle {cycle:?}.",
                    source_ids[i]
                )));
            }

            let rank: HashMap<Id, usize> = order.iter().enumerate().map(|(r, n)| (*n, r)).collect();
            for branch in &ends {
                let ranks = (rank.get(&branch.from_node), rank.get(&branch.to_node));
                let backwards = match ranks {
                    (Some(from), Some(to)) => branch.is_closed() && from > to,
                    (None, Some(_)) => branch.from_status == 0 && branch.to_status == 1,
                    _ => false,
                };
                if backwards {
                    reversed.push(branch.id);
                }
            }
        }
        branches.filter_ids(&reversed)
    }

    /// Reverses the branches returned by
    /// [`get_reversed_branches`][Grid::get_reversed_branches], and returns
    /// them as they were before.
    pub fn set_branch_orientations(&mut self) -> Result<ColumnStore, Error> {
        let reversed = self.get_reversed_branches()?;
        self.reverse_branches(reversed.ids()?)?;
        debug!(count = reversed.len(), "oriented branches away from sources");
        Ok(reversed)
    }
}

/// Feeders.
impl<G: GraphEngine> Grid<G> {
    /**
    Fills the `feeder_branch_id` and `feeder_node_id` columns of nodes and
    branches, and the `is_feeder` column of branches.

    A feeder is a closed branch with exactly one end on a substation node.
    Taking the substation nodes out of the active graph splits it into
    components, and everything in a component is fed by the component's
    feeder with the smallest id, from that feeder's substation node.

    Substation nodes, open branches, branches between two substation nodes
    and anything without a feeder get [`EMPTY_ID`].
    */
    pub fn set_feeder_ids(&mut self) -> Result<(), Error> {
        let _span = self.enter();
        let substations: HashSet<Id> = self.substation_nodes()?.into_iter().collect();
        let removed: Vec<Id> = substations.iter().copied().collect();
        let components = self.graphs.active_graph().get_components(&removed)?;
        let component_of: HashMap<Id, usize> = components
            .iter()
            .enumerate()
            .flat_map(|(c, nodes)| nodes.iter().map(move |n| (*n, c)))
            .collect();

        // The non-substation end of every feeder, with the feeder's id and
        // substation node.
        let feeder_end = |from: Id, to: Id| match (substations.contains(&from), substations.contains(&to)) {
            (true, false) => Some((to, from)),
            (false, true) => Some((from, to)),
            _ => None,
        };

        let branch_kinds = self.kinds_where(EntityKind::is_branch);
        let mut feeder_of: HashMap<usize, (Id, Id)> = HashMap::new();
        for kind in &branch_kinds {
            for branch in branch_ends(self.store(kind)?)? {
                if !branch.is_closed() {
                    continue;
                }
                let Some((end, substation)) = feeder_end(branch.from_node, branch.to_node) else {
                    continue;
                };
                if let Some(c) = component_of.get(&end) {
                    let entry = feeder_of.entry(*c).or_insert((branch.id, substation));
                    if branch.id < entry.0 {
                        *entry = (branch.id, substation);
                    }
                }
            }
        }
        let feeder_for = |node: Id| {
            component_of
                .get(&node)
                .and_then(|c| feeder_of.get(c))
                .copied()
                .unwrap_or((EMPTY_ID, EMPTY_ID))
        };

        let nodes: Vec<(Id, Id)> = self
            .store(&EntityKind::Node)?
            .ids()?
            .iter()
            .map(|node| feeder_for(*node))
            .collect();

        let mut per_kind = Vec::with_capacity(branch_kinds.len());
        for kind in &branch_kinds {
            let mut feeders = Vec::new();
            let mut is_feeder = Vec::new();
            for branch in branch_ends(self.store(kind)?)? {
                let (from_sub, to_sub) = (
                    substations.contains(&branch.from_node),
                    substations.contains(&branch.to_node),
                );
                let end = match (branch.is_closed(), from_sub, to_sub) {
                    (false, _, _) | (true, true, true) => None,
                    (true, true, false) => Some(branch.to_node),
                    (true, false, _) => Some(branch.from_node),
                };
                feeders.push(end.map(feeder_for).unwrap_or((EMPTY_ID, EMPTY_ID)));
                is_feeder.push(branch.is_closed() && from_sub != to_sub);
            }
            per_kind.push((kind.clone(), feeders, is_feeder));
        }

        let node_store = self.store_mut(&EntityKind::Node)?;
        node_store.set_column("feeder_branch_id", Values::each(nodes.iter().map(|f| f.0)))?;
        node_store.set_column("feeder_node_id", Values::each(nodes.iter().map(|f| f.1)))?;
        for (kind, feeders, is_feeder) in per_kind {
            let store = self.store_mut(&kind)?;
            store.set_column("feeder_branch_id", Values::each(feeders.iter().map(|f| f.0)))?;
            store.set_column("feeder_node_id", Values::each(feeders.iter().map(|f| f.1)))?;
            store.set_column("is_feeder", Values::each(is_feeder))?;
        }
        debug!(feeders = feeder_of.len(), "set feeder ids");
        Ok(())
    }
}
