// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Lookups across stores, and queries that combine the stores with the
//! active graph.

use std::collections::HashSet;

use crate::entities::{branch3_ends, generic_branch_schema};
use crate::store::{ColumnStore, FilterMode, Predicate, Values};
use crate::{Category, EntityKind, Error, GraphEngine, HasThreeTerminals, Id, SUBSTATION_NODE};

use super::Grid;

/// Lookups by id.
impl<G: GraphEngine> Grid<G> {
    /// Returns the kind of the store of the given category that holds `id`.
    pub fn find_array_field(&self, id: Id, category: Category) -> Result<EntityKind, Error> {
        for (kind, store) in self.stores() {
            if kind.category() == category && !store.rows_of_id(id)?.is_empty() {
                return Ok(kind.clone());
            }
        }
        Err(Error::missing_entity(format!(
            "No {category:?} with id {id} exists."
        )))
    }

    /// Returns every row with the given id, with the kind of its store.
    pub fn search_for_id(&self, id: Id) -> Result<Vec<(EntityKind, ColumnStore)>, Error> {
        let mut found = Vec::new();
        for (kind, store) in self.stores() {
            if !store.schema().has_column("id") {
                continue;
            }
            let rows = store.rows_of_id(id)?;
            if !rows.is_empty() {
                found.push((kind.clone(), store.take(&rows)));
            }
        }
        if found.is_empty() {
            return Err(Error::missing_entity(format!("Id {id} does not exist.")));
        }
        Ok(found)
    }
}

/// Branch views.
impl<G: GraphEngine> Grid<G> {
    /// Returns the stores of every two-terminal branch kind.
    pub fn branch_arrays(&self) -> Vec<(EntityKind, &ColumnStore)> {
        self.stores()
            .filter(|(kind, _)| kind.is_branch())
            .map(|(kind, store)| (kind.clone(), store))
            .collect()
    }

    /// Returns all two-terminal branches of every kind in one store with the
    /// columns they share.
    pub fn branches(&self) -> Result<ColumnStore, Error> {
        let schema = std::sync::Arc::new(generic_branch_schema());
        let mut all = ColumnStore::new(schema.clone())?;
        for (_, store) in self.branch_arrays() {
            all.append(&ColumnStore::from_extended(schema.clone(), store)?)?;
        }
        Ok(all)
    }

    /// Returns the branches with the given ids from their own store.  All of
    /// them must be of the same kind.
    pub fn get_typed_branches(&self, ids: &[Id]) -> Result<(EntityKind, ColumnStore), Error> {
        if ids.is_empty() {
            return Err(Error::invalid_argument("No branch ids given."));
        }
        for (kind, store) in self.branch_arrays() {
            let found = store.filter_ids(ids)?;
            if found.is_empty() {
                continue;
            }
            if found.len() != ids.len() {
                return Err(Error::invalid_argument(format!(
                    "Branches {ids:?} are not all of the same kind."
                )));
            }
            return Ok((kind, found));
        }
        Err(Error::missing_entity(format!("Branches {ids:?} do not exist.")))
    }

    /// Returns the active branches, three-winding edges included, whose two
    /// ends are both in `nodes`.
    fn active_branches_among(&self, nodes: &[Id]) -> Result<ColumnStore, Error> {
        let mut active = self.get_branches_in_path(nodes)?;
        for kind in self.kinds_where(EntityKind::is_branch3) {
            active.append(&closed_between(&branch3_as_branches(self.store(&kind)?)?, nodes)?)?;
        }
        Ok(active)
    }

    /// Returns the active two-terminal branches whose two ends are both in
    /// `nodes`.
    pub fn get_branches_in_path(&self, nodes: &[Id]) -> Result<ColumnStore, Error> {
        closed_between(&self.branches()?, nodes)
    }

    /**
    Returns, for each step along the shortest active path between two nodes,
    the active branches that make that step.

    Branches match in either direction.  An edge of a three-winding
    transformer shows up as a generic branch with the transformer's id.

    With `typed`, each step is returned from the branch's own store instead,
    with the full set of columns of its kind.
    */
    pub fn iter_branches_in_shortest_path(
        &self,
        from_node: Id,
        to_node: Id,
        typed: bool,
    ) -> Result<impl Iterator<Item = ColumnStore>, Error> {
        let (path, _) = self.graphs.active_graph().get_shortest_path(from_node, to_node)?;
        let active = self.active_branches_among(&path)?;
        let from = active.i32s("from_node")?;
        let to = active.i32s("to_node")?;

        let mut steps = Vec::with_capacity(path.len().saturating_sub(1));
        for pair in path.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let rows: Vec<usize> = (0..active.len())
                .filter(|i| (from[*i], to[*i]) == (a, b) || (from[*i], to[*i]) == (b, a))
                .collect();
            if rows.is_empty() {
                return Err(Error::missing_entity(format!(
                    "No active branch connects nodes {a} and {b}."
                )));
            }
            let step = active.take(&rows);
            if typed {
                let ids = step.ids()?.to_vec();
                steps.push(self.typed_rows(&ids)?);
            } else {
                steps.push(step);
            }
        }
        Ok(steps.into_iter())
    }

    /// Returns the rows with the given ids from the one branch or
    /// three-terminal branch store that holds them.
    fn typed_rows(&self, ids: &[Id]) -> Result<ColumnStore, Error> {
        match self.get_typed_branches(ids) {
            Ok((_, rows)) => Ok(rows),
            Err(err) if err.kind() == crate::ErrorKind::MissingEntity => {
                for kind in self.kinds_where(EntityKind::is_branch3) {
                    let rows = self.store(&kind)?.filter_ids(ids)?;
                    if !rows.is_empty() {
                        return Ok(rows);
                    }
                }
                Err(err)
            }
            Err(err) => Err(err),
        }
    }
}

/// Substation queries.
impl<G: GraphEngine> Grid<G> {
    /// Returns the ids of the substation nodes.
    pub(crate) fn substation_nodes(&self) -> Result<Vec<Id>, Error> {
        Ok(self
            .store(&EntityKind::Node)?
            .filter(&[Predicate::new("node_type", SUBSTATION_NODE)], FilterMode::And)?
            .ids()?
            .to_vec())
    }

    /// Returns the row of the substation node closest to `node` in the active
    /// graph.  A substation node is its own nearest substation.
    pub fn get_nearest_substation_node(&self, node: Id) -> Result<ColumnStore, Error> {
        let substations: HashSet<Id> = self.substation_nodes()?.into_iter().collect();
        let nearest = self
            .graphs
            .active_graph()
            .get_connected(node, &[], true)?
            .into_iter()
            .find(|n| substations.contains(n))
            .ok_or_else(|| {
                Error::missing_entity(format!("No substation node is connected to node {node}."))
            })?;
        self.store(&EntityKind::Node)?.get_by_id(nearest)
    }

    /// Returns the nodes fed through `node` in the active graph, when the
    /// grid is fed from its substation nodes.
    pub fn get_downstream_nodes(&self, node: Id, inclusive: bool) -> Result<Vec<Id>, Error> {
        let substations = self.substation_nodes()?;
        if substations.contains(&node) {
            return Err(Error::invalid_graph(format!(
                "Node {node} is a substation node, which has no downstream nodes."
            )));
        }
        self.graphs
            .active_graph()
            .get_downstream_nodes(node, &substations, inclusive)
    }
}

/// Returns the closed branches of `store` with both ends in `nodes`.
fn closed_between(store: &ColumnStore, nodes: &[Id]) -> Result<ColumnStore, Error> {
    store.filter(
        &[
            Predicate::new("from_status", 1),
            Predicate::new("to_status", 1),
            Predicate::any_of("from_node", nodes.iter().copied()),
            Predicate::any_of("to_node", nodes.iter().copied()),
        ],
        FilterMode::And,
    )
}

/// Returns the three edges of every three-terminal branch in `store` as
/// generic branch rows, with the id of the branch they belong to.
pub(crate) fn branch3_as_branches(store: &ColumnStore) -> Result<ColumnStore, Error> {
    let edges: Vec<_> = branch3_ends(store)?
        .iter()
        .flat_map(|b| b.as_branches())
        .collect();

    let mut rows = ColumnStore::empty(generic_branch_schema(), edges.len())?;
    rows.set_column("id", Values::each(edges.iter().map(|e| e.id)))?;
    rows.set_column("from_node", Values::each(edges.iter().map(|e| e.from_node)))?;
    rows.set_column("to_node", Values::each(edges.iter().map(|e| e.to_node)))?;
    rows.set_column("from_status", Values::each(edges.iter().map(|e| e.from_status)))?;
    rows.set_column("to_status", Values::each(edges.iter().map(|e| e.to_status)))?;
    Ok(rows)
}
