// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Deleting entities, switching branches and other in-place changes.

use tracing::debug;

use crate::entities::{branch3_ends, branch_ends};
use crate::store::{FilterMode, Predicate, Values};
use crate::{Category, EntityKind, Error, GraphEngine, Id};

use super::Grid;

const POWER_SENSORS: [EntityKind; 2] = [EntityKind::SymPowerSensor, EntityKind::AsymPowerSensor];
const VOLTAGE_SENSORS: [EntityKind; 2] = [EntityKind::SymVoltageSensor, EntityKind::AsymVoltageSensor];
const CURRENT_SENSORS: [EntityKind; 2] = [EntityKind::SymCurrentSensor, EntityKind::AsymCurrentSensor];

/// Columns that can only change through the methods that keep the graphs in
/// sync.
pub(super) const TOPOLOGY_COLUMNS: [&str; 11] = [
    "id",
    "from_node",
    "to_node",
    "from_status",
    "to_status",
    "node_1",
    "node_2",
    "node_3",
    "status_1",
    "status_2",
    "status_3",
];

/// Deletion.
impl<G: GraphEngine> Grid<G> {
    /// Removes the rows of `kind` whose `column` holds one of `values`, and
    /// returns their ids.  A missing store has nothing to remove.
    fn remove_where(&mut self, kind: &EntityKind, column: &str, values: &[Id]) -> Result<Vec<Id>, Error> {
        let Some(store) = self.stores.get_mut(kind) else {
            return Ok(vec![]);
        };
        if values.is_empty() || store.is_empty() {
            return Ok(vec![]);
        }
        let mask = store.filter_mask(
            &[Predicate::any_of(column, values.iter().copied())],
            FilterMode::And,
        )?;
        let removed: Vec<Id> = store
            .ids()?
            .iter()
            .zip(&mask)
            .filter_map(|(id, m)| m.then_some(*id))
            .collect();
        store.remove_mask(&mask);
        if !removed.is_empty() {
            debug!(kind = %kind, ids = ?removed, "removed dependent rows");
        }
        Ok(removed)
    }

    /// Returns the ids of the rows of `kind` that refer to `id` in any of
    /// `columns`.
    fn referring_ids(&self, kind: &EntityKind, columns: &[&str], id: Id) -> Result<Vec<Id>, Error> {
        let Some(store) = self.stores.get(kind) else {
            return Ok(vec![]);
        };
        if store.is_empty() {
            return Ok(vec![]);
        }
        let predicates: Vec<Predicate> = columns.iter().map(|c| Predicate::new(c, id)).collect();
        Ok(store.filter(&predicates, FilterMode::Or)?.ids()?.to_vec())
    }

    /**
    Deletes a node, and everything that depends on it:

    - the appliances on the node,
    - the power sensors and voltage regulators on those appliances or on
      the node itself,
    - the voltage sensors and faults on the node,
    - every branch and three-terminal branch connected to the node, with
      their own dependents.

    The node is removed from both graphs.
    */
    pub fn delete_node(&mut self, node: Id) -> Result<(), Error> {
        let _span = self.enter();
        if self.store(&EntityKind::Node)?.rows_of_id(node)?.is_empty() {
            return Err(Error::missing_entity(format!("Node {node} does not exist.")));
        }
        self.remove_where(&EntityKind::Node, "id", &[node])?;

        let mut objects = Vec::new();
        for kind in self.kinds_where(EntityKind::is_appliance) {
            objects.extend(self.remove_where(&kind, "node", &[node])?);
        }
        objects.push(node);
        for kind in &POWER_SENSORS {
            self.remove_where(kind, "measured_object", &objects)?;
        }
        self.remove_where(&EntityKind::VoltageRegulator, "regulated_object", &objects)?;
        for kind in &VOLTAGE_SENSORS {
            self.remove_where(kind, "measured_object", &[node])?;
        }
        self.remove_where(&EntityKind::Fault, "fault_object", &[node])?;

        for kind in self.kinds_where(EntityKind::is_branch) {
            for branch in self.referring_ids(&kind, &["from_node", "to_node"], node)? {
                self.delete_branch(branch)?;
            }
        }
        for kind in self.kinds_where(EntityKind::is_branch3) {
            for branch3 in self.referring_ids(&kind, &["node_1", "node_2", "node_3"], node)? {
                self.delete_branch3(branch3)?;
            }
        }

        self.graphs.delete_node(node)?;
        debug!(node, "deleted node");
        Ok(())
    }

    /// Removes the sensors and tap regulators of a deleted branch.
    fn remove_branch_dependents(&mut self, branch: Id) -> Result<(), Error> {
        for kind in POWER_SENSORS.iter().chain(&CURRENT_SENSORS) {
            self.remove_where(kind, "measured_object", &[branch])?;
        }
        self.remove_where(&EntityKind::TransformerTapRegulator, "regulated_object", &[branch])?;
        Ok(())
    }

    /// Deletes a two-terminal branch, its sensors and its tap regulators, and
    /// removes it from both graphs.
    pub fn delete_branch(&mut self, branch: Id) -> Result<(), Error> {
        let _span = self.enter();
        let kind = self.find_array_field(branch, Category::Branch)?;
        let ends = branch_ends(&self.store(&kind)?.filter_ids(&[branch])?)?;

        self.remove_where(&kind, "id", &[branch])?;
        self.remove_branch_dependents(branch)?;
        for b in &ends {
            self.graphs.delete_branch(b)?;
        }
        debug!(branch, kind = %kind, "deleted branch");
        Ok(())
    }

    /// Deletes a three-terminal branch, its sensors and its tap regulators,
    /// and removes its three edges from both graphs.
    pub fn delete_branch3(&mut self, branch3: Id) -> Result<(), Error> {
        let _span = self.enter();
        let kind = self.find_array_field(branch3, Category::Branch3)?;
        let ends = branch3_ends(&self.store(&kind)?.filter_ids(&[branch3])?)?;

        self.remove_where(&kind, "id", &[branch3])?;
        self.remove_branch_dependents(branch3)?;
        for b in &ends {
            self.graphs.delete_branch3(b)?;
        }
        debug!(branch3, kind = %kind, "deleted three-terminal branch");
        Ok(())
    }

    /// Deletes an appliance, its power sensors and its voltage regulators.
    pub fn delete_appliance(&mut self, appliance: Id) -> Result<(), Error> {
        let _span = self.enter();
        let kind = self.find_array_field(appliance, Category::Appliance)?;

        self.remove_where(&kind, "id", &[appliance])?;
        for kind in &POWER_SENSORS {
            self.remove_where(kind, "measured_object", &[appliance])?;
        }
        self.remove_where(&EntityKind::VoltageRegulator, "regulated_object", &[appliance])?;
        debug!(appliance, kind = %kind, "deleted appliance");
        Ok(())
    }
}

/// Switching and other updates.
impl<G: GraphEngine> Grid<G> {
    /// Closes both sides of a branch and adds it to the active graph.
    pub fn make_active(&mut self, branch: Id) -> Result<(), Error> {
        let _span = self.enter();
        let kind = self.find_array_field(branch, Category::Branch)?;
        let before = branch_ends(&self.store(&kind)?.filter_ids(&[branch])?)?;

        self.store_mut(&kind)?.update_by_id(
            &[branch],
            &[
                ("from_status", Values::scalar(1)),
                ("to_status", Values::scalar(1)),
            ],
            false,
        )?;
        for b in &before {
            self.graphs.make_active(b)?;
        }
        debug!(branch, "activated branch");
        Ok(())
    }

    /// Opens one side of a branch, the to-side unless `at_to_side` is false,
    /// and removes it from the active graph.
    pub fn make_inactive(&mut self, branch: Id, at_to_side: bool) -> Result<(), Error> {
        let _span = self.enter();
        let kind = self.find_array_field(branch, Category::Branch)?;
        let before = branch_ends(&self.store(&kind)?.filter_ids(&[branch])?)?;

        let side = if at_to_side { "to_status" } else { "from_status" };
        self.store_mut(&kind)?
            .update_by_id(&[branch], &[(side, Values::scalar(0))], false)?;
        for b in &before {
            self.graphs.make_inactive(b)?;
        }
        debug!(branch, side, "deactivated branch");
        Ok(())
    }

    /**
    Swaps the from- and to-side of the given branches, nodes and statuses
    together.  The branches may be of different kinds.

    The graphs are undirected, so they don't change.
    */
    pub fn reverse_branches(&mut self, branches: &[Id]) -> Result<(), Error> {
        if branches.is_empty() {
            return Ok(());
        }
        let _span = self.enter();

        let mut per_kind = Vec::new();
        let mut found = 0;
        for kind in self.kinds_where(EntityKind::is_branch) {
            let rows = self.store(&kind)?.filter_ids(branches)?;
            if !rows.is_empty() {
                found += rows.len();
                per_kind.push((kind, branch_ends(&rows)?));
            }
        }
        let missing: Vec<Id> = branches
            .iter()
            .copied()
            .filter(|id| !per_kind.iter().any(|(_, ends)| ends.iter().any(|b| b.id == *id)))
            .collect();
        if !missing.is_empty() {
            return Err(Error::missing_entity(format!("Branches {missing:?} do not exist.")));
        }

        for (kind, ends) in per_kind {
            let ids: Vec<Id> = ends.iter().map(|b| b.id).collect();
            self.store_mut(&kind)?.update_by_id(
                &ids,
                &[
                    ("from_node", Values::each(ends.iter().map(|b| b.to_node))),
                    ("to_node", Values::each(ends.iter().map(|b| b.from_node))),
                    ("from_status", Values::each(ends.iter().map(|b| b.to_status))),
                    ("to_status", Values::each(ends.iter().map(|b| b.from_status))),
                ],
                false,
            )?;
        }
        debug!(branches = ?branches, rows = found, "reversed branches");
        Ok(())
    }

    /// Updates non-topology columns of the rows with the given ids.
    ///
    /// Ids, end nodes and statuses can only change through the methods that
    /// keep the graphs in sync.
    pub fn update_by_id(
        &mut self,
        kind: &EntityKind,
        ids: &[Id],
        updates: &[(&str, Values)],
    ) -> Result<(), Error> {
        if let Some((column, _)) = updates.iter().find(|(c, _)| TOPOLOGY_COLUMNS.contains(c)) {
            return Err(Error::invalid_argument(format!(
                "Column '{column}' can't be updated directly."
            )));
        }
        self.store_mut(kind)?.update_by_id(ids, updates, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::test_utils::{build_basic_grid, build_grid_with_three_winding, rows};
    use crate::store::ColumnStore;

    fn ids_of(grid: &crate::Grid, kind: &EntityKind) -> Result<Vec<Id>, Error> {
        Ok(grid.store(kind)?.ids()?.to_vec())
    }

    fn sensor(kind: EntityKind, id: Id, object: Id) -> Result<ColumnStore, Error> {
        let mut columns = vec![
            ("id", Values::scalar(id)),
            ("measured_object", Values::scalar(object)),
        ];
        if matches!(kind, EntityKind::SymPowerSensor | EntityKind::SymCurrentSensor) {
            columns.push(("measured_terminal_type", Values::scalar(0)));
        }
        rows(&kind, 1, &columns)
    }

    #[test]
    fn test_delete_node_cascades() -> Result<(), Error> {
        let mut grid = build_basic_grid()?;
        grid.append(&EntityKind::SymPowerSensor, &sensor(EntityKind::SymPowerSensor, 701, 402)?, true)?;
        grid.append(&EntityKind::SymVoltageSensor, &sensor(EntityKind::SymVoltageSensor, 702, 103)?, true)?;
        grid.append(&EntityKind::SymCurrentSensor, &sensor(EntityKind::SymCurrentSensor, 703, 202)?, true)?;
        grid.append(&EntityKind::SymVoltageSensor, &sensor(EntityKind::SymVoltageSensor, 704, 104)?, true)?;

        grid.delete_node(103)?;

        assert_eq!(ids_of(&grid, &EntityKind::Node)?, [101, 102, 104, 105, 106]);
        assert_eq!(ids_of(&grid, &EntityKind::SymLoad)?, [401, 403, 404]);
        assert_eq!(ids_of(&grid, &EntityKind::Line)?, [201, 204]);
        assert!(ids_of(&grid, &EntityKind::SymPowerSensor)?.is_empty());
        assert!(ids_of(&grid, &EntityKind::SymCurrentSensor)?.is_empty());
        assert_eq!(ids_of(&grid, &EntityKind::SymVoltageSensor)?, [704]);

        for active in [true, false] {
            let graph = grid.graphs().graph(active);
            assert!(!graph.has_node(103));
            assert!(!graph.has_branch(102, 103));
        }
        assert_eq!(grid.graphs().complete_graph().nr_branches(), 4);

        assert!(grid
            .delete_node(103)
            .is_err_and(|e| e == Error::missing_entity("Node 103 does not exist.")));
        Ok(())
    }

    #[test]
    fn test_delete_node_with_three_winding() -> Result<(), Error> {
        let mut grid = build_grid_with_three_winding()?;
        grid.delete_node(101)?;
        assert!(grid.store(&EntityKind::ThreeWindingTransformer)?.is_empty());
        assert!(grid.store(&EntityKind::Source)?.is_empty());
        assert!(!grid.graphs().complete_graph().has_branch(102, 103));
        assert_eq!(grid.graphs().complete_graph().nr_branches(), 8);
        Ok(())
    }

    #[test]
    fn test_delete_branch() -> Result<(), Error> {
        let mut grid = build_basic_grid()?;
        grid.append(&EntityKind::SymPowerSensor, &sensor(EntityKind::SymPowerSensor, 701, 301)?, true)?;
        grid.append(&EntityKind::SymPowerSensor, &sensor(EntityKind::SymPowerSensor, 702, 202)?, true)?;

        grid.delete_branch(301)?;
        assert!(grid.store(&EntityKind::Transformer)?.is_empty());
        assert_eq!(ids_of(&grid, &EntityKind::SymPowerSensor)?, [702]);
        assert!(!grid.graphs().complete_graph().has_branch(102, 106));
        assert!(!grid.graphs().active_graph().has_branch(102, 106));
        assert!(grid.graphs().complete_graph().has_node(106));

        // An open branch is only in the complete graph.
        grid.delete_branch(203)?;
        assert_eq!(grid.graphs().complete_graph().nr_branches(), 4);
        assert_eq!(grid.graphs().active_graph().nr_branches(), 4);

        assert!(grid
            .delete_branch(401)
            .is_err_and(|e| e.kind() == crate::ErrorKind::MissingEntity));
        Ok(())
    }

    #[test]
    fn test_delete_branch3() -> Result<(), Error> {
        let mut grid = build_grid_with_three_winding()?;
        grid.delete_branch3(301)?;
        assert!(grid.store(&EntityKind::ThreeWindingTransformer)?.is_empty());
        assert_eq!(grid.graphs().complete_graph().nr_branches(), 8);
        assert_eq!(grid.graphs().active_graph().nr_branches(), 6);
        assert!(grid.graphs().complete_graph().has_node(101));
        Ok(())
    }

    #[test]
    fn test_delete_appliance() -> Result<(), Error> {
        let mut grid = build_basic_grid()?;
        grid.append(&EntityKind::SymPowerSensor, &sensor(EntityKind::SymPowerSensor, 701, 401)?, true)?;
        grid.delete_appliance(401)?;
        assert_eq!(ids_of(&grid, &EntityKind::SymLoad)?, [402, 403, 404]);
        assert!(grid.store(&EntityKind::SymPowerSensor)?.is_empty());
        assert_eq!(grid.graphs().complete_graph().nr_nodes(), 6);
        Ok(())
    }

    #[test]
    fn test_activation() -> Result<(), Error> {
        let mut grid = build_basic_grid()?;
        grid.make_active(203)?;
        let line = grid.store(&EntityKind::Line)?.get_by_id(203)?;
        assert_eq!((line.i8s("from_status")?[0], line.i8s("to_status")?[0]), (1, 1));
        assert!(grid.graphs().active_graph().has_branch(103, 104));
        assert_eq!(grid.graphs().complete_graph().nr_branches(), 6);

        grid.make_inactive(201, false)?;
        let line = grid.store(&EntityKind::Line)?.get_by_id(201)?;
        assert_eq!((line.i8s("from_status")?[0], line.i8s("to_status")?[0]), (0, 1));
        assert!(!grid.graphs().active_graph().has_branch(101, 102));

        // Opening the other side keeps it out.
        grid.make_inactive(201, true)?;
        assert_eq!(grid.graphs().active_graph().nr_branches(), 5);
        assert_eq!(grid.graphs().complete_graph().nr_branches(), 6);
        Ok(())
    }

    #[test]
    fn test_reverse_branches() -> Result<(), Error> {
        let mut grid = build_basic_grid()?;
        grid.make_inactive(202, true)?;
        grid.reverse_branches(&[202, 601])?;

        let line = grid.store(&EntityKind::Line)?.get_by_id(202)?;
        assert_eq!((line.i32s("from_node")?[0], line.i32s("to_node")?[0]), (103, 102));
        assert_eq!((line.i8s("from_status")?[0], line.i8s("to_status")?[0]), (0, 1));
        let link = grid.store(&EntityKind::Link)?.get_by_id(601)?;
        assert_eq!((link.i32s("from_node")?[0], link.i32s("to_node")?[0]), (105, 104));
        assert_eq!(grid.graphs().complete_graph().nr_branches(), 6);

        grid.reverse_branches(&[])?;
        assert!(grid
            .reverse_branches(&[202, 999])
            .is_err_and(|e| e == Error::missing_entity("Branches [999] do not exist.")));
        Ok(())
    }

    #[test]
    fn test_update_by_id() -> Result<(), Error> {
        let mut grid = build_basic_grid()?;
        grid.update_by_id(&EntityKind::Node, &[102, 103], &[("u_rated", Values::each([1.0, 2.0]))])?;
        assert_eq!(grid.store(&EntityKind::Node)?.f64s("u_rated")?[1..3], [1.0, 2.0]);
        assert!(grid
            .update_by_id(&EntityKind::Line, &[201], &[("to_status", Values::scalar(0))])
            .is_err_and(|e| e == Error::invalid_argument("Column 'to_status' can't be updated directly.")));
        Ok(())
    }
}
