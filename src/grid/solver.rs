// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The data handed to and received from an external power-flow solver.
//!
//! The solver sees the standard stores without the bookkeeping columns the
//! grid adds, and returns stores keyed by `id` whose columns overlap with the
//! grid's.

use std::sync::Arc;

use tracing::debug;

use crate::store::{ColumnStore, Schema, Values};
use crate::{EntityKind, Error, GraphEngine, Grid, STANDARD_KINDS};

use super::modify::TOPOLOGY_COLUMNS;

/// The stores handed to the solver, in order.
pub static SOLVER_STORES: &[EntityKind] = &STANDARD_KINDS;

/// Columns only the grid uses.
const GRID_ONLY_COLUMNS: [&str; 4] = ["feeder_branch_id", "feeder_node_id", "is_feeder", "node_type"];

/// Returns the columns of `kind` the solver works with, or `None` for kinds
/// the solver doesn't know.
pub fn solver_columns(kind: &EntityKind) -> Option<Schema> {
    if !SOLVER_STORES.contains(kind) {
        return None;
    }
    kind.schema()
        .map(|schema| schema.retain(|name| !GRID_ONLY_COLUMNS.contains(&name)))
}

impl<G: GraphEngine> Grid<G> {
    /// Returns every solver store of the grid, projected onto the solver's
    /// columns.
    pub fn to_solver_arrays(&self) -> Result<Vec<(EntityKind, ColumnStore)>, Error> {
        let mut arrays = Vec::with_capacity(SOLVER_STORES.len());
        for kind in SOLVER_STORES {
            let (Some(schema), Ok(store)) = (solver_columns(kind), self.store(kind)) else {
                continue;
            };
            arrays.push((kind.clone(), ColumnStore::from_extended(Arc::new(schema), store)?));
        }
        Ok(arrays)
    }

    /**
    Copies solver output back into the grid.

    Each output store is matched by kind, and its rows by `id`.  Only the
    columns both stores have are copied, except for ids, end nodes and
    statuses, which only change through the methods that keep the graphs in
    sync.  Every id must exist.
    */
    pub fn update_from_solver(&mut self, outputs: &[(EntityKind, ColumnStore)]) -> Result<(), Error> {
        let _span = self.enter();
        for (kind, output) in outputs {
            let store = self.store_mut(kind)?;
            let shared: Vec<String> = output
                .schema()
                .names()
                .filter(|name| !TOPOLOGY_COLUMNS.contains(name) && store.schema().has_column(name))
                .map(str::to_string)
                .collect();
            if shared.is_empty() || output.is_empty() {
                continue;
            }

            let mut updates = Vec::with_capacity(shared.len());
            for name in &shared {
                let values = (0..output.len())
                    .map(|row| output.value(row, name))
                    .collect::<Result<Vec<_>, Error>>()?;
                updates.push((name.as_str(), Values::each(values)));
            }
            store.update_by_id(output.ids()?, &updates, false)?;
            debug!(kind = %kind, rows = output.len(), columns = ?shared, "applied solver output");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::test_utils::build_basic_grid;
    use crate::store::DType;

    #[test]
    fn test_solver_columns() {
        let node = solver_columns(&EntityKind::Node).unwrap_or_default();
        assert_eq!(node.names().collect::<Vec<_>>(), ["id", "u_rated"]);
        let line = solver_columns(&EntityKind::Line).unwrap_or_default();
        assert!(line.has_column("r1"));
        assert!(!line.has_column("is_feeder"));
        assert!(solver_columns(&EntityKind::Custom("battery".into())).is_none());
    }

    #[test]
    fn test_to_solver_arrays() -> Result<(), Error> {
        let grid = build_basic_grid()?;
        let arrays = grid.to_solver_arrays()?;
        assert_eq!(arrays.len(), SOLVER_STORES.len());
        assert_eq!(arrays[0].0, EntityKind::Node);
        assert_eq!(arrays[0].1.ids()?, [101, 102, 103, 104, 105, 106]);
        assert!(!arrays[0].1.schema().has_column("node_type"));
        Ok(())
    }

    #[test]
    fn test_update_from_solver() -> Result<(), Error> {
        let mut grid = build_basic_grid()?;
        let schema = Schema::with_id()
            .column("u_rated", DType::Float64)
            .column("u_pu", DType::Float64);
        let mut output = ColumnStore::empty(schema, 2)?;
        output.set_column("id", Values::each([103, 101]))?;
        output.set_column("u_rated", Values::each([11_000.0, 10_000.0]))?;
        output.set_column("u_pu", Values::each([0.98, 1.0]))?;
        grid.update_from_solver(&[(EntityKind::Node, output)])?;
        assert_eq!(
            grid.store(&EntityKind::Node)?.f64s("u_rated")?,
            [10_000.0, 10_500.0, 11_000.0, 10_500.0, 10_500.0, 400.0]
        );

        let mut unknown = ColumnStore::empty(Schema::with_id().column("u_rated", DType::Float64), 1)?;
        unknown.set_column("id", Values::scalar(999))?;
        assert!(grid
            .update_from_solver(&[(EntityKind::Node, unknown)])
            .is_err_and(|e| e.kind() == crate::ErrorKind::MissingEntity));
        Ok(())
    }
}
