// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for creating [`Grid`] instances and appending entities to them.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use tracing::{debug, info_span};

use crate::entities::{branch3_ends, branch_ends};
use crate::store::{ColumnStore, DType, Values};
use crate::{Category, EntityKind, Error, GraphContainer, GraphEngine, GridConfig, Id, EMPTY_ID};

use super::{Grid, GridSchema};

/// `Grid` instantiation.
impl<G: GraphEngine> Grid<G> {
    /// Creates a grid with an empty store for every standard entity kind.
    pub fn empty() -> Result<Self, Error> {
        Self::with_config(GridConfig::default())
    }

    /// Creates a grid with an empty store for every standard entity kind.
    pub fn with_config(config: GridConfig) -> Result<Self, Error> {
        Self::from_schema(&GridSchema::standard(), config)
    }

    /// Creates a grid with an empty store for every kind in `schema`, and
    /// the schema's extra fields set to their defaults.
    ///
    /// The schema must have a node store.
    pub fn from_schema(schema: &GridSchema, config: GridConfig) -> Result<Self, Error> {
        if !schema.has_store(&EntityKind::Node) {
            return Err(Error::invalid_configuration("A grid needs a 'node' store."));
        }
        for (kind, store_schema) in schema.stores() {
            if store_schema.spec("id").map(|spec| spec.dtype) != Some(DType::Int32) {
                return Err(Error::schema_mismatch(format!(
                    "The '{kind}' store needs an int32 'id' column."
                )));
            }
        }
        let stores = schema
            .stores()
            .map(|(kind, schema)| Ok((kind.clone(), ColumnStore::new(schema.clone())?)))
            .collect::<Result<BTreeMap<_, _>, Error>>()?;
        let scalars = schema
            .scalars()
            .iter()
            .map(|(name, default)| (name.clone(), default.clone()))
            .collect();

        let span = info_span!("grid", grid = config.name.as_deref().unwrap_or("unnamed"));
        Ok(Self {
            stores,
            scalars,
            id_counter: 0,
            graphs: GraphContainer::default(),
            config,
            span,
        })
    }

    /// Rebuilds both graphs from the node and branch stores.
    pub(crate) fn rebuild_graphs(&mut self) -> Result<(), Error> {
        let nodes = self.store(&EntityKind::Node)?.ids()?.to_vec();
        let mut branches = Vec::new();
        for kind in self.kinds_where(EntityKind::is_branch) {
            branches.extend(branch_ends(self.store(&kind)?)?);
        }
        let mut branch3s = Vec::new();
        for kind in self.kinds_where(EntityKind::is_branch3) {
            branch3s.extend(branch3_ends(self.store(&kind)?)?);
        }
        self.graphs = GraphContainer::from_arrays(&nodes, &branches, &branch3s)?;
        Ok(())
    }
}

/// Appending.
impl<G: GraphEngine> Grid<G> {
    /**
    Appends rows to the store of the given kind and adds them to the graphs.

    If every incoming id is [`EMPTY_ID`], the rows get consecutive ids after
    the id counter.  Otherwise every id must be set, and with `check_max_id`
    they must all be larger than the id counter.  The id counter ends up at
    the largest id in the grid.

    Nodes become graph nodes, and branches become edges in the complete graph,
    and in the active graph while they are closed.

    Nothing is modified when an error is returned.
    */
    pub fn append(&mut self, kind: &EntityKind, rows: &ColumnStore, check_max_id: bool) -> Result<(), Error> {
        let _span = self.enter();
        let target = self.store(kind)?;
        if !target.schema().is_compatible(rows.schema()) {
            return Err(Error::schema_mismatch(format!(
                "Rows don't match the columns of the '{kind}' store."
            )));
        }
        if rows.is_empty() {
            return Ok(());
        }

        let mut rows = rows.clone();
        let ids = rows.ids()?;
        let nr_empty = ids.iter().filter(|id| **id == EMPTY_ID).count();
        if nr_empty == ids.len() {
            let last = Id::try_from(ids.len())
                .ok()
                .and_then(|n| self.id_counter.checked_add(n))
                .ok_or_else(|| {
                    Error::invalid_argument(format!(
                        "Can't generate {} ids after the id counter {}.",
                        ids.len(),
                        self.id_counter
                    ))
                })?;
            rows.set_column("id", Values::each(self.id_counter + 1..=last))?;
        } else if nr_empty > 0 {
            return Err(Error::invalid_argument(
                "Can't append a mix of rows with and without ids.",
            ));
        } else if check_max_id {
            let min_id = ids.iter().copied().min().unwrap_or(EMPTY_ID);
            if self.id_counter > 0 && min_id <= self.id_counter {
                return Err(Error::duplicate_identifier(format!(
                    "Ids must be larger than the id counter {}, got {min_id}.",
                    self.id_counter
                )));
            }
            let mut seen = HashSet::with_capacity(ids.len());
            let repeated: BTreeSet<Id> = ids.iter().copied().filter(|id| !seen.insert(*id)).collect();
            if !repeated.is_empty() {
                return Err(Error::duplicate_identifier(format!(
                    "Rows repeat the ids {:?}.",
                    repeated.into_iter().collect::<Vec<_>>()
                )));
            }
        }

        if let Err(err) = self.add_to_graphs(kind, &rows) {
            self.rebuild_graphs()?;
            return Err(err);
        }
        if let Err(err) = self.store_mut(kind)?.append(&rows) {
            self.rebuild_graphs()?;
            return Err(err);
        }

        let max_id = rows.ids()?.iter().copied().max().unwrap_or(EMPTY_ID);
        self.id_counter = self.id_counter.max(max_id);
        debug!(kind = %kind, rows = rows.len(), id_counter = self.id_counter, "appended rows");
        Ok(())
    }

    fn add_to_graphs(&mut self, kind: &EntityKind, rows: &ColumnStore) -> Result<(), Error> {
        match kind.category() {
            Category::Node => {
                for node in rows.ids()? {
                    self.graphs.add_node(*node)?;
                }
            }
            Category::Branch => {
                for branch in branch_ends(rows)? {
                    self.graphs.add_branch(&branch)?;
                }
            }
            Category::Branch3 => {
                for branch3 in branch3_ends(rows)? {
                    self.graphs.add_branch3(&branch3)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Checks that no id is used twice across all stores.
    pub fn check_ids(&self) -> Result<(), Error> {
        let mut seen = BTreeSet::new();
        let mut duplicates = BTreeSet::new();
        for (_, store) in self.stores() {
            if !store.schema().has_column("id") {
                continue;
            }
            for id in store.ids()? {
                if !seen.insert(*id) {
                    duplicates.insert(*id);
                }
            }
        }
        if duplicates.is_empty() {
            Ok(())
        } else {
            Err(Error::duplicate_identifier(format!(
                "Found duplicate ids: {:?}.",
                duplicates.into_iter().collect::<Vec<_>>()
            )))
        }
    }

    /// Returns every id in the grid.
    pub(crate) fn all_ids(&self) -> Result<BTreeSet<Id>, Error> {
        let mut ids = BTreeSet::new();
        for (_, store) in self.stores() {
            if store.schema().has_column("id") {
                ids.extend(store.ids()?.iter().copied());
            }
        }
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::test_utils::{build_basic_grid, rows};
    use crate::{ErrorKind, Grid};

    #[test]
    fn test_empty() -> Result<(), Error> {
        let grid: Grid = Grid::empty()?;
        assert_eq!(grid.id_counter(), 0);
        assert_eq!(grid.stores().count(), crate::STANDARD_KINDS.len());
        assert!(grid.stores().all(|(_, s)| s.is_empty()));
        assert_eq!(grid.graphs().complete_graph().nr_nodes(), 0);

        assert!(Grid::<crate::PetgraphEngine>::from_schema(&GridSchema::empty(), GridConfig::default())
            .is_err_and(|e| e == Error::invalid_configuration("A grid needs a 'node' store.")));

        let no_id = GridSchema::standard().with_store(
            EntityKind::Custom("battery".into()),
            crate::Schema::new().column("capacity", DType::Float64),
        );
        assert!(Grid::<crate::PetgraphEngine>::from_schema(&no_id, GridConfig::default())
            .is_err_and(|e| e == Error::schema_mismatch("The 'battery' store needs an int32 'id' column.")));
        Ok(())
    }

    #[test]
    fn test_basic_grid() -> Result<(), Error> {
        let grid = build_basic_grid()?;
        assert_eq!(grid.id_counter(), 601);
        assert_eq!(grid.graphs().complete_graph().nr_nodes(), 6);
        assert_eq!(grid.graphs().active_graph().nr_nodes(), 6);
        assert_eq!(grid.graphs().complete_graph().nr_branches(), 6);
        assert_eq!(grid.graphs().active_graph().nr_branches(), 5);
        grid.check_ids()?;
        Ok(())
    }

    #[test]
    fn test_append_assigns_ids() -> Result<(), Error> {
        let mut grid = build_basic_grid()?;
        let nodes = rows(&EntityKind::Node, 2, &[("u_rated", Values::scalar(400.0))])?;
        grid.append(&EntityKind::Node, &nodes, true)?;
        assert_eq!(grid.id_counter(), 603);
        assert!(grid.graphs().active_graph().has_node(602));
        assert!(grid.graphs().complete_graph().has_node(603));

        let mixed = rows(
            &EntityKind::Node,
            2,
            &[("id", Values::each([700, EMPTY_ID])), ("u_rated", Values::scalar(400.0))],
        )?;
        assert!(grid
            .append(&EntityKind::Node, &mixed, true)
            .is_err_and(|e| e.kind() == ErrorKind::InvalidArgument));
        Ok(())
    }

    #[test]
    fn test_append_checks_max_id() -> Result<(), Error> {
        let mut grid = build_basic_grid()?;
        let node = |id: Id| rows(&EntityKind::Node, 1, &[("id", Values::scalar(id)), ("u_rated", Values::scalar(400.0))]);

        assert!(grid
            .append(&EntityKind::Node, &node(601)?, true)
            .is_err_and(|e| e == Error::duplicate_identifier("Ids must be larger than the id counter 601, got 601.")));
        assert_eq!(grid.store(&EntityKind::Node)?.len(), 6);
        assert!(!grid.graphs().complete_graph().has_node(601));

        grid.append(&EntityKind::Node, &node(602)?, true)?;
        assert_eq!(grid.id_counter(), 602);

        let loads = rows(
            &EntityKind::SymLoad,
            2,
            &[("id", Values::each([700, 700])), ("node", Values::scalar(102))],
        )?;
        assert!(grid
            .append(&EntityKind::SymLoad, &loads, true)
            .is_err_and(|e| e == Error::duplicate_identifier("Rows repeat the ids [700].")));
        assert!(grid.store(&EntityKind::SymLoad)?.filter_ids(&[700])?.is_empty());

        // Without the check, lower ids are accepted.
        grid.append(&EntityKind::Node, &node(150)?, false)?;
        assert_eq!(grid.id_counter(), 602);
        grid.check_ids()?;

        grid.append(&EntityKind::Node, &node(401)?, false)?;
        assert!(grid
            .check_ids()
            .is_err_and(|e| e == Error::duplicate_identifier("Found duplicate ids: [401].")));
        Ok(())
    }

    #[test]
    fn test_append_at_largest_id() -> Result<(), Error> {
        let mut grid: Grid = Grid::empty()?;
        let last = rows(&EntityKind::Node, 1, &[("id", Values::scalar(Id::MAX)), ("u_rated", Values::scalar(400.0))])?;
        grid.append(&EntityKind::Node, &last, true)?;
        assert_eq!(grid.id_counter(), Id::MAX);

        let unnamed = rows(&EntityKind::Node, 1, &[("u_rated", Values::scalar(400.0))])?;
        assert!(grid
            .append(&EntityKind::Node, &unnamed, true)
            .is_err_and(|e| e.kind() == ErrorKind::InvalidArgument));
        assert_eq!(grid.store(&EntityKind::Node)?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_append_is_atomic() -> Result<(), Error> {
        let mut grid = build_basic_grid()?;
        let dangling = rows(
            &EntityKind::Line,
            2,
            &[
                ("id", Values::each([700, 701])),
                ("from_node", Values::each([101, 101])),
                ("to_node", Values::each([102, 999])),
                ("from_status", Values::scalar(1)),
                ("to_status", Values::scalar(1)),
            ],
        )?;
        assert!(grid
            .append(&EntityKind::Line, &dangling, true)
            .is_err_and(|e| e == Error::missing_entity("Node 999 does not exist.")));
        assert_eq!(grid.store(&EntityKind::Line)?.len(), 4);
        assert_eq!(grid.graphs().complete_graph().nr_branches(), 6);
        assert_eq!(grid.graphs().active_graph().nr_branches(), 5);
        assert_eq!(grid.id_counter(), 601);

        let wrong = rows(&EntityKind::Link, 1, &[])?;
        assert!(grid
            .append(&EntityKind::Line, &wrong, true)
            .is_err_and(|e| e == Error::schema_mismatch("Rows don't match the columns of the 'line' store.")));
        Ok(())
    }

    #[test]
    fn test_rebuild_matches_incremental() -> Result<(), Error> {
        let grid = build_basic_grid()?;
        let mut rebuilt = grid.clone();
        rebuilt.rebuild_graphs()?;
        for active in [true, false] {
            let mut a = grid.graphs().graph(active).all_branches();
            let mut b = rebuilt.graphs().graph(active).all_branches();
            a.sort();
            b.sort();
            assert_eq!(a, b);
            assert_eq!(
                grid.graphs().graph(active).external_ids(),
                rebuilt.graphs().graph(active).external_ids()
            );
        }
        Ok(())
    }
}
