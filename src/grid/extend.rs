// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Grids with extended or custom stores, and conversion between grids of
//! different layouts.

use tracing::{debug, warn};

use crate::store::{ColumnStore, Schema, Value};
use crate::{EntityKind, Error, GraphEngine, GridConfig, STANDARD_KINDS};

use super::Grid;

/**
The layout of a [`Grid`]: which stores it holds, with which columns, and
which extra scalar fields it carries.

Start from [`GridSchema::standard`] and add columns to standard kinds, custom
kinds or scalar fields:

```
use power_grid_store::{DType, EntityKind, Grid, GridConfig, GridSchema, Schema};

let schema = GridSchema::standard()
    .with_extra_columns(
        &EntityKind::Node,
        &Schema::new().defaulted("u", DType::Float64, f64::NAN),
    )?
    .with_store(EntityKind::Custom("battery".into()), Schema::with_id())
    .with_scalar("version", 1);
let grid: Grid = Grid::from_schema(&schema, GridConfig::default())?;
assert!(grid.store(&EntityKind::Node)?.schema().has_column("u"));
assert!(grid.has_store(&EntityKind::Custom("battery".into())));
# Ok::<(), power_grid_store::Error>(())
```
*/
#[derive(Clone, Debug)]
pub struct GridSchema {
    stores: Vec<(EntityKind, Schema)>,
    scalars: Vec<(String, Value)>,
}

impl Default for GridSchema {
    fn default() -> Self {
        Self::standard()
    }
}

impl GridSchema {
    /// Every standard kind with its standard schema, and no extra fields.
    pub fn standard() -> Self {
        Self {
            stores: STANDARD_KINDS
                .iter()
                .filter_map(|kind| kind.schema().map(|schema| (kind.clone(), schema)))
                .collect(),
            scalars: vec![],
        }
    }

    /// No stores and no extra fields.
    pub fn empty() -> Self {
        Self {
            stores: vec![],
            scalars: vec![],
        }
    }

    /// Adds a store, replacing the schema of an existing store of the same
    /// kind.
    pub fn with_store(mut self, kind: EntityKind, schema: Schema) -> Self {
        match self.stores.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, existing)) => *existing = schema,
            None => self.stores.push((kind, schema)),
        }
        self
    }

    /// Appends the columns of `extra` to the schema of an existing store.
    pub fn with_extra_columns(mut self, kind: &EntityKind, extra: &Schema) -> Result<Self, Error> {
        let (_, schema) = self
            .stores
            .iter_mut()
            .find(|(k, _)| k == kind)
            .ok_or_else(|| Error::missing_entity(format!("Grid schema has no '{kind}' store.")))?;
        let extended = std::mem::take(schema).extend(extra);
        extended.validate()?;
        *schema = extended;
        Ok(self)
    }

    /// Adds an extra scalar field with its default value.
    pub fn with_scalar(mut self, name: &str, default: impl Into<Value>) -> Self {
        let default = default.into();
        match self.scalars.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = default,
            None => self.scalars.push((name.to_string(), default)),
        }
        self
    }

    pub fn stores(&self) -> impl Iterator<Item = (&EntityKind, &Schema)> {
        self.stores.iter().map(|(k, s)| (k, s))
    }

    pub fn schema(&self, kind: &EntityKind) -> Option<&Schema> {
        self.stores.iter().find(|(k, _)| k == kind).map(|(_, s)| s)
    }

    pub fn has_store(&self, kind: &EntityKind) -> bool {
        self.schema(kind).is_some()
    }

    pub fn scalars(&self) -> &[(String, Value)] {
        &self.scalars
    }
}

/// Conversion and comparison between grids of different layouts.
impl<G: GraphEngine> Grid<G> {
    /**
    Creates a grid with the layout in `schema` from a grid with a different
    layout.

    Stores both grids have are projected onto the new columns: shared columns
    are copied, columns the source lacks take their default, and columns the
    new layout lacks are dropped.  Stores the new layout lacks are dropped
    too.  Shared scalar fields are copied, and the id counter carries over.
    */
    pub fn from_extended<E: GraphEngine>(
        extended: &Grid<E>,
        schema: &GridSchema,
        config: GridConfig,
    ) -> Result<Self, Error> {
        let mut grid = Self::from_schema(schema, config)?;
        let _span = grid.enter();

        // Stores are ordered by kind, so nodes come before the branches that
        // refer to them.
        for kind in grid.kinds_where(|_| true) {
            let Ok(source) = extended.store(&kind) else {
                continue;
            };
            let rows = ColumnStore::from_extended(grid.store(&kind)?.schema().clone(), source)?;
            grid.append(&kind, &rows, false)?;
        }

        let dropped: Vec<&EntityKind> = extended
            .stores()
            .filter(|(kind, store)| !grid.has_store(kind) && !store.is_empty())
            .map(|(kind, _)| kind)
            .collect();
        if !dropped.is_empty() {
            warn!(?dropped, "dropping stores missing from the new grid schema");
        }

        for (name, value) in extended.scalars.iter() {
            if grid.scalars.contains_key(name) {
                grid.set_scalar(name, value.clone())?;
            }
        }
        grid.id_counter = grid.id_counter.max(extended.id_counter);
        debug!(id_counter = grid.id_counter, "created grid from extended grid");
        Ok(grid)
    }

    /**
    Compares the stores and scalar fields of two grids.  NaN cells are equal
    to each other, and the graphs are not compared.

    With `ignore_extras`, stores, columns and fields that only `other` has
    are ignored.
    */
    pub fn container_equal<E: GraphEngine>(&self, other: &Grid<E>, ignore_extras: bool) -> bool {
        for (kind, store) in self.stores() {
            let Ok(theirs) = other.store(kind) else {
                return false;
            };
            let equal = if ignore_extras {
                project(theirs, store.schema()).is_some_and(|theirs| store.equals(&theirs, true))
            } else {
                store.equals(theirs, true)
            };
            if !equal {
                debug!(kind = %kind, "stores differ");
                return false;
            }
        }
        if !ignore_extras && other.stores().any(|(kind, _)| !self.has_store(kind)) {
            debug!("other grid has extra stores");
            return false;
        }

        if self.id_counter != other.id_counter {
            return false;
        }
        for (name, value) in &self.scalars {
            if !other.scalars.get(name).is_some_and(|v| v.eq_nan(value)) {
                debug!(field = name, "scalar fields differ");
                return false;
            }
        }
        ignore_extras || other.scalars.keys().all(|name| self.scalars.contains_key(name))
    }
}

/// Returns the columns of `store` named in `schema`, if it has all of them
/// with the same types.
fn project(store: &ColumnStore, schema: &std::sync::Arc<Schema>) -> Option<ColumnStore> {
    let fits = schema
        .columns()
        .iter()
        .all(|spec| store.schema().spec(&spec.name).is_some_and(|s| s.dtype == spec.dtype));
    if !fits {
        return None;
    }
    ColumnStore::from_extended(schema.clone(), store).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::test_utils::{build_basic_grid, rows};
    use crate::store::{DType, Values};
    use crate::{ErrorKind, PetgraphEngine};

    fn extended_schema() -> Result<GridSchema, Error> {
        Ok(GridSchema::standard()
            .with_extra_columns(
                &EntityKind::Node,
                &Schema::new()
                    .defaulted("u", DType::Float64, f64::NAN)
                    .defaulted("zone", DType::Str, "none"),
            )?
            .with_extra_columns(
                &EntityKind::Line,
                &Schema::new().defaulted("i_from", DType::Float64, f64::NAN),
            )?
            .with_store(
                EntityKind::Custom("battery".into()),
                Schema::with_id().column("node", DType::Int32),
            )
            .with_scalar("version", 3))
    }

    fn extended_grid() -> Result<Grid, Error> {
        let basic = build_basic_grid()?;
        let mut grid: Grid = Grid::from_extended(&basic, &extended_schema()?, GridConfig::default())?;
        grid.store_mut(&EntityKind::Node)?
            .set_column("u", Values::each([1.0, 2.0, 3.0, 4.0, 5.0, 6.0]))?;
        Ok(grid)
    }

    #[test]
    fn test_grid_schema() -> Result<(), Error> {
        let schema = extended_schema()?;
        assert_eq!(schema.stores().count(), STANDARD_KINDS.len() + 1);
        let node = schema.schema(&EntityKind::Node).ok_or_else(|| Error::internal("no node"))?;
        assert_eq!(node.names().last(), Some("zone"));
        assert_eq!(schema.scalars()[0], ("version".to_string(), Value::from(3)));
        assert!(GridSchema::empty().stores().next().is_none());

        assert!(GridSchema::empty()
            .with_extra_columns(&EntityKind::Node, &Schema::new())
            .is_err_and(|e| e == Error::missing_entity("Grid schema has no 'node' store.")));
        assert!(GridSchema::standard()
            .with_extra_columns(&EntityKind::Node, &Schema::new().defaulted("u", DType::Int8, "x"))
            .is_err_and(|e| e.kind() == ErrorKind::SchemaMismatch));
        Ok(())
    }

    #[test]
    fn test_from_extended_round_trip() -> Result<(), Error> {
        let basic = build_basic_grid()?;
        let extended = extended_grid()?;
        assert_eq!(extended.id_counter(), basic.id_counter());
        assert_eq!(extended.store(&EntityKind::Node)?.len(), 6);
        assert_eq!(
            extended.store(&EntityKind::Node)?.value(0, "zone")?,
            Value::from("none")
        );
        assert!(extended.store(&EntityKind::Line)?.f64s("i_from")?.iter().all(|v| v.is_nan()));
        assert_eq!(extended.scalar("version")?, &Value::from(3));
        assert_eq!(extended.graphs().active_graph().nr_branches(), 5);

        let back: Grid = Grid::from_extended(&extended, &GridSchema::standard(), GridConfig::default())?;
        assert!(back.container_equal(&basic, false));
        assert!(back.store(&EntityKind::Node)?.schema().spec("u").is_none());
        Ok(())
    }

    #[test]
    fn test_container_equal() -> Result<(), Error> {
        let basic = build_basic_grid()?;
        let extended = extended_grid()?;
        assert!(basic.container_equal(&basic.clone(), false));
        assert!(!basic.container_equal(&extended, false));
        assert!(basic.container_equal(&extended, true));
        assert!(!extended.container_equal(&basic, true));

        let mut other = basic.clone();
        let node = rows(&EntityKind::Node, 1, &[("u_rated", Values::scalar(400.0))])?;
        other.append(&EntityKind::Node, &node, true)?;
        assert!(!basic.container_equal(&other, true));

        let mut renamed = extended.clone();
        renamed.set_scalar("version", 4)?;
        assert!(!extended.container_equal(&renamed, false));
        Ok(())
    }

    #[test]
    fn test_from_schema_with_other_engine_type() -> Result<(), Error> {
        let basic = build_basic_grid()?;
        let copy = Grid::<PetgraphEngine>::from_extended(&basic, &GridSchema::default(), GridConfig::default())?;
        assert!(copy.container_equal(&basic, false));
        Ok(())
    }
}
