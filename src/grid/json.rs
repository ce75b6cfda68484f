// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Grids as JSON documents: one array of row objects per store, plus the
//! scalar fields.

use tracing::{debug, warn};

use crate::store::{ColumnStore, Value};
use crate::{EntityKind, Error, GraphEngine, GridConfig, Id};

use super::{Grid, GridSchema};

impl<G: GraphEngine> Grid<G> {
    /// Returns the grid as a JSON object with one entry per store and per
    /// scalar field.  NaN cells are written as `null`.
    pub fn to_json(&self) -> serde_json::Value {
        let mut object = serde_json::Map::new();
        for (kind, store) in self.stores() {
            object.insert(kind.name().to_string(), store.to_json_rows());
        }
        for (name, value) in self.scalar_fields() {
            object.insert(name, value.to_json());
        }
        serde_json::Value::Object(object)
    }

    /**
    Reads a grid written by [`Grid::to_json`] into the layout in `schema`.

    Entries for stores or fields the layout doesn't have, and row keys that
    aren't columns, are skipped with a warning.  Ids must be unique across
    all stores.  Both graphs are rebuilt from the stores, and the id counter is
    at least the largest id in the grid.
    */
    pub fn from_json(json: &serde_json::Value, schema: &GridSchema, config: GridConfig) -> Result<Self, Error> {
        let object = json
            .as_object()
            .ok_or_else(|| Error::invalid_argument("Expected a JSON object with one entry per store."))?;

        let mut grid = Self::from_schema(schema, config)?;
        let _span = grid.enter();

        let mut id_counter: Id = 0;
        for (key, value) in object {
            if key == "id_counter" {
                id_counter = value
                    .as_i64()
                    .and_then(|v| Id::try_from(v).ok())
                    .ok_or_else(|| Error::invalid_argument(format!("Invalid id counter {value}.")))?;
                continue;
            }

            let kind = EntityKind::from_name(key);
            if let Some(store_schema) = schema.schema(&kind) {
                let store = ColumnStore::from_json_rows(store_schema.clone(), value)?;
                grid.stores.insert(kind, store);
            } else if let Some(default) = grid.scalars.get(key) {
                let value = Value::from_json(value, default.dtype())?;
                grid.scalars.insert(key.clone(), value);
            } else {
                warn!(field = key.as_str(), "skipping unexpected field");
            }
        }

        grid.check_ids()?;
        grid.rebuild_graphs()?;
        let max_id = grid.all_ids()?.last().copied().unwrap_or_default();
        grid.id_counter = id_counter.max(max_id);
        debug!(id_counter = grid.id_counter, "read grid from JSON");
        Ok(grid)
    }
}
